//! Tablas de muestra y tabla fusionada.
//!
//! - `SampleTable`: una tabla de entrada; la primera columna es el
//!   identificador de fila (cell_id), el resto son features opacas.
//! - `MergedTable`: concatenación con clave `(sample_number, cell_id)`.
//!   `sample_number` es la posición 0-based del archivo en la lista de
//!   entrada; `cell_id` sólo es único dentro de su grupo.
use std::collections::HashSet;
use std::path::Path;

use csv::StringRecord;
use indexmap::IndexSet;
use seqc_core::SeqcError;

pub const SAMPLE_NUMBER_COLUMN: &str = "sample_number";
pub const CELL_ID_COLUMN: &str = "cell_id";

/// Tabla de una muestra tal como la produjo el pipeline upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleTable {
    /// Nombre de la columna identificadora (se descarta al fusionar).
    pub index_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<SampleRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRow {
    pub cell_id: String,
    pub values: Vec<String>,
}

impl SampleTable {
    /// Lee un CSV con header. Cualquier problema (archivo ausente, header
    /// vacío, columnas duplicadas, filas irregulares) es `SeqcError::Read`.
    pub fn read(path: &Path) -> Result<Self, SeqcError> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true)
                                                  .flexible(false)
                                                  .from_path(path)
                                                  .map_err(|e| SeqcError::read(path, e))?;

        let headers = reader.headers().map_err(|e| SeqcError::read(path, e))?.clone();
        if headers.is_empty() || headers.iter().all(str::is_empty) {
            return Err(SeqcError::read(path, "missing header row"));
        }
        check_unique(&headers, path)?;

        let index_name = headers.get(0).unwrap_or_default().to_string();
        let columns: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

        let mut rows = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            let record = result.map_err(|e| SeqcError::read(path, format!("row {}: {}", row_idx + 1, e)))?;
            let mut fields = record.iter();
            let cell_id = fields.next().unwrap_or_default().to_string();
            rows.push(SampleRow { cell_id,
                                  values: fields.map(str::to_string).collect() });
        }

        Ok(SampleTable { index_name, columns, rows })
    }
}

fn check_unique(headers: &StringRecord, path: &Path) -> Result<(), SeqcError> {
    let mut seen = HashSet::new();
    for name in headers.iter() {
        if !seen.insert(name) {
            return Err(SeqcError::read(path, format!("duplicate column '{name}'")));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRow {
    pub sample_number: usize,
    pub cell_id: String,
    /// Alineado con `MergedTable::columns`; `None` si la muestra no tenía la
    /// columna.
    pub values: Vec<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedTable {
    pub columns: Vec<String>,
    pub rows: Vec<MergedRow>,
}

impl MergedTable {
    /// Concatena tablas en orden. Las columnas son la unión en orden de
    /// primera aparición.
    pub fn concat(tables: &[SampleTable]) -> Self {
        let union: IndexSet<&str> = tables.iter()
                                          .flat_map(|t| t.columns.iter().map(String::as_str))
                                          .collect();
        let columns: Vec<String> = union.iter().map(|c| c.to_string()).collect();

        let mut rows = Vec::with_capacity(tables.iter().map(|t| t.rows.len()).sum());
        for (sample_number, table) in tables.iter().enumerate() {
            // posición en la tabla propia de cada columna de la unión
            let mut positions: Vec<Option<usize>> = vec![None; union.len()];
            for (own, name) in table.columns.iter().enumerate() {
                if let Some(slot) = union.get_index_of(name.as_str()) {
                    positions[slot] = Some(own);
                }
            }
            for row in &table.rows {
                let values = positions.iter()
                                      .map(|p| p.and_then(|i| row.values.get(i).cloned()))
                                      .collect();
                rows.push(MergedRow { sample_number,
                                      cell_id: row.cell_id.clone(),
                                      values });
            }
        }

        MergedTable { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// `sample_number` distintos, en orden de aparición.
    pub fn sample_numbers(&self) -> Vec<usize> {
        let set: IndexSet<usize> = self.rows.iter().map(|r| r.sample_number).collect();
        set.into_iter().collect()
    }

    /// Filas provenientes de la muestra `sample_number`.
    pub fn rows_for(&self, sample_number: usize) -> impl Iterator<Item = &MergedRow> {
        self.rows.iter().filter(move |r| r.sample_number == sample_number)
    }

    /// Claves `(sample_number, cell_id)` en orden.
    pub fn keys(&self) -> Vec<(usize, &str)> {
        self.rows.iter().map(|r| (r.sample_number, r.cell_id.as_str())).collect()
    }

    /// Valor de `column` en la fila `row`; `None` si falta.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.values.get(col)?.as_deref()
    }

    /// Serializa a CSV: `sample_number,cell_id,<columnas>`; valores
    /// faltantes como campo vacío.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, SeqcError> {
        let internal = |e: csv::Error| SeqcError::Internal(format!("csv encode: {e}"));
        let mut writer = csv::Writer::from_writer(Vec::new());

        let mut header = vec![SAMPLE_NUMBER_COLUMN, CELL_ID_COLUMN];
        header.extend(self.columns.iter().map(String::as_str));
        writer.write_record(&header).map_err(internal)?;

        for row in &self.rows {
            let sample = row.sample_number.to_string();
            let mut record: Vec<&str> = Vec::with_capacity(row.values.len() + 2);
            record.push(&sample);
            record.push(&row.cell_id);
            record.extend(row.values.iter().map(|v| v.as_deref().unwrap_or("")));
            writer.write_record(&record).map_err(internal)?;
        }

        writer.into_inner().map_err(|e| SeqcError::Internal(format!("csv flush: {e}")))
    }

    /// Relee una tabla fusionada; permite reconstruir de qué muestra viene
    /// cada fila.
    pub fn read(path: &Path) -> Result<Self, SeqcError> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true)
                                                  .flexible(false)
                                                  .from_path(path)
                                                  .map_err(|e| SeqcError::read(path, e))?;
        let headers = reader.headers().map_err(|e| SeqcError::read(path, e))?.clone();
        if headers.get(0) != Some(SAMPLE_NUMBER_COLUMN) || headers.get(1) != Some(CELL_ID_COLUMN) {
            return Err(SeqcError::read(path, "missing sample_number,cell_id key columns"));
        }
        let columns: Vec<String> = headers.iter().skip(2).map(str::to_string).collect();

        let mut rows = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            let record = result.map_err(|e| SeqcError::read(path, format!("row {}: {}", row_idx + 1, e)))?;
            let sample_number = record.get(0)
                                      .unwrap_or_default()
                                      .parse::<usize>()
                                      .map_err(|e| SeqcError::read(path, format!("row {}: bad sample_number: {}", row_idx + 1, e)))?;
            let cell_id = record.get(1).unwrap_or_default().to_string();
            let values = record.iter()
                               .skip(2)
                               .map(|v| if v.is_empty() { None } else { Some(v.to_string()) })
                               .collect();
            rows.push(MergedRow { sample_number,
                                  cell_id,
                                  values });
        }

        Ok(MergedTable { columns, rows })
    }
}
