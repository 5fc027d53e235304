//! Documento de reporte (nbformat v4).
//!
//! Rol en el pipeline:
//! - El render produce un `ReportDocument` en fase `Rendered` (outputs vacíos).
//! - El engine lo recorre celda a celda y adjunta outputs.
//! - La fase (`Rendered | Executed | Failed`) viaja explícita en
//!   `metadata.seqc.phase`, así el archivo en disco declara su estado.
//!
//! La serialización pasa por `serde_json::Value` para que las claves queden
//! ordenadas; el mismo documento produce siempre los mismos bytes.
use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::constants::{NBFORMAT, NBFORMAT_MINOR};
use crate::errors::SeqcError;
use crate::fsutil::persist_atomic;

/// Texto multilínea de nbformat: en disco puede ser un string o una lista
/// de líneas; en memoria siempre es un único `String`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultilineText(String);

impl MultilineText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for MultilineText {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Serialize for MultilineText {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.split_inclusive('\n'))
    }
}

impl<'de> Deserialize<'de> for MultilineText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            One(String),
            Lines(Vec<String>),
        }
        Ok(match Repr::deserialize(deserializer)? {
            Repr::One(s) => Self(s),
            Repr::Lines(lines) => Self(lines.concat()),
        })
    }
}

/// Fase del documento.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentPhase {
    /// Slots sustituidos, ninguna celda ejecutada.
    Rendered,
    /// Todas las celdas de código ejecutadas en orden.
    Executed,
    /// Ejecución detenida en una celda con error.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTag {
    pub phase: DocumentPhase,
}

/// Metadata de nivel documento. Claves desconocidas se preservan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seqc: Option<PhaseTag>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Celda narrativa (markdown o raw): nunca se ejecuta.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NarrativeCell {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub source: MultilineText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Value>,
}

/// Celda de código con sus outputs capturados.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeCell {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub source: MultilineText,
    #[serde(default)]
    pub execution_count: Option<u32>,
    #[serde(default)]
    pub outputs: Vec<Output>,
}

impl CodeCell {
    pub fn new(source: impl Into<String>) -> Self {
        Self { source: MultilineText::new(source),
               ..Self::default() }
    }

    /// Texto visible de la celda: stdout más el `text/plain` de los
    /// resultados, sin el salto de línea final.
    pub fn text_output(&self) -> String {
        let mut text = String::new();
        for out in &self.outputs {
            match out {
                Output::Stream { name, text: t } if name == "stdout" => text.push_str(t.as_str()),
                Output::ExecuteResult { data, .. } => {
                    if let Some(plain) = data.get("text/plain") {
                        text.push_str(&plain_text(plain));
                        text.push('\n');
                    }
                }
                _ => {}
            }
        }
        text.trim_end_matches('\n').to_string()
    }

    /// Output de error, si la celda falló.
    pub fn error(&self) -> Option<(&str, &str)> {
        self.outputs.iter().find_map(|o| match o {
                                    Output::Error { ename, evalue, .. } => Some((ename.as_str(), evalue.as_str())),
                                    _ => None,
                                })
    }
}

fn plain_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(lines) => lines.iter().filter_map(Value::as_str).collect(),
        other => other.to_string(),
    }
}

/// Celda del documento, etiquetada por `cell_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
pub enum Cell {
    Markdown(NarrativeCell),
    Raw(NarrativeCell),
    Code(CodeCell),
}

impl Cell {
    pub fn markdown(source: impl Into<String>) -> Self {
        Cell::Markdown(NarrativeCell { source: MultilineText::new(source),
                                       ..NarrativeCell::default() })
    }

    pub fn code(source: impl Into<String>) -> Self {
        Cell::Code(CodeCell::new(source))
    }

    pub fn source(&self) -> &str {
        match self {
            Cell::Markdown(c) | Cell::Raw(c) => c.source.as_str(),
            Cell::Code(c) => c.source.as_str(),
        }
    }

    pub fn source_mut(&mut self) -> &mut MultilineText {
        match self {
            Cell::Markdown(c) | Cell::Raw(c) => &mut c.source,
            Cell::Code(c) => &mut c.source,
        }
    }

    pub fn as_code(&self) -> Option<&CodeCell> {
        match self {
            Cell::Code(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_code(&self) -> bool {
        matches!(self, Cell::Code(_))
    }
}

/// Output capturado de una celda de código, etiquetado por `output_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
pub enum Output {
    Stream { name: String, text: MultilineText },
    ExecuteResult {
        execution_count: Option<u32>,
        data: Map<String, Value>,
        #[serde(default)]
        metadata: Map<String, Value>,
    },
    DisplayData {
        data: Map<String, Value>,
        #[serde(default)]
        metadata: Map<String, Value>,
    },
    Error {
        ename: String,
        evalue: String,
        #[serde(default)]
        traceback: Vec<String>,
    },
}

/// Documento completo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub nbformat: u32,
    pub nbformat_minor: u32,
    #[serde(default)]
    pub metadata: DocumentMetadata,
    pub cells: Vec<Cell>,
}

impl ReportDocument {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { nbformat: NBFORMAT,
               nbformat_minor: NBFORMAT_MINOR,
               metadata: DocumentMetadata::default(),
               cells }
    }

    /// Parsea un documento validando la versión antes que la estructura.
    /// `origin` sólo se usa para nombrar el archivo en los errores.
    pub fn from_json_str(text: &str, origin: &Path) -> Result<Self, SeqcError> {
        let value: Value = serde_json::from_str(text).map_err(|e| SeqcError::format(origin, e))?;
        match value.get("nbformat").and_then(Value::as_u64) {
            Some(v) if v == u64::from(NBFORMAT) => {}
            Some(v) => return Err(SeqcError::format(origin, format!("unsupported nbformat version {v}"))),
            None => return Err(SeqcError::format(origin, "missing nbformat version")),
        }
        serde_json::from_value(value).map_err(|e| SeqcError::format(origin, e))
    }

    pub fn load(path: &Path) -> Result<Self, SeqcError> {
        let text = fs::read_to_string(path).map_err(|e| SeqcError::read(path, e))?;
        Self::from_json_str(&text, path)
    }

    /// Forma en disco: claves ordenadas, indentación de un espacio y salto
    /// de línea final.
    pub fn to_json_string(&self) -> Result<String, SeqcError> {
        let value = serde_json::to_value(self).map_err(|e| SeqcError::Internal(e.to_string()))?;
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        value.serialize(&mut ser).map_err(|e| SeqcError::Internal(e.to_string()))?;
        buf.push(b'\n');
        String::from_utf8(buf).map_err(|e| SeqcError::Internal(e.to_string()))
    }

    /// Persiste el documento reemplazando `path` de forma atómica.
    pub fn save(&self, path: &Path) -> Result<(), SeqcError> {
        let text = self.to_json_string()?;
        persist_atomic(path, text.as_bytes())
    }

    pub fn phase(&self) -> Option<DocumentPhase> {
        self.metadata.seqc.map(|t| t.phase)
    }

    pub fn set_phase(&mut self, phase: DocumentPhase) {
        self.metadata.seqc = Some(PhaseTag { phase });
    }

    /// Vacía outputs y contadores de todas las celdas de código.
    pub fn clear_outputs(&mut self) {
        for cell in self.cells.iter_mut() {
            if let Cell::Code(c) = cell {
                c.outputs.clear();
                c.execution_count = None;
            }
        }
    }

    /// Celda de código en la posición 1-based `number`.
    pub fn code_cell(&self, number: usize) -> Option<&CodeCell> {
        number.checked_sub(1).and_then(|i| self.cells.get(i)).and_then(Cell::as_code)
    }

    /// Valor JSON usado para fingerprints: sólo las celdas.
    pub fn cells_value(&self) -> Value {
        serde_json::to_value(&self.cells).unwrap_or(Value::Null)
    }
}
