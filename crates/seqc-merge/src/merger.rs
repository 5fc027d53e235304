//! Merge de tablas por muestra en una única tabla con clave de dos niveles.
//!
//! Orden de operaciones:
//! 1. Leer todas las entradas (cualquier fallo aborta sin escribir nada).
//! 2. Concatenar y escribir `{output_directory}/{merged_name}` de forma
//!    atómica.
//! 3. Sólo si el paso 2 terminó, borrar las entradas cuando se pidió.
//!    Los fallos de borrado se reportan pero no revierten el merge.
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use seqc_core::fsutil::persist_atomic;
use seqc_core::SeqcError;

use crate::table::{MergedTable, SampleTable};

pub const DEFAULT_MERGED_NAME: &str = "merged_counts.csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    pub merged_name: String,
    pub remove_unmerged: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self { merged_name: DEFAULT_MERGED_NAME.to_string(),
               remove_unmerged: false }
    }
}

/// Entrada que no pudo borrarse tras un merge exitoso.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalFailure {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub merged_path: PathBuf,
    pub sample_count: usize,
    pub row_count: usize,
    pub columns: Vec<String>,
    pub removal_failures: Vec<RemovalFailure>,
}

/// Fusiona `samples` (en orden) y devuelve el reporte con el path final.
pub fn merge<P: AsRef<Path>>(samples: &[P],
                             output_directory: &Path,
                             options: &MergeOptions)
                             -> Result<MergeReport, SeqcError> {
    if samples.is_empty() {
        return Err(SeqcError::read(output_directory, "no sample files to merge"));
    }

    let tables = samples.iter()
                        .map(|p| SampleTable::read(p.as_ref()))
                        .collect::<Result<Vec<_>, _>>()?;
    let merged = MergedTable::concat(&tables);
    debug!("merged {} samples into {} rows, {} columns",
           tables.len(),
           merged.row_count(),
           merged.columns.len());

    let merged_path = output_directory.join(&options.merged_name);
    persist_atomic(&merged_path, &merged.to_csv_bytes()?)?;
    info!("wrote merged table {}", merged_path.display());

    let removal_failures = if options.remove_unmerged {
        remove_inputs(samples, &merged_path)
    } else {
        Vec::new()
    };

    Ok(MergeReport { merged_path,
                     sample_count: tables.len(),
                     row_count: merged.row_count(),
                     columns: merged.columns,
                     removal_failures })
}

fn remove_inputs<P: AsRef<Path>>(samples: &[P], merged_path: &Path) -> Vec<RemovalFailure> {
    let merged_canonical = fs::canonicalize(merged_path).ok();
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut failures = Vec::new();

    for sample in samples {
        let path = sample.as_ref();
        let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if merged_canonical.as_ref() == Some(&canonical) {
            warn!("not removing {}: it is the merged output", path.display());
            continue;
        }
        if !seen.insert(canonical) {
            continue;
        }
        if let Err(e) = fs::remove_file(path) {
            warn!("could not remove unmerged sample {}: {}", path.display(), e);
            failures.push(RemovalFailure { path: path.to_path_buf(),
                                           reason: e.to_string() });
        }
    }
    failures
}
