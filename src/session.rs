//! `Notebook`: sesión que encadena merge → render → execute.
//!
//! Guarda el directorio de salida y la referencia de muestras vigente; tras
//! un merge exitoso la referencia pasa de `Raw` a `Merged` y los renders
//! posteriores apuntan a la tabla fusionada.
use std::path::{Path, PathBuf};

use log::info;
use seqc_core::{SampleReference, SeqcError};
use seqc_merge::{merge, MergeOptions, MergeReport};
use seqc_report::{ExecutionSummary, ReportBuilder, DEFAULT_TEMPLATE};

#[derive(Debug, Clone)]
pub struct Notebook {
    output_directory: PathBuf,
    samples: SampleReference,
    builder: ReportBuilder,
}

impl Notebook {
    /// Sesión sobre archivos de muestra crudos, con configuración del entorno.
    pub fn new<I, P>(output_directory: impl Into<PathBuf>, samples: I) -> Self
        where I: IntoIterator<Item = P>,
              P: Into<PathBuf>
    {
        Self::with_builder(output_directory, SampleReference::raw(samples), ReportBuilder::from_env())
    }

    pub fn with_builder(output_directory: impl Into<PathBuf>, samples: SampleReference, builder: ReportBuilder) -> Self {
        Self { output_directory: output_directory.into(),
               samples,
               builder }
    }

    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }

    pub fn samples(&self) -> &SampleReference {
        &self.samples
    }

    /// Fusiona las muestras crudas en `{output_directory}/{merged_name}`.
    /// Sólo se admite una vez por sesión.
    pub fn merge_data(&mut self, merged_name: &str, remove_unmerged: bool) -> Result<MergeReport, SeqcError> {
        let SampleReference::Raw(paths) = &self.samples else {
            return Err(SeqcError::Internal(format!("samples already merged into '{}'",
                                                   self.samples.paths()
                                                       .first()
                                                       .map(|p| p.display().to_string())
                                                       .unwrap_or_default())));
        };
        let options = MergeOptions { merged_name: merged_name.to_string(),
                                     remove_unmerged };
        let report = merge(paths, &self.output_directory, &options)?;
        info!("session samples now reference {}", report.merged_path.display());
        self.samples = SampleReference::merged(&report.merged_path);
        Ok(report)
    }

    /// Renderiza el template distribuido en `destination`.
    pub fn write_template(&self, destination: &Path) -> Result<(), SeqcError> {
        self.write_named_template(DEFAULT_TEMPLATE, destination)
    }

    pub fn write_named_template(&self, template_name: &str, destination: &Path) -> Result<(), SeqcError> {
        self.builder.render(&self.output_directory, &self.samples, template_name, destination)
    }

    /// Ejecuta `document` con el timeout configurado (600 s por defecto).
    pub fn run_notebook(&self, document: &Path) -> Result<ExecutionSummary, SeqcError> {
        self.builder.execute_default(document)
    }

    pub fn run_notebook_with_timeout(&self, document: &Path, timeout_seconds: u64) -> Result<ExecutionSummary, SeqcError> {
        self.builder.execute(document, timeout_seconds)
    }
}
