//! `ReportBuilder`: render de templates y ejecución de documentos.
//!
//! El mismo path de documento contiene primero la forma `rendered` y luego
//! la `executed` (o `failed`). Un timeout no toca el archivo en disco.
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use seqc_core::event::ExecutionEventKind;
use seqc_core::{CellEngine, ExecutionEvent, ReportDocument, SampleReference, SeqcError};
use seqc_kernel::{KernelSpec, PythonKernel};
use uuid::Uuid;

use crate::config::ReportConfig;
use crate::template::{render, TemplateBindings, TemplateStore};

const WORKING_DIR_PREFIX: &str = "seqc-run-";

/// Resultado de una ejecución completa.
#[derive(Debug, Clone)]
pub struct ExecutionSummary {
    pub run_id: Uuid,
    /// Directorio de trabajo del kernel; se conserva tras la ejecución.
    pub working_dir: PathBuf,
    /// Celdas de código que terminaron sin error.
    pub executed_cells: usize,
    pub fingerprint: String,
    pub events: Vec<ExecutionEvent>,
}

#[derive(Debug, Clone)]
pub struct ReportBuilder {
    store: TemplateStore,
    python: String,
    default_timeout_secs: u64,
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new(&ReportConfig::default())
    }
}

impl ReportBuilder {
    pub fn new(config: &ReportConfig) -> Self {
        Self { store: TemplateStore::new(&config.template_dir),
               python: config.python.clone(),
               default_timeout_secs: config.execute_timeout_secs }
    }

    pub fn from_env() -> Self {
        Self::new(&ReportConfig::from_env())
    }

    /// Reemplaza el store de templates.
    pub fn with_store(mut self, store: TemplateStore) -> Self {
        self.store = store;
        self
    }

    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    pub fn default_timeout_secs(&self) -> u64 {
        self.default_timeout_secs
    }

    /// Llena `template_name` con el directorio de salida y la referencia de
    /// muestras, y lo escribe en `destination` (reemplazo atómico).
    pub fn render(&self,
                  output_directory: &Path,
                  samples: &SampleReference,
                  template_name: &str,
                  destination: &Path)
                  -> Result<(), SeqcError> {
        let template = self.store.load(template_name)?;
        let bindings = TemplateBindings::new(output_directory, samples.clone());
        let document = render(&template, &bindings)?;
        document.save(destination)?;
        info!("rendered template '{}' into {}", template_name, destination.display());
        Ok(())
    }

    /// `execute` con el timeout configurado.
    pub fn execute_default(&self, document_path: &Path) -> Result<ExecutionSummary, SeqcError> {
        self.execute(document_path, self.default_timeout_secs)
    }

    /// Ejecuta `document_path` de punta a punta en un directorio de trabajo
    /// nuevo y persiste el resultado en el mismo path.
    pub fn execute(&self, document_path: &Path, timeout_seconds: u64) -> Result<ExecutionSummary, SeqcError> {
        let mut document = ReportDocument::load(document_path)?;

        let working_dir = tempfile::Builder::new().prefix(WORKING_DIR_PREFIX)
                                                  .tempdir()
                                                  .map_err(|e| SeqcError::write(std::env::temp_dir(), e))?
                                                  .keep();
        info!("executing {} in {}", document_path.display(), working_dir.display());

        let kernel = PythonKernel::start(&KernelSpec::new(&self.python, &working_dir)).map_err(|e| SeqcError::Kernel(e.to_string()))?;
        let mut engine = CellEngine::new(kernel, Duration::from_secs(timeout_seconds));
        let outcome = engine.execute(&mut document);
        let run_id = engine.run_id();
        let events = engine.events();
        if let Err(e) = engine.shutdown() {
            warn!("kernel shutdown after run {}: {}", run_id, e);
        }

        match outcome {
            Ok(fingerprint) => {
                document.save(document_path)?;
                let executed_cells = events.iter()
                                           .filter(|e| matches!(e.kind, ExecutionEventKind::CellFinished { .. }))
                                           .count();
                Ok(ExecutionSummary { run_id,
                                      working_dir,
                                      executed_cells,
                                      fingerprint,
                                      events })
            }
            Err(err @ SeqcError::Execution { .. }) => {
                document.save(document_path)?;
                warn!("saved failed document {}", document_path.display());
                Err(err)
            }
            Err(err) => Err(err),
        }
    }
}
