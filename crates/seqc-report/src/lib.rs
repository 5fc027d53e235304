//! seqc-report: render y ejecución de reportes a partir de templates.
//!
//! Flujo: `TemplateStore::load` → `template::render` (puro) → archivo en disco
//! → `ReportBuilder::execute` (kernel Python, una sesión por ejecución).
pub mod builder;
pub mod config;
pub mod template;

pub use builder::{ExecutionSummary, ReportBuilder};
pub use config::{init_dotenv, ReportConfig};
pub use template::{render, Slot, Template, TemplateBindings, TemplateStore};

/// Template distribuido con el crate.
pub const DEFAULT_TEMPLATE: &str = "analysis_template.json";
