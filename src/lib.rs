//! seqc: fusión de resultados por muestra y reportes ejecutables.
//!
//! Este crate reúne los crates del workspace:
//! - `seqc_core`: documento, engine de celdas, errores.
//! - `seqc_merge`: merge de tablas con clave `(sample_number, cell_id)`.
//! - `seqc_report`: templates, render y ejecución.
//!
//! `Notebook` es la fachada de alto nivel.

pub mod logging;
pub mod session;

pub use seqc_core::{DocumentPhase, ExecutionEvent, ReportDocument, SampleReference, SampleRole, SeqcError};
pub use seqc_merge::{merge, MergeOptions, MergeReport, MergedTable, DEFAULT_MERGED_NAME};
pub use seqc_report::{ExecutionSummary, ReportBuilder, ReportConfig, TemplateStore, DEFAULT_TEMPLATE};
pub use session::Notebook;
