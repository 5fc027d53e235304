//! Modelos neutrales (documento, celdas, referencia de muestras).

pub mod document;
pub mod sample;

pub use document::{Cell, CodeCell, DocumentMetadata, DocumentPhase, MultilineText, NarrativeCell, Output, PhaseTag,
                   ReportDocument};
pub use sample::{SampleReference, SampleRole};
