//! seqc-core: documento de reporte y motor secuencial de celdas.
pub mod cell;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod event;
pub mod fsutil;
pub mod hashing;
pub mod kernel;
pub mod model;
pub mod repo;

pub use cell::CellStatus;
pub use engine::CellEngine;
pub use errors::{KernelError, SeqcError};
pub use event::{EventStore, ExecutionEvent, ExecutionEventKind, InMemoryEventStore};
pub use kernel::{CellFailure, CellReply, Kernel};
pub use model::{Cell, CodeCell, DocumentPhase, Output, ReportDocument, SampleReference, SampleRole};
pub use repo::{replay, RunState};
