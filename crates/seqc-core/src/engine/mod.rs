//! Engine de ejecución secuencial de celdas.
//!
//! Provee `CellEngine`, que recorre un `ReportDocument` en orden, delega cada
//! celda de código en un `Kernel` y registra cada transición en un
//! `EventStore`.

pub mod core;

pub use self::core::CellEngine;

pub use crate::event::{EventStore, ExecutionEvent, ExecutionEventKind, InMemoryEventStore};
pub use crate::repo::{replay, RunState};
