//! Reconstrucción del estado de una ejecución a partir de eventos.

mod types;

pub use types::{replay, CellSlot, RunState};
