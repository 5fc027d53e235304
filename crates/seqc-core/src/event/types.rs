//! Tipos de evento de una ejecución y estructura `ExecutionEvent`.
//!
//! Rol en el pipeline:
//! - Cada ejecución del `CellEngine` emite eventos a un `EventStore`
//!   append-only.
//! - `repo::replay` reconstruye el estado de cada celda sólo a partir de
//!   estos eventos.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Los números de celda son posiciones 1-based dentro del documento.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionEventKind {
    /// Primer evento de un `run_id`: fija el hash del documento de entrada.
    RunInitialized { document_hash: String, cell_count: usize },
    /// Una celda de código entró al kernel. No implica éxito.
    CellStarted { cell: usize },
    /// Celda narrativa omitida.
    CellSkipped { cell: usize },
    /// La celda terminó sin error; `output_hash` cubre sus outputs.
    CellFinished { cell: usize, execution_count: u32, output_hash: String },
    /// La celda lanzó un error no manejado. La ejecución no continúa.
    CellFailed { cell: usize, ename: String, evalue: String },
    /// Se agotó el presupuesto global mientras corría `cell`.
    RunTimedOut { cell: usize, seconds: u64 },
    /// Cierre exitoso con el fingerprint del documento ejecutado.
    RunCompleted { fingerprint: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionEvent {
    pub seq: u64, // asignado por el store (orden append)
    pub run_id: Uuid,
    pub kind: ExecutionEventKind,
    pub ts: DateTime<Utc>, // metadato, no entra en fingerprint
}
