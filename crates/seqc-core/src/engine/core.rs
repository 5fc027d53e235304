//! Core CellEngine implementation

use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde_json::json;
use uuid::Uuid;

use crate::cell::CellStatus;
use crate::errors::{KernelError, SeqcError};
use crate::event::{EventStore, ExecutionEvent, ExecutionEventKind, InMemoryEventStore};
use crate::hashing::hash_value;
use crate::kernel::Kernel;
use crate::model::{Cell, DocumentPhase, Output, ReportDocument};
use crate::repo::{replay, RunState};

/// Motor de ejecución de documentos.
///
/// Ejecuta las celdas de código estrictamente en orden, con un presupuesto
/// global de tiempo para toda la ejecución, y se detiene en la primera
/// celda que falle (stop-on-failure).
#[derive(Debug)]
pub struct CellEngine<K, E = InMemoryEventStore>
    where K: Kernel,
          E: EventStore
{
    kernel: K,
    event_store: E,
    run_id: Uuid,
    timeout: Duration,
}

impl<K: Kernel> CellEngine<K, InMemoryEventStore> {
    /// Crea un engine con store de eventos en memoria.
    pub fn new(kernel: K, timeout: Duration) -> Self {
        Self::with_store(kernel, InMemoryEventStore::default(), timeout)
    }
}

impl<K, E> CellEngine<K, E>
    where K: Kernel,
          E: EventStore
{
    pub fn with_store(kernel: K, event_store: E, timeout: Duration) -> Self {
        Self { kernel,
               event_store,
               run_id: Uuid::new_v4(),
               timeout }
    }

    /// Id de la última ejecución (o de la próxima, si aún no hubo ninguna).
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn event_store(&self) -> &E {
        &self.event_store
    }

    /// Eventos de la ejecución actual.
    pub fn events(&self) -> Vec<ExecutionEvent> {
        self.event_store.list(self.run_id)
    }

    /// Estado reconstruido desde el log de eventos.
    pub fn state(&self, cell_count: usize) -> RunState {
        replay(&self.events(), cell_count)
    }

    /// Variante compacta de eventos, útil en tests.
    pub fn event_variants(&self) -> Vec<&'static str> {
        self.events()
            .iter()
            .map(|e| match e.kind {
                ExecutionEventKind::RunInitialized { .. } => "I",
                ExecutionEventKind::CellStarted { .. } => "S",
                ExecutionEventKind::CellSkipped { .. } => "K",
                ExecutionEventKind::CellFinished { .. } => "F",
                ExecutionEventKind::CellFailed { .. } => "X",
                ExecutionEventKind::RunTimedOut { .. } => "T",
                ExecutionEventKind::RunCompleted { .. } => "C",
            })
            .collect()
    }

    /// Cierra el kernel subyacente.
    pub fn shutdown(&mut self) -> Result<(), SeqcError> {
        self.kernel.shutdown().map_err(|e| SeqcError::Kernel(e.to_string()))
    }

    /// Ejecuta todas las celdas de `doc` en orden, adjuntando outputs en el
    /// propio documento, y devuelve el fingerprint de la ejecución.
    ///
    /// - Éxito: `doc` queda en fase `Executed`.
    /// - Error de celda: `doc` queda en fase `Failed` con outputs hasta la
    ///   celda que falló inclusive; se devuelve `SeqcError::Execution`.
    /// - Timeout: `doc` conserva los outputs de las celdas completadas y su
    ///   fase no cambia; se devuelve `SeqcError::Timeout`.
    ///
    /// Cada llamada abre un `run_id` nuevo; el kernel (y su estado) se
    /// reutiliza entre llamadas.
    pub fn execute(&mut self, doc: &mut ReportDocument) -> Result<String, SeqcError> {
        let deadline = Instant::now() + self.timeout;
        self.run_id = Uuid::new_v4();
        doc.clear_outputs();

        let document_hash = hash_value(&doc.cells_value());
        let mut statuses = vec![CellStatus::Pending; doc.cells.len()];
        self.emit(ExecutionEventKind::RunInitialized { document_hash: document_hash.clone(),
                                                       cell_count: doc.cells.len() });
        info!("run {} started: {} cells, budget {}s", self.run_id, doc.cells.len(), self.timeout.as_secs());

        let mut execution_count: u32 = 0;
        for idx in 0..doc.cells.len() {
            let number = idx + 1;
            let source = match &doc.cells[idx] {
                Cell::Code(code) => code.source.as_str().to_string(),
                Cell::Markdown(_) | Cell::Raw(_) => {
                    advance(&mut statuses, number, CellStatus::Skipped)?;
                    self.emit(ExecutionEventKind::CellSkipped { cell: number });
                    continue;
                }
            };

            advance(&mut statuses, number, CellStatus::Running)?;
            self.emit(ExecutionEventKind::CellStarted { cell: number });
            debug!("cell {} -> kernel", number);

            let reply = match self.kernel_execute(number, &source, deadline) {
                Ok(reply) => reply,
                Err(KernelError::DeadlineExceeded) => {
                    advance(&mut statuses, number, CellStatus::Failed)?;
                    let seconds = self.timeout.as_secs();
                    self.emit(ExecutionEventKind::RunTimedOut { cell: number, seconds });
                    warn!("run {} timed out at cell {}", self.run_id, number);
                    return Err(SeqcError::Timeout { seconds, cell: number });
                }
                Err(e) => {
                    advance(&mut statuses, number, CellStatus::Failed)?;
                    self.emit(ExecutionEventKind::CellFailed { cell: number,
                                                               ename: "KernelError".into(),
                                                               evalue: e.to_string() });
                    return Err(SeqcError::Kernel(format!("cell {number}: {e}")));
                }
            };

            execution_count += 1;
            let outputs = stamp_execution_count(reply.outputs, execution_count);
            let output_hash = hash_value(&serde_json::to_value(&outputs).unwrap_or_default());
            if let Cell::Code(code) = &mut doc.cells[idx] {
                code.outputs = outputs;
                code.execution_count = Some(execution_count);
            }

            if let Some(failure) = reply.failure {
                advance(&mut statuses, number, CellStatus::Failed)?;
                self.emit(ExecutionEventKind::CellFailed { cell: number,
                                                           ename: failure.ename.clone(),
                                                           evalue: failure.evalue.clone() });
                doc.set_phase(DocumentPhase::Failed);
                warn!("run {} stopped: cell {} raised {}", self.run_id, number, failure.ename);
                return Err(SeqcError::Execution { cell: number,
                                                  ename: failure.ename,
                                                  evalue: failure.evalue });
            }

            advance(&mut statuses, number, CellStatus::Succeeded)?;
            self.emit(ExecutionEventKind::CellFinished { cell: number,
                                                         execution_count,
                                                         output_hash });
        }

        doc.set_phase(DocumentPhase::Executed);
        let fingerprint = hash_value(&json!({
                                         "engine_version": crate::constants::ENGINE_VERSION,
                                         "document_hash": document_hash,
                                         "cells": doc.cells_value(),
                                     }));
        self.emit(ExecutionEventKind::RunCompleted { fingerprint: fingerprint.clone() });
        info!("run {} completed ({} code cells)", self.run_id, execution_count);
        Ok(fingerprint)
    }

    fn kernel_execute(&mut self,
                      number: usize,
                      source: &str,
                      deadline: Instant)
                      -> Result<crate::kernel::CellReply, KernelError> {
        if Instant::now() >= deadline {
            return Err(KernelError::DeadlineExceeded);
        }
        self.kernel.execute(number, source, deadline)
    }

    fn emit(&mut self, kind: ExecutionEventKind) {
        let _ = self.event_store.append_kind(self.run_id, kind);
    }
}

fn advance(statuses: &mut [CellStatus], number: usize, next: CellStatus) -> Result<(), SeqcError> {
    let current = statuses.get_mut(number - 1)
                          .ok_or_else(|| SeqcError::Internal(format!("cell {number} out of range")))?;
    if !current.can_transition_to(next) {
        return Err(SeqcError::Internal(format!("invalid transition {:?} -> {:?} for cell {}", current, next, number)));
    }
    *current = next;
    Ok(())
}

fn stamp_execution_count(outputs: Vec<Output>, count: u32) -> Vec<Output> {
    outputs.into_iter()
           .map(|out| match out {
               Output::ExecuteResult { data, metadata, .. } => Output::ExecuteResult { execution_count: Some(count),
                                                                                       data,
                                                                                       metadata },
               other => other,
           })
           .collect()
}
