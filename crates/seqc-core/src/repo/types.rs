//! Estado reconstruido de una ejecución (`RunState`).
//!
//! `replay` aplica los eventos en orden sobre slots inicialmente `Pending`.
//! Eventos que implicarían una transición inválida se ignoran con un
//! `warn!`; el engine nunca los emite.
use chrono::{DateTime, Utc};
use log::warn;

use crate::cell::CellStatus;
use crate::event::{ExecutionEvent, ExecutionEventKind};

#[derive(Debug, Clone, PartialEq)]
pub struct CellSlot {
    pub status: CellStatus,
    pub execution_count: Option<u32>,
    pub output_hash: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl CellSlot {
    fn pending() -> Self {
        Self { status: CellStatus::Pending,
               execution_count: None,
               output_hash: None,
               started_at: None,
               finished_at: None }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunState {
    pub cells: Vec<CellSlot>,
    /// Índice 0-based de la primera celda no terminal.
    pub cursor: usize,
    pub completed: bool,
    pub failed: bool,
    pub fingerprint: Option<String>,
}

impl RunState {
    /// Estado de la celda 1-based `number`.
    pub fn status_of(&self, number: usize) -> Option<CellStatus> {
        number.checked_sub(1).and_then(|i| self.cells.get(i)).map(|s| s.status)
    }
}

pub fn replay(events: &[ExecutionEvent], cell_count: usize) -> RunState {
    let mut cells: Vec<CellSlot> = (0..cell_count).map(|_| CellSlot::pending()).collect();
    let mut completed = false;
    let mut failed = false;
    let mut fingerprint = None;

    for ev in events {
        match &ev.kind {
            ExecutionEventKind::RunInitialized { .. } => {}
            ExecutionEventKind::CellStarted { cell } => {
                if let Some(slot) = transition(&mut cells, *cell, CellStatus::Running) {
                    slot.started_at = Some(ev.ts);
                }
            }
            ExecutionEventKind::CellSkipped { cell } => {
                transition(&mut cells, *cell, CellStatus::Skipped);
            }
            ExecutionEventKind::CellFinished { cell, execution_count, output_hash } => {
                if let Some(slot) = transition(&mut cells, *cell, CellStatus::Succeeded) {
                    slot.execution_count = Some(*execution_count);
                    slot.output_hash = Some(output_hash.clone());
                    slot.finished_at = Some(ev.ts);
                }
            }
            ExecutionEventKind::CellFailed { cell, .. } | ExecutionEventKind::RunTimedOut { cell, .. } => {
                if let Some(slot) = transition(&mut cells, *cell, CellStatus::Failed) {
                    slot.finished_at = Some(ev.ts);
                }
                failed = true;
            }
            ExecutionEventKind::RunCompleted { fingerprint: fp } => {
                completed = true;
                fingerprint = Some(fp.clone());
            }
        }
    }

    let cursor = cells.iter().position(|s| !s.status.is_terminal()).unwrap_or(cells.len());
    RunState { cells,
               cursor,
               completed,
               failed,
               fingerprint }
}

fn transition(cells: &mut [CellSlot], number: usize, next: CellStatus) -> Option<&mut CellSlot> {
    let slot = number.checked_sub(1).and_then(|i| cells.get_mut(i))?;
    if !slot.status.can_transition_to(next) {
        warn!("ignoring invalid transition {:?} -> {:?} for cell {}", slot.status, next, number);
        return None;
    }
    slot.status = next;
    Some(slot)
}
