use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use super::{ExecutionEvent, ExecutionEventKind};

/// Almacenamiento de eventos append-only.
pub trait EventStore {
    /// Agrega un evento a partir de su kind y devuelve el evento completo (con seq y ts).
    fn append_kind(&mut self, run_id: Uuid, kind: ExecutionEventKind) -> ExecutionEvent;
    /// Lista eventos de una ejecución (orden ascendente por seq).
    fn list(&self, run_id: Uuid) -> Vec<ExecutionEvent>;
}

#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    pub inner: HashMap<Uuid, Vec<ExecutionEvent>>,
}

impl EventStore for InMemoryEventStore {
    fn append_kind(&mut self, run_id: Uuid, kind: ExecutionEventKind) -> ExecutionEvent {
        let vec = self.inner.entry(run_id).or_default();
        let seq = vec.len() as u64;
        let ev = ExecutionEvent { seq,
                                  run_id,
                                  kind,
                                  ts: Utc::now() };
        vec.push(ev.clone());
        ev
    }

    fn list(&self, run_id: Uuid) -> Vec<ExecutionEvent> {
        self.inner.get(&run_id).cloned().unwrap_or_default()
    }
}
