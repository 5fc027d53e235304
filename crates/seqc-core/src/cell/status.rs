/// Estado de una celda durante una ejecución.
///
/// Las transiciones válidas son:
/// - `Pending` -> `Running`
/// - `Running` -> `Succeeded`
/// - `Running` -> `Failed`
/// - `Pending` -> `Skipped` (celdas narrativas)
///
/// No se permiten reversiones o saltos arbitrarios entre estados.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CellStatus {
    /// La celda aún no se ejecutó.
    Pending,
    /// La celda está en el kernel.
    Running,
    /// La celda terminó sin error.
    Succeeded,
    /// La celda lanzó un error o agotó el presupuesto de tiempo.
    Failed,
    /// Celda narrativa: no se ejecuta.
    Skipped,
}

impl CellStatus {
    pub fn can_transition_to(self, next: CellStatus) -> bool {
        use CellStatus::*;
        matches!((self, next), (Pending, Running) | (Running, Succeeded) | (Running, Failed) | (Pending, Skipped))
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CellStatus::Succeeded | CellStatus::Failed | CellStatus::Skipped)
    }
}
