//! Máquina de estados por celda.

mod status;

pub use status::CellStatus;
