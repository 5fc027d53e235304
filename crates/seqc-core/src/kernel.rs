//! Seam de ejecución: el engine no sabe qué intérprete corre las celdas.
//!
//! Un `Kernel` es una sesión secuencial: el estado que deja una celda
//! (variables, imports) es visible para las siguientes.
use std::time::Instant;

use crate::errors::KernelError;
use crate::model::Output;

/// Error no manejado reportado por el kernel para una celda.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellFailure {
    pub ename: String,
    pub evalue: String,
}

/// Resultado de ejecutar una celda.
///
/// Si `failure` está presente, `outputs` ya incluye el `Output::Error`
/// correspondiente junto con lo impreso antes del error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellReply {
    pub outputs: Vec<Output>,
    pub failure: Option<CellFailure>,
}

pub trait Kernel {
    /// Ejecuta `source` como la celda 1-based `cell`. Debe devolver
    /// `KernelError::DeadlineExceeded` si no obtiene respuesta antes de
    /// `deadline`.
    fn execute(&mut self, cell: usize, source: &str, deadline: Instant) -> Result<CellReply, KernelError>;

    /// Libera el intérprete. Llamadas posteriores a `execute` pueden fallar.
    fn shutdown(&mut self) -> Result<(), KernelError> {
        Ok(())
    }
}

impl<K: Kernel + ?Sized> Kernel for &mut K {
    fn execute(&mut self, cell: usize, source: &str, deadline: Instant) -> Result<CellReply, KernelError> {
        (**self).execute(cell, source, deadline)
    }

    fn shutdown(&mut self) -> Result<(), KernelError> {
        (**self).shutdown()
    }
}
