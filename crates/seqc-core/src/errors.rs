//! Errores del core.
//!
//! `SeqcError` es la taxonomía observable del pipeline (merge, render,
//! execute). Cada variante nombra el path, template o celda afectada.
//! `KernelError` es el contrato del seam `Kernel`; el engine lo traduce a
//! `SeqcError`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeqcError {
    #[error("cannot read '{}': {reason}", path.display())]
    Read { path: PathBuf, reason: String },
    #[error("cannot write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("template '{name}' not found in store '{}'", store.display())]
    TemplateNotFound { name: String, store: PathBuf },
    #[error("malformed document '{}': {reason}", path.display())]
    Format { path: PathBuf, reason: String },
    #[error("execution exceeded {seconds}s budget while running cell {cell}")]
    Timeout { seconds: u64, cell: usize },
    #[error("cell {cell} raised {ename}: {evalue}")]
    Execution { cell: usize, ename: String, evalue: String },
    #[error("kernel failure: {0}")]
    Kernel(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl SeqcError {
    pub fn read(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Read { path: path.into(),
                     reason: reason.to_string() }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write { path: path.into(),
                      source }
    }

    pub fn format(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Format { path: path.into(),
                       reason: reason.to_string() }
    }
}

/// Errores del seam `Kernel`.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("failed to start kernel '{program}': {reason}")]
    Spawn { program: String, reason: String },
    #[error("kernel io: {0}")]
    Io(#[from] std::io::Error),
    #[error("kernel protocol violation: {0}")]
    Protocol(String),
    #[error("kernel exited unexpectedly")]
    Exited,
    #[error("deadline exceeded")]
    DeadlineExceeded,
}
