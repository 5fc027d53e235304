//! seqc-kernel: kernel Python para `seqc_core::CellEngine`.
//!
//! El intérprete corre como subproceso con un driver embebido
//! (`python/kernel.py`) que ejecuta cada celda en un namespace compartido y
//! responde una línea JSON por celda.
pub mod core;

pub use self::core::{KernelSpec, PythonKernel};

/// Programa por defecto para lanzar el intérprete.
pub const DEFAULT_PYTHON: &str = "python3";

/// Indica si `program` puede lanzarse (`program --version` termina bien).
pub fn interpreter_available(program: &str) -> bool {
    std::process::Command::new(program).arg("--version")
                                       .stdout(std::process::Stdio::null())
                                       .stderr(std::process::Stdio::null())
                                       .status()
                                       .map(|s| s.success())
                                       .unwrap_or(false)
}
