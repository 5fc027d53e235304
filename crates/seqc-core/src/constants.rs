//! Constantes del core.
//!
//! `ENGINE_VERSION` participa en el fingerprint de cada ejecución; cambiarlo
//! invalida fingerprints previos aunque el documento no cambie.

/// Versión lógica del engine de celdas.
pub const ENGINE_VERSION: &str = "S1.0";

/// Versión mayor del formato de documento soportada (nbformat).
pub const NBFORMAT: u32 = 4;

/// Versión menor escrita en documentos nuevos.
pub const NBFORMAT_MINOR: u32 = 5;
