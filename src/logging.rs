//! Inicialización del logger para binarios y tests.
//!
//! Las librerías del workspace sólo emiten por la fachada `log`; quien
//! consume el crate decide si llama a `init`.
use log::LevelFilter;

/// Variable de entorno con el filtro (`RUST_LOG`-style).
pub const LOG_ENV: &str = "SEQC_LOG";
pub const DEFAULT_FILTER: &str = "warn,seqc=info";

/// Configura `env_logger` con `SEQC_LOG`; llamadas repetidas no fallan.
pub fn init() {
    let _ = env_logger::Builder::default().filter_level(LevelFilter::Warn)
                                          .parse_env(env_logger::Env::default().filter_or(LOG_ENV, DEFAULT_FILTER))
                                          .try_init();
}

/// Variante para tests: escribe a la salida capturada por el harness.
pub fn init_for_tests() {
    let _ = env_logger::Builder::default().filter_level(LevelFilter::Debug)
                                          .parse_env(env_logger::Env::default().filter_or(LOG_ENV, "debug"))
                                          .is_test(true)
                                          .try_init();
}
