//! Configuración del builder desde variables de entorno.
//! Convención `SEQC_*`; un `.env` en el directorio actual se carga una vez.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

/// Store de templates distribuido junto al crate.
pub const DEFAULT_TEMPLATE_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/templates");
pub const DEFAULT_PYTHON: &str = seqc_kernel::DEFAULT_PYTHON;
pub const DEFAULT_EXECUTE_TIMEOUT_SECS: u64 = 600;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    pub template_dir: PathBuf,
    pub python: String,
    pub execute_timeout_secs: u64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { template_dir: PathBuf::from(DEFAULT_TEMPLATE_DIR),
               python: DEFAULT_PYTHON.to_string(),
               execute_timeout_secs: DEFAULT_EXECUTE_TIMEOUT_SECS }
    }
}

impl ReportConfig {
    /// Lee `SEQC_TEMPLATE_DIR`, `SEQC_PYTHON` y `SEQC_EXECUTE_TIMEOUT`.
    /// Valores ausentes, vacíos o no numéricos caen al default.
    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let template_dir = non_empty("SEQC_TEMPLATE_DIR").map(PathBuf::from).unwrap_or(defaults.template_dir);
        let python = non_empty("SEQC_PYTHON").unwrap_or(defaults.python);
        let execute_timeout_secs = non_empty("SEQC_EXECUTE_TIMEOUT").and_then(|v| v.trim().parse().ok())
                                                                    .filter(|s| *s > 0)
                                                                    .unwrap_or(defaults.execute_timeout_secs);
        Self { template_dir, python, execute_timeout_secs }
    }

    pub fn execute_timeout(&self) -> Duration {
        Duration::from_secs(self.execute_timeout_secs)
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_point_to_shipped_store() {
        let cfg = ReportConfig::default();
        assert!(cfg.template_dir.join("analysis_template.json").is_file());
        assert_eq!(cfg.python, "python3");
        assert_eq!(cfg.execute_timeout(), Duration::from_secs(600));
    }

    #[test]
    fn overrides_are_read() {
        let cfg = ReportConfig::from_lookup(lookup(&[("SEQC_TEMPLATE_DIR", "/srv/templates"),
                                                     ("SEQC_PYTHON", "python3.12"),
                                                     ("SEQC_EXECUTE_TIMEOUT", "30")]));
        assert_eq!(cfg.template_dir, PathBuf::from("/srv/templates"));
        assert_eq!(cfg.python, "python3.12");
        assert_eq!(cfg.execute_timeout_secs, 30);
    }

    #[test]
    fn invalid_values_fall_back() {
        let cfg = ReportConfig::from_lookup(lookup(&[("SEQC_PYTHON", "  "), ("SEQC_EXECUTE_TIMEOUT", "soon")]));
        assert_eq!(cfg, ReportConfig::default());
        let zero = ReportConfig::from_lookup(lookup(&[("SEQC_EXECUTE_TIMEOUT", "0")]));
        assert_eq!(zero.execute_timeout_secs, DEFAULT_EXECUTE_TIMEOUT_SECS);
    }
}
