//! Referencia a los datos de muestra que consume el reporte.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleRole {
    Raw,
    Merged,
}

/// Archivos de muestra sin fusionar, o el único archivo fusionado.
///
/// Las transiciones van sólo de `Raw` a `Merged`; una vez fusionado, el
/// reporte referencia exclusivamente la tabla combinada.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleReference {
    Raw(Vec<PathBuf>),
    Merged(PathBuf),
}

impl SampleReference {
    pub fn raw<I, P>(paths: I) -> Self
        where I: IntoIterator<Item = P>,
              P: Into<PathBuf>
    {
        SampleReference::Raw(paths.into_iter().map(Into::into).collect())
    }

    pub fn merged(path: impl Into<PathBuf>) -> Self {
        SampleReference::Merged(path.into())
    }

    pub fn role(&self) -> SampleRole {
        match self {
            SampleReference::Raw(_) => SampleRole::Raw,
            SampleReference::Merged(_) => SampleRole::Merged,
        }
    }

    pub fn paths(&self) -> Vec<&Path> {
        match self {
            SampleReference::Raw(paths) => paths.iter().map(PathBuf::as_path).collect(),
            SampleReference::Merged(path) => vec![path.as_path()],
        }
    }

    /// Valor textual insertado en el slot `sample` de un template: el path
    /// tal cual si está fusionado, o una lista literal (válida en Python y
    /// JSON) si son archivos crudos.
    pub fn render_literal(&self) -> String {
        match self {
            SampleReference::Merged(path) => path.display().to_string(),
            SampleReference::Raw(paths) => {
                let quoted: Vec<String> = paths.iter()
                                               .map(|p| serde_json::to_string(&p.display().to_string()).unwrap_or_default())
                                               .collect();
                format!("[{}]", quoted.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_renders_verbatim() {
        let r = SampleReference::merged("/tmp/out/merged_counts.csv");
        assert_eq!(r.role(), SampleRole::Merged);
        assert_eq!(r.render_literal(), "/tmp/out/merged_counts.csv");
    }

    #[test]
    fn raw_renders_list_literal() {
        let r = SampleReference::raw(["a.csv", "dir/b.csv"]);
        assert_eq!(r.role(), SampleRole::Raw);
        assert_eq!(r.render_literal(), r#"["a.csv", "dir/b.csv"]"#);
        assert_eq!(r.paths().len(), 2);
    }
}
