//! Store de templates y render.
//!
//! Un template es un documento nbformat v4 cuyas celdas contienen slots
//! `{{ directory }}` y `{{ sample }}`. El render sustituye sobre la
//! estructura ya parseada (nunca sobre el texto JSON), así un valor con
//! comillas o saltos de línea no puede romper el documento.
//!
//! `{{ slot | json }}` inserta el valor como literal JSON (string, o lista
//! para muestras crudas), que también es un literal Python válido. Es la
//! forma segura de pasar paths a celdas de código.
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use log::debug;
use seqc_core::model::MultilineText;
use seqc_core::{DocumentPhase, ReportDocument, SampleReference, SeqcError};

const EXTENSIONS: [&str; 2] = ["json", "ipynb"];

/// Directorio con templates nombrados.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateStore {
    root: PathBuf,
}

impl TemplateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resuelve `name` a un archivo del store: nombre exacto, luego
    /// `<name>.json`, luego `<name>.ipynb`. Nombres con separadores o `..`
    /// no resuelven nunca.
    pub fn lookup(&self, name: &str) -> Result<PathBuf, SeqcError> {
        let not_found = || SeqcError::TemplateNotFound { name: name.to_string(),
                                                         store: self.root.clone() };
        if !is_plain_name(name) {
            return Err(not_found());
        }
        std::iter::once(name.to_string()).chain(EXTENSIONS.iter().map(|ext| format!("{name}.{ext}")))
                                         .map(|candidate| self.root.join(candidate))
                                         .find(|path| path.is_file())
                                         .ok_or_else(not_found)
    }

    /// Carga y valida el template `name`.
    pub fn load(&self, name: &str) -> Result<Template, SeqcError> {
        let path = self.lookup(name)?;
        debug!("template '{}' resolved to {}", name, path.display());
        let document = ReportDocument::load(&path)?;
        Ok(Template { name: name.to_string(),
                      path,
                      document })
    }
}

fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!((components.next(), components.next()), (Some(Component::Normal(_)), None))
    && !name.contains(['/', '\\'])
}

/// Template ya parseado.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub name: String,
    pub path: PathBuf,
    pub document: ReportDocument,
}

/// Slots admitidos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Directory,
    Sample,
}

impl FromStr for Slot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "directory" => Ok(Slot::Directory),
            "sample" => Ok(Slot::Sample),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Directory => f.write_str("directory"),
            Slot::Sample => f.write_str("sample"),
        }
    }
}

/// Valores de los slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateBindings {
    pub directory: PathBuf,
    pub sample: SampleReference,
}

impl TemplateBindings {
    pub fn new(directory: impl Into<PathBuf>, sample: SampleReference) -> Self {
        Self { directory: directory.into(),
               sample }
    }

    pub fn value(&self, slot: Slot) -> String {
        match slot {
            Slot::Directory => self.directory.display().to_string(),
            Slot::Sample => self.sample.render_literal(),
        }
    }

    /// Valor como literal JSON.
    pub fn json_value(&self, slot: Slot) -> String {
        match (slot, &self.sample) {
            (Slot::Sample, SampleReference::Raw(_)) => self.sample.render_literal(),
            _ => quote(&self.value(slot)),
        }
    }
}

/// Filtros admitidos tras `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Filter {
    Json,
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Filter::Json),
            other => Err(other.to_string()),
        }
    }
}

// Serializar un &str a JSON no puede fallar.
fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_default()
}

/// Render puro: sustituye slots en el source de cada celda, limpia outputs
/// y etiqueta el resultado como `Rendered`.
pub fn render(template: &Template, bindings: &TemplateBindings) -> Result<ReportDocument, SeqcError> {
    let mut doc = template.document.clone();
    for (idx, cell) in doc.cells.iter_mut().enumerate() {
        let filled = fill(cell.source(), bindings).map_err(|reason| {
                                                     SeqcError::format(&template.path,
                                                                       format!("template '{}', cell {}: {}",
                                                                               template.name,
                                                                               idx + 1,
                                                                               reason))
                                                 })?;
        *cell.source_mut() = MultilineText::new(filled);
    }
    doc.clear_outputs();
    doc.set_phase(DocumentPhase::Rendered);
    Ok(doc)
}

fn fill(text: &str, bindings: &TemplateBindings) -> Result<String, String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let close = after.find("}}").ok_or("unterminated '{{'")?;
        let (name, filter) = match after[..close].split_once('|') {
            Some((name, filter)) => (name.trim(), Some(filter.trim())),
            None => (after[..close].trim(), None),
        };
        let slot = name.parse::<Slot>().map_err(|unknown| format!("unknown slot '{unknown}'"))?;
        match filter.map(str::parse::<Filter>).transpose() {
            Ok(None) => out.push_str(&bindings.value(slot)),
            Ok(Some(Filter::Json)) => out.push_str(&bindings.json_value(slot)),
            Err(unknown) => return Err(format!("unknown filter '{unknown}' for slot '{slot}'")),
        }
        rest = &after[close + 2..];
    }
    out.push_str(rest);
    Ok(out)
}
