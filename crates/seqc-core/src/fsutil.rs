//! Escritura atómica: contenido completo o nada en el path destino.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::errors::SeqcError;

/// Escribe `bytes` en un temporal hermano de `path` y lo renombra encima.
///
/// Si algo falla antes del rename, `path` conserva su contenido previo (o
/// sigue sin existir) y el temporal se elimina al hacer drop.
pub fn persist_atomic(path: &Path, bytes: &[u8]) -> Result<(), SeqcError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| SeqcError::write(path, e))?;
    tmp.write_all(bytes).map_err(|e| SeqcError::write(path, e))?;
    tmp.flush().map_err(|e| SeqcError::write(path, e))?;
    tmp.persist(path).map_err(|e| SeqcError::write(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.ipynb");
        std::fs::write(&path, "old").unwrap();
        persist_atomic(&path, b"new").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn missing_directory_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("doc.ipynb");
        let err = persist_atomic(&path, b"x").unwrap_err();
        assert!(matches!(err, SeqcError::Write { .. }));
        assert!(!path.exists());
    }
}
