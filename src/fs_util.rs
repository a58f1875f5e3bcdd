use std::fs;
use std::io::Write;

use camino::Utf8Path;
use serde::Serialize;
use tracing::warn;

use crate::error::HierarchyError;

pub fn ensure_dir(path: &Utf8Path) -> Result<(), HierarchyError> {
    if path.as_std_path().is_dir() {
        return Ok(());
    }
    warn!(path = %path, "output directory does not exist, creating it");
    fs::create_dir_all(path.as_std_path())
        .map_err(|err| HierarchyError::Filesystem(format!("create {path}: {err}")))
}

pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), HierarchyError> {
    let parent = path
        .parent()
        .ok_or_else(|| HierarchyError::Filesystem(format!("invalid destination path {path}")))?;
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| HierarchyError::Filesystem(err.to_string()))?;
    let mut temp = tempfile::Builder::new()
        .prefix(".dme-hierarchy")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| HierarchyError::Filesystem(err.to_string()))?;
    temp.write_all(content)
        .map_err(|err| HierarchyError::Filesystem(format!("write {path}: {err}")))?;
    temp.persist(path.as_std_path())
        .map_err(|err| HierarchyError::Filesystem(format!("persist {path}: {err}")))?;
    Ok(())
}

/// Pretty JSON with a 4-space indent, object keys sorted, and a trailing
/// newline.
pub fn pretty_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, HierarchyError> {
    let value =
        serde_json::to_value(value).map_err(|err| HierarchyError::Serialize(err.to_string()))?;
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|err| HierarchyError::Serialize(err.to_string()))?;
    out.push(b'\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;

    use super::*;

    #[test]
    fn atomic_write_replaces_existing_file() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        let path = root.join("nested").join("doc.json");

        write_bytes_atomic(&path, b"first").unwrap();
        write_bytes_atomic(&path, b"second").unwrap();

        assert_eq!(std::fs::read(path.as_std_path()).unwrap(), b"second");
        let leftovers = std::fs::read_dir(root.join("nested").as_std_path())
            .unwrap()
            .count();
        assert_eq!(leftovers, 1);
    }
}
