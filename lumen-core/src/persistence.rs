//! Preset files on disk.
//!
//! Presets are pretty-printed JSON documents named `<name>.json` inside the
//! preset directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use lumen_types::PresetDocument;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PresetFileError {
    #[error("preset file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("preset file {path} is not a valid preset: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub const PRESET_EXTENSION: &str = "json";

pub fn preset_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(name).with_extension(PRESET_EXTENSION)
}

/// Write `doc` to `path`, creating parent directories as needed.
pub fn save_preset(path: &Path, doc: &PresetDocument) -> Result<(), PresetFileError> {
    let io_err = |source: io::Error| PresetFileError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_string_pretty(doc).map_err(|source| PresetFileError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(io_err)?;
    log::info!(target: "preset", "saved {}", path.display());
    Ok(())
}

pub fn load_preset(path: &Path) -> Result<PresetDocument, PresetFileError> {
    let contents = fs::read_to_string(path).map_err(|source| PresetFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc = serde_json::from_str(&contents).map_err(|source| PresetFileError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!(target: "preset", "loaded {}", path.display());
    Ok(doc)
}

/// Names of the presets in `dir`, sorted. A missing directory has none.
pub fn list_presets(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == PRESET_EXTENSION))
        .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_types::{GroupConfig, Value};

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = preset_path(&dir.path().join("nested"), "opening");
        let mut doc = PresetDocument::new();
        doc.push("/Light1/FXLight/intensity", Value::Float(0.75));
        doc.group_presets.push(GroupConfig::new("/g"));
        save_preset(&path, &doc).unwrap();
        assert_eq!(load_preset(&path).unwrap(), doc);
        assert_eq!(list_presets(&dir.path().join("nested")), vec!["opening".to_string()]);
    }

    #[test]
    fn file_uses_camel_case_buckets() {
        let dir = tempfile::tempdir().unwrap();
        let path = preset_path(dir.path(), "p");
        let mut doc = PresetDocument::new();
        doc.push("/a", Value::Bool(true));
        save_preset(&path, &doc).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"boolParameters\""));
        assert!(text.contains("\"groupPresets\""));
    }

    #[test]
    fn garbage_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_preset(&path), Err(PresetFileError::Json { .. })));
        assert!(matches!(
            load_preset(&dir.path().join("missing.json")),
            Err(PresetFileError::Io { .. })
        ));
    }

    #[test]
    fn missing_dir_lists_nothing() {
        assert!(list_presets(Path::new("/definitely/not/here")).is_empty());
    }
}
