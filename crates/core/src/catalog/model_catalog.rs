use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::MODEL_EXTENSION;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read model directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A selectable model file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelEntry {
    pub name: String,
    pub path: PathBuf,
}

impl std::fmt::Display for ModelEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Lists model files in `dir`, sorted by file name.
///
/// A missing directory is not an error: the selector is simply empty.
pub fn list_models(dir: &Path) -> Result<Vec<ModelEntry>, CatalogError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Model directory {} does not exist", dir.display());
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(CatalogError::ReadDir {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut models = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| CatalogError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() || !is_model_file(&path) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        models.push(ModelEntry { name, path });
    }
    models.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(models)
}

fn is_model_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(MODEL_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_lists_only_model_files_sorted() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "yolov8s_signs.onnx");
        touch(tmp.path(), "best.onnx");
        touch(tmp.path(), "best.names");
        touch(tmp.path(), "notes.txt");
        touch(tmp.path(), "legacy.pt");

        let models = list_models(tmp.path()).unwrap();
        let names: Vec<_> = models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["best.onnx", "yolov8s_signs.onnx"]);
        assert_eq!(models[0].path, tmp.path().join("best.onnx"));
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "UPPER.ONNX");
        assert_eq!(list_models(tmp.path()).unwrap().len(), 1);
    }

    #[test]
    fn test_skips_directories_named_like_models() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("folder.onnx")).unwrap();
        assert!(list_models(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_directory_yields_empty_list() {
        let tmp = TempDir::new().unwrap();
        let models = list_models(&tmp.path().join("models")).unwrap();
        assert!(models.is_empty());
    }

    #[test]
    fn test_file_instead_of_directory_is_error() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "models");
        assert!(list_models(&tmp.path().join("models")).is_err());
    }

    #[test]
    fn test_entry_displays_file_name() {
        let entry = ModelEntry {
            name: "best.onnx".into(),
            path: PathBuf::from("models/best.onnx"),
        };
        assert_eq!(entry.to_string(), "best.onnx");
    }
}
