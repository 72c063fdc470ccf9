//! Hardware model resolution.

use std::path::{Path, PathBuf};

use crate::error::Error;

/// Supplies the hardware model name of the current device.
pub trait ModelSource {
    /// Resolve the model name.
    fn model(&self) -> Result<String, Error>;
}

/// A fixed model name.
#[derive(Debug, Clone)]
pub struct StaticModel(String);

impl StaticModel {
    pub fn new(model: impl Into<String>) -> Self {
        Self(model.into())
    }
}

impl ModelSource for StaticModel {
    fn model(&self) -> Result<String, Error> {
        validate_model(self.0.clone())
    }
}

/// A model name read from an override file.
///
/// Surrounding whitespace, including the trailing newline, is dropped.
#[derive(Debug, Clone)]
pub struct FileModel {
    path: PathBuf,
}

impl FileModel {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ModelSource for FileModel {
    fn model(&self) -> Result<String, Error> {
        let contents = std::fs::read_to_string(&self.path).map_err(|source| Error::ModelFile {
            path: self.path.clone(),
            source,
        })?;
        validate_model(contents.trim().to_string())
    }
}

/// Reject model keys that are empty or whitespace only.
pub fn validate_model(model: String) -> Result<String, Error> {
    if model.trim().is_empty() {
        return Err(Error::InvalidModel(model));
    }
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_model() {
        assert_eq!(StaticModel::new("model-A").model().unwrap(), "model-A");
        assert!(matches!(
            StaticModel::new("  ").model(),
            Err(Error::InvalidModel(_))
        ));
    }

    #[test]
    fn test_file_model_trims() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hardwaremodel");
        std::fs::write(&path, "Supermicro.SYS-E100-9APP\n").unwrap();

        let source = FileModel::new(&path);
        assert_eq!(source.path(), path.as_path());
        assert_eq!(source.model().unwrap(), "Supermicro.SYS-E100-9APP");
    }

    #[test]
    fn test_file_model_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hardwaremodel");
        std::fs::write(&path, "\n").unwrap();

        assert!(matches!(
            FileModel::new(&path).model(),
            Err(Error::InvalidModel(_))
        ));
    }

    #[test]
    fn test_file_model_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileModel::new(dir.path().join("absent")).model().unwrap_err();
        assert!(matches!(err, Error::ModelFile { .. }));
    }
}
