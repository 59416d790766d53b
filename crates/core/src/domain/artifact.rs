// Artifacts: files to upload or datasets already stored on the platform

use crate::error::{CodexError, Result};
use std::path::{Path, PathBuf};

/// Dataset hash of data already stored on the platform
pub type DatasetHash = String;

/// A resolved input for a remote resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// Local file, uploaded once and closed after the call
    File(PathBuf),
    /// Reference to stored data, nothing to upload
    Dataset(DatasetHash),
}

/// An input given either as a file or as a dataset hash (never both)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileOrHash {
    pub file: Option<PathBuf>,
    pub hash: Option<DatasetHash>,
}

impl FileOrHash {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            file: Some(path.into()),
            hash: None,
        }
    }

    pub fn hash(hash: impl Into<String>) -> Self {
        Self {
            file: None,
            hash: Some(hash.into()),
        }
    }

    /// Pick the single supplied form
    ///
    /// Blank values count as missing.
    pub fn resolve(&self, name: &str) -> Result<Artifact> {
        let file = self.file.as_ref().filter(|p| !p.as_os_str().is_empty());
        let hash = self.hash.as_ref().filter(|h| !h.trim().is_empty());

        match (file, hash) {
            (Some(_), Some(_)) => Err(CodexError::Input(format!(
                "You must provide either {name} file or dataset hash, not both."
            ))),
            (Some(path), None) => Ok(Artifact::File(path.clone())),
            (None, Some(hash)) => Ok(Artifact::Dataset(hash.clone())),
            (None, None) => Err(CodexError::Input(format!(
                "The parameter '{name}' is mandatory: provide a file or a dataset hash."
            ))),
        }
    }
}

/// Reject files whose extension is outside `allowed` (case-insensitive)
pub fn validate_extension(path: &Path, allowed: &[&str]) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext {
        Some(ext) if allowed.contains(&ext.as_str()) => Ok(()),
        _ => Err(CodexError::InvalidExtension {
            path: path.display().to_string(),
            allowed: allowed.join(", "),
        }),
    }
}

/// Fail with the full required set if any named value is blank
pub fn require_fields(required: &[(&str, bool)]) -> Result<()> {
    if required.iter().all(|(_, present)| *present) {
        return Ok(());
    }
    let names: Vec<&str> = required.iter().map(|(name, _)| *name).collect();
    Err(CodexError::Input(format!(
        "The parameters {:?} are mandatory for this execution type.",
        names
    )))
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub fn is_blank_path(path: &Path) -> bool {
    path.as_os_str().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_form() {
        assert_eq!(
            FileOrHash::file("features.csv").resolve("features").unwrap(),
            Artifact::File(PathBuf::from("features.csv"))
        );
        assert_eq!(
            FileOrHash::hash("D1a2").resolve("features").unwrap(),
            Artifact::Dataset("D1a2".into())
        );

        let both = FileOrHash {
            file: Some("features.csv".into()),
            hash: Some("D1a2".into()),
        };
        assert!(matches!(both.resolve("features"), Err(CodexError::Input(_))));
        assert!(matches!(
            FileOrHash::default().resolve("features"),
            Err(CodexError::Input(_))
        ));
    }

    #[test]
    fn test_blank_hash_is_missing() {
        let input = FileOrHash {
            file: Some("target.csv".into()),
            hash: Some("  ".into()),
        };
        assert!(matches!(input.resolve("target"), Ok(Artifact::File(_))));
    }

    #[test]
    fn test_extension_validation() {
        assert!(validate_extension(Path::new("app.py"), &["py", "ipynb"]).is_ok());
        assert!(validate_extension(Path::new("schema.JSON"), &["json"]).is_ok());
        assert!(matches!(
            validate_extension(Path::new("requirements.in"), &["txt"]),
            Err(CodexError::InvalidExtension { .. })
        ));
        assert!(validate_extension(Path::new("Makefile"), &["txt"]).is_err());
    }

    #[test]
    fn test_require_fields_lists_all_names() {
        let err = require_fields(&[("run_name", true), ("source", false)]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("run_name") && msg.contains("source"));
    }
}
