// Preprocessing Domain Model

use crate::domain::artifact::{is_blank, is_blank_path, require_fields, validate_extension};
use crate::domain::group::GroupName;
use crate::domain::model::{OperationKind, SCHEMA_EXTENSIONS};
use crate::domain::python::PythonVersion;
use crate::domain::training::{ENV_EXTENSIONS, REQUIREMENTS_EXTENSIONS, SOURCE_EXTENSIONS};
use crate::error::{CodexError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Server-assigned preprocessing script hash
pub type ScriptHash = String;

/// A preprocessing script to register
#[derive(Debug, Clone)]
pub struct PreprocessingScript {
    pub name: String,
    /// Name of the function to be called inside `source`
    pub script_reference: String,
    /// "3.8" | "3.9" | "3.10"
    pub python_version: String,
    pub group: GroupName,
    pub operation: OperationKind,
    pub source: PathBuf,
    pub requirements: PathBuf,
    /// Input sample; required for Sync scripts
    pub schema: Option<PathBuf>,
    pub env: Option<PathBuf>,
    pub extras: Vec<PathBuf>,
}

impl PreprocessingScript {
    pub fn validate(&self) -> Result<()> {
        require_fields(&[
            ("name", !is_blank(&self.name)),
            ("script_reference", !is_blank(&self.script_reference)),
            ("python_version", !is_blank(&self.python_version)),
            ("group", !is_blank(&self.group)),
            ("source_file", !is_blank_path(&self.source)),
            ("requirements_file", !is_blank_path(&self.requirements)),
        ])?;
        PythonVersion::parse(&self.python_version)?;
        validate_extension(&self.source, SOURCE_EXTENSIONS)?;
        validate_extension(&self.requirements, REQUIREMENTS_EXTENSIONS)?;

        match (&self.schema, self.operation) {
            (Some(schema), _) => validate_extension(schema, SCHEMA_EXTENSIONS)?,
            (None, OperationKind::Sync) => {
                return Err(CodexError::Input(
                    "Sync preprocessing scripts require a schema file.".to_string(),
                ))
            }
            (None, OperationKind::Async) => {}
        }

        if let Some(env) = &self.env {
            validate_extension(env, ENV_EXTENSIONS)?;
        }
        Ok(())
    }
}

/// Handle to a registered preprocessing script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreprocessingHandle {
    pub script_hash: ScriptHash,
    pub group: GroupName,
    pub operation: OperationKind,
    pub python_version: Option<String>,
}

/// Entry returned by the preprocessing search endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PreprocessingSummary {
    #[serde(rename = "Hash")]
    pub hash: ScriptHash,
    #[serde(rename = "Group")]
    pub group: GroupName,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Status", default)]
    pub status: Option<String>,
    #[serde(rename = "PythonVersion", default)]
    pub python_version: Option<String>,
}

impl PreprocessingSummary {
    pub fn into_handle(self, operation: OperationKind) -> PreprocessingHandle {
        PreprocessingHandle {
            script_hash: self.hash,
            group: self.group,
            operation,
            python_version: self.python_version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(operation: OperationKind) -> PreprocessingScript {
        PreprocessingScript {
            name: "clean".into(),
            script_reference: "process".into(),
            python_version: "3.9".into(),
            group: "teama".into(),
            operation,
            source: "app.py".into(),
            requirements: "requirements.txt".into(),
            schema: None,
            env: None,
            extras: vec![],
        }
    }

    #[test]
    fn test_sync_needs_schema() {
        assert!(script(OperationKind::Sync).validate().is_err());
        assert!(script(OperationKind::Async).validate().is_ok());

        let mut sync = script(OperationKind::Sync);
        sync.schema = Some("schema.json".into());
        assert!(sync.validate().is_ok());
    }

    #[test]
    fn test_summary_deserializes_platform_keys() {
        let summary: PreprocessingSummary = serde_json::from_value(serde_json::json!({
            "Hash": "P1", "Group": "teama", "Status": "Ready", "PythonVersion": "Python39"
        }))
        .unwrap();
        let handle = summary.into_handle(OperationKind::Async);
        assert_eq!(handle.script_hash, "P1");
        assert_eq!(handle.operation, OperationKind::Async);
    }
}
