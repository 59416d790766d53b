// Supported Python runtimes

use crate::error::{CodexError, Result};

/// Python runtime accepted by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PythonVersion {
    Python38,
    Python39,
    Python310,
}

impl PythonVersion {
    /// Parse a user-facing version ("3.9") into the allow-list
    pub fn parse(version: &str) -> Result<Self> {
        match version {
            "3.8" => Ok(PythonVersion::Python38),
            "3.9" => Ok(PythonVersion::Python39),
            "3.10" => Ok(PythonVersion::Python310),
            other => Err(CodexError::PythonVersion(format!(
                "'{}'. Available versions are 3.8, 3.9, 3.10",
                other
            ))),
        }
    }

    /// Platform token sent over the wire
    pub fn as_platform_token(&self) -> &'static str {
        match self {
            PythonVersion::Python38 => "Python38",
            PythonVersion::Python39 => "Python39",
            PythonVersion::Python310 => "Python310",
        }
    }
}

impl std::fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_platform_token())
    }
}
