//! Fatal errors raised by the pack pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a pack run.
///
/// Every variant keeps the context needed to act on it: the missing input's
/// name, the value that failed to parse, the framework, or the file path.
#[derive(Error, Debug)]
pub enum PackError {
    #[error("missing required input: {0}")]
    MissingInput(&'static str),

    #[error("invalid version '{value}': {reason}")]
    InvalidVersion { value: String, reason: String },

    #[error("unsupported target framework '{0}'")]
    UnsupportedFramework(String),

    #[error(
        "output collection expects at most one target framework, found {}: {}",
        .0.len(),
        .0.join(", ")
    )]
    MultipleFrameworksUnexpected(Vec<String>),

    #[error("failed to read project specification '{}': {reason}", .path.display())]
    SpecRead { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse pack request: {0}")]
    Request(#[from] toml::de::Error),

    #[error("invalid exclusion pattern: {0}")]
    Glob(#[from] glob::PatternError),
}

impl PackError {
    pub(crate) fn invalid_version(value: &str, reason: impl ToString) -> Self {
        Self::InvalidVersion {
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiple_frameworks_message_lists_frameworks() {
        let err = PackError::MultipleFrameworksUnexpected(vec!["net45".into(), "net46".into()]);
        assert_eq!(
            err.to_string(),
            "output collection expects at most one target framework, found 2: net45, net46"
        );
    }

    #[test]
    fn spec_read_message_names_path() {
        let err = PackError::SpecRead {
            path: PathBuf::from("/src/app/project.json"),
            reason: "file not found".into(),
        };
        assert!(err.to_string().contains("/src/app/project.json"));
    }
}
