//! Hand-off of a finished package model.

use crate::model::PackageModel;
use crate::PackError;
use std::path::{Path, PathBuf};

/// Extension of manifests written by [`ManifestWriter`].
pub const MANIFEST_EXTENSION: &str = "pack.json";

/// Consumes a completed [`PackageModel`].
///
/// Implementations decide the physical package format. A writer is only
/// invoked after a pack run succeeded.
pub trait ArchiveWriter {
    /// Write the package and return the path of what was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the package cannot be written.
    fn write(&mut self, model: &PackageModel) -> Result<PathBuf, PackError>;
}

/// Writes the logical package model as a JSON manifest.
///
/// The file is named `<id>.<version>.pack.json` and lists every file with its
/// source and target path, the dependency groups, and the package metadata.
#[derive(Debug, Clone)]
pub struct ManifestWriter {
    output_dir: PathBuf,
}

impl ManifestWriter {
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// The manifest path for `model`.
    #[must_use]
    pub fn manifest_path(&self, model: &PackageModel) -> PathBuf {
        self.output_dir.join(format!(
            "{}.{}.{MANIFEST_EXTENSION}",
            model.id, model.version
        ))
    }
}

impl ArchiveWriter for ManifestWriter {
    fn write(&mut self, model: &PackageModel) -> Result<PathBuf, PackError> {
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.manifest_path(model);
        let json = serde_json::to_string_pretty(model)?;
        std::fs::write(&path, json)?;
        tracing::info!(path = %path.display(), "wrote package manifest");
        Ok(path)
    }
}
