//! Non-fatal conditions collected during a pack run.

use std::fmt;
use std::path::PathBuf;

/// A condition that was tolerated instead of aborting the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackWarning {
    /// Two files resolved to the same in-package path; the first one was kept.
    DuplicateTargetPath {
        target: String,
        kept: PathBuf,
        skipped: PathBuf,
    },

    /// A reference descriptor did not match the `PROJECT|...` or `PACKAGE|...` grammar.
    MalformedReferenceDescriptor {
        descriptor: String,
        reason: &'static str,
    },

    /// The project's output directory does not exist, so no build outputs were collected.
    MissingOutputDirectory { path: PathBuf },

    /// A referenced project has no project specification next to it.
    MissingReferencedSpec { path: PathBuf },
}

impl fmt::Display for PackWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateTargetPath {
                target,
                kept,
                skipped,
            } => write!(
                f,
                "file '{}' is not added because the package already contains '{}' from '{}'",
                skipped.display(),
                target,
                kept.display()
            ),
            Self::MalformedReferenceDescriptor { descriptor, reason } => {
                write!(f, "ignoring reference descriptor '{descriptor}': {reason}")
            }
            Self::MissingOutputDirectory { path } => {
                write!(f, "output directory '{}' does not exist", path.display())
            }
            Self::MissingReferencedSpec { path } => write!(
                f,
                "no project specification found for referenced project in '{}'",
                path.display()
            ),
        }
    }
}

/// Accumulates warnings for one pack run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<PackWarning>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and emit it as a `tracing` event.
    pub fn warn(&mut self, warning: PackWarning) {
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[PackWarning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn into_warnings(self) -> Vec<PackWarning> {
        self.warnings
    }
}
