//! Exclusion rules applied to files entering the package.

use crate::args::ExclusionSet;
use crate::paths;
use crate::PackError;
use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};

/// File names that never enter a package.
pub const DEFAULT_EXCLUDED_FILES: &[&str] =
    &["packages.config", "Web.Debug.config", "Web.Release.config"];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Decides whether a file on disk is excluded from the package.
///
/// Patterns are matched case-insensitively against the file name, the path
/// relative to the project directory, and the absolute path.
#[derive(Debug, Clone)]
pub struct FileFilter {
    root: PathBuf,
    patterns: Vec<Pattern>,
    excluded_names: Vec<String>,
}

impl FileFilter {
    /// Build a filter from the invocation's exclusion tokens.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::Glob`] if a token is not a valid pattern.
    pub fn new(root: impl Into<PathBuf>, exclude: &ExclusionSet) -> Result<Self, PackError> {
        let patterns = exclude
            .iter()
            .map(|token| Pattern::new(&token.replace('\\', "/")))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            root: root.into(),
            patterns,
            excluded_names: DEFAULT_EXCLUDED_FILES
                .iter()
                .map(ToString::to_string)
                .collect(),
        })
    }

    /// A filter that only applies the built-in excluded file names.
    #[must_use]
    pub fn builtin(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            patterns: Vec::new(),
            excluded_names: DEFAULT_EXCLUDED_FILES
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    #[must_use]
    pub fn is_excluded(&self, path: &Path) -> bool {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if self
            .excluded_names
            .iter()
            .any(|excluded| excluded.eq_ignore_ascii_case(&name))
        {
            return true;
        }
        if self.patterns.is_empty() {
            return false;
        }

        let absolute = path.to_string_lossy().replace('\\', "/");
        let relative = path
            .strip_prefix(&self.root)
            .ok()
            .map(paths::to_package_path);

        self.patterns.iter().any(|pattern| {
            pattern.matches_with(&name, MATCH_OPTIONS)
                || pattern.matches_with(&absolute, MATCH_OPTIONS)
                || relative
                    .as_deref()
                    .is_some_and(|relative| pattern.matches_with(relative, MATCH_OPTIONS))
        })
    }
}
