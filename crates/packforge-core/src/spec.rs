//! Project dependency specifications (`project.json`).
//!
//! A specification declares framework-agnostic dependencies plus a map of
//! target frameworks, each with its own dependencies:
//!
//! ```json
//! {
//!   "dependencies": { "C": "1.0.0" },
//!   "frameworks": {
//!     "net45": { "dependencies": { "A": "1.0.0" } },
//!     "netstandard1.3": {
//!       "dependencies": { "B": { "version": "2.0.0", "suppressParent": "all" } }
//!     }
//!   }
//! }
//! ```
//!
//! Keys this crate does not use are ignored.

use crate::framework::TargetFramework;
use crate::model::PackageDependency;
use crate::reference::SpecLocation;
use crate::version::VersionRange;
use crate::PackError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default specification file name.
pub const SPEC_FILE_NAME: &str = "project.json";

/// Suffix of a project-specific specification, e.g. `Lib.project.json`.
const PROJECT_SPEC_SUFFIX: &str = ".project.json";

/// A parsed project specification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectSpec {
    /// File the specification was read from.
    pub path: PathBuf,
    /// Dependencies that apply to every framework.
    pub dependencies: Vec<SpecDependency>,
    pub frameworks: Vec<FrameworkSpec>,
}

/// One target-framework entry of a specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkSpec {
    pub framework: TargetFramework,
    pub dependencies: Vec<SpecDependency>,
}

/// A declared dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecDependency {
    pub dependency: PackageDependency,
    /// Build-only or parent-suppressed; does not flow into the package.
    pub suppressed: bool,
}

impl SpecDependency {
    #[must_use]
    pub fn new(id: impl Into<String>, version_range: VersionRange) -> Self {
        Self {
            dependency: PackageDependency::new(id, version_range),
            suppressed: false,
        }
    }
}

/// Reads the specification of one project.
pub trait SpecReader {
    /// Read the specification beside `location`.
    ///
    /// Returns `Ok(None)` when the project has no specification file; the
    /// caller decides whether that is fatal.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    fn read(&self, location: &SpecLocation) -> Result<Option<ProjectSpec>, PackError>;
}

/// Reads `project.json` files from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSpecReader;

impl JsonSpecReader {
    /// Resolve the specification file for a project.
    ///
    /// `<dir>/<project>.project.json` takes precedence over `<dir>/project.json`.
    #[must_use]
    pub fn resolve(location: &SpecLocation) -> PathBuf {
        let stem = Path::new(&location.file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !stem.is_empty() {
            let specific = location
                .directory
                .join(format!("{stem}{PROJECT_SPEC_SUFFIX}"));
            if specific.is_file() {
                return specific;
            }
        }
        location.directory.join(SPEC_FILE_NAME)
    }

    /// Parse specification JSON.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::SpecRead`] for malformed JSON and
    /// [`PackError::InvalidVersion`] for unparseable dependency versions.
    pub fn parse(path: &Path, content: &str) -> Result<ProjectSpec, PackError> {
        let raw: RawSpec = serde_json::from_str(content).map_err(|e| PackError::SpecRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let frameworks = raw
            .frameworks
            .into_iter()
            .map(|(name, framework)| {
                Ok(FrameworkSpec {
                    framework: TargetFramework::parse(&name),
                    dependencies: convert_dependencies(framework.dependencies)?,
                })
            })
            .collect::<Result<Vec<_>, PackError>>()?;

        Ok(ProjectSpec {
            path: path.to_path_buf(),
            dependencies: convert_dependencies(raw.dependencies)?,
            frameworks,
        })
    }
}

impl SpecReader for JsonSpecReader {
    fn read(&self, location: &SpecLocation) -> Result<Option<ProjectSpec>, PackError> {
        let path = Self::resolve(location);
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "no project specification");
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path).map_err(|e| PackError::SpecRead {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        tracing::debug!(path = %path.display(), "reading project specification");
        Self::parse(&path, &content).map(Some)
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawSpec {
    #[serde(default)]
    dependencies: BTreeMap<String, RawDependency>,
    #[serde(default)]
    frameworks: BTreeMap<String, RawFramework>,
}

#[derive(Debug, Default, Deserialize)]
struct RawFramework {
    #[serde(default)]
    dependencies: BTreeMap<String, RawDependency>,
}

/// A dependency value: either a version string or a detailed object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDependency {
    Simple(String),
    Detailed(DetailedDependency),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetailedDependency {
    #[serde(default)]
    version: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    suppress_parent: Option<String>,
}

impl RawDependency {
    fn version(&self) -> Option<&str> {
        match self {
            Self::Simple(version) => Some(version),
            Self::Detailed(detail) => detail.version.as_deref(),
        }
    }

    fn is_suppressed(&self) -> bool {
        match self {
            Self::Simple(_) => false,
            Self::Detailed(detail) => {
                detail
                    .kind
                    .as_deref()
                    .is_some_and(|kind| kind.eq_ignore_ascii_case("build"))
                    || detail
                        .suppress_parent
                        .as_deref()
                        .is_some_and(|flags| flags.eq_ignore_ascii_case("all"))
            }
        }
    }
}

fn convert_dependencies(
    raw: BTreeMap<String, RawDependency>,
) -> Result<Vec<SpecDependency>, PackError> {
    raw.into_iter()
        .map(|(id, dependency)| {
            let version_range = match dependency.version().map(str::trim) {
                Some(version) if !version.is_empty() => VersionRange::parse(version)?,
                _ => VersionRange::all(),
            };
            Ok(SpecDependency {
                suppressed: dependency.is_suppressed(),
                dependency: PackageDependency::new(id, version_range),
            })
        })
        .collect()
}
