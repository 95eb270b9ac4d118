//! The package description handed to the archive writer.

use crate::diagnostics::{Diagnostics, PackWarning};
use crate::framework::TargetFramework;
use crate::version::{PackageVersion, VersionRange};
use crate::PackError;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Version used when none is given for the package.
pub const DEFAULT_PACKAGE_VERSION: PackageVersion = PackageVersion::new(1, 0, 0);

/// One dependency edge.
///
/// Package ids compare case-insensitively.
#[derive(Debug, Clone, Serialize)]
pub struct PackageDependency {
    pub id: String,
    #[serde(rename = "version")]
    pub version_range: VersionRange,
}

impl PackageDependency {
    #[must_use]
    pub fn new(id: impl Into<String>, version_range: VersionRange) -> Self {
        Self {
            id: id.into(),
            version_range,
        }
    }
}

impl PartialEq for PackageDependency {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PackageDependency {}

impl PartialOrd for PackageDependency {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackageDependency {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id
            .to_ascii_lowercase()
            .cmp(&other.id.to_ascii_lowercase())
            .then_with(|| self.version_range.cmp(&other.version_range))
    }
}

/// Dependencies that apply under one target framework.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyGroup {
    pub target_framework: TargetFramework,
    pub dependencies: BTreeSet<PackageDependency>,
}

impl DependencyGroup {
    #[must_use]
    pub fn new(target_framework: TargetFramework) -> Self {
        Self {
            target_framework,
            dependencies: BTreeSet::new(),
        }
    }

    /// Check whether the group holds a dependency on `id` (any range).
    #[must_use]
    pub fn contains_id(&self, id: &str) -> bool {
        self.dependencies
            .iter()
            .any(|dependency| dependency.id.eq_ignore_ascii_case(id))
    }
}

/// A package classification such as `Dependency` or `DotnetCliTool`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageType {
    pub name: String,
    pub version: PackageVersion,
}

impl PackageType {
    /// Sentinel version for package types declared without one.
    pub const UNSPECIFIED_VERSION: PackageVersion = PackageVersion::new(0, 0, 0);

    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: Self::UNSPECIFIED_VERSION,
        }
    }

    /// Parse a `;`-separated list of `name[, version]` entries.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::InvalidVersion`] if a declared version does not parse.
    pub fn parse_list(value: &str) -> Result<Vec<Self>, PackError> {
        let mut types = Vec::new();
        for entry in value.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let (name, version) = match entry.split_once(',') {
                Some((name, version)) => (name.trim(), Some(version.trim())),
                None => (entry, None),
            };
            if name.is_empty() {
                continue;
            }
            let version = match version {
                Some(version) if !version.is_empty() => PackageVersion::parse(version)?,
                _ => Self::UNSPECIFIED_VERSION,
            };
            types.push(Self {
                name: name.to_string(),
                version,
            });
        }
        Ok(types)
    }
}

/// One file entering the package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageFile {
    /// Absolute path on disk.
    pub source_path: PathBuf,
    /// Path inside the package, `/`-separated.
    pub target_path: String,
}

impl PackageFile {
    #[must_use]
    pub fn new(source_path: impl Into<PathBuf>, target_path: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            target_path: target_path.into(),
        }
    }
}

/// Descriptive package metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageMetadata {
    pub authors: Vec<String>,
    pub owners: Vec<String>,
    pub description: Option<String>,
    pub copyright: Option<String>,
    pub summary: Option<String>,
    pub release_notes: Option<String>,
    pub tags: Vec<String>,
    pub license_url: Option<String>,
    pub project_url: Option<String>,
    pub icon_url: Option<String>,
    pub require_license_acceptance: bool,
}

/// The aggregate package description.
#[derive(Debug, Clone, Serialize)]
pub struct PackageModel {
    pub id: String,
    pub version: PackageVersion,
    #[serde(flatten)]
    pub metadata: PackageMetadata,
    pub target_frameworks: BTreeSet<TargetFramework>,
    pub files: Vec<PackageFile>,
    pub dependency_groups: Vec<DependencyGroup>,
    pub package_types: Vec<PackageType>,
}

impl PackageModel {
    #[must_use]
    pub fn new(id: impl Into<String>, version: PackageVersion) -> Self {
        Self {
            id: id.into(),
            version,
            metadata: PackageMetadata::default(),
            target_frameworks: BTreeSet::new(),
            files: Vec::new(),
            dependency_groups: Vec::new(),
            package_types: Vec::new(),
        }
    }

    /// Add a file unless another file already occupies its target path.
    ///
    /// Target paths compare case-insensitively. The first file wins; a
    /// collision is recorded as a warning. Returns whether the file was added.
    pub fn add_file(&mut self, file: PackageFile, diagnostics: &mut Diagnostics) -> bool {
        if let Some(existing) = self
            .files
            .iter()
            .find(|f| f.target_path.eq_ignore_ascii_case(&file.target_path))
        {
            if existing.source_path != file.source_path {
                diagnostics.warn(PackWarning::DuplicateTargetPath {
                    target: existing.target_path.clone(),
                    kept: existing.source_path.clone(),
                    skipped: file.source_path,
                });
            }
            return false;
        }
        self.files.push(file);
        true
    }

    /// Merge dependencies into the group for `framework`, creating it if needed.
    pub fn merge_dependencies(
        &mut self,
        framework: &TargetFramework,
        dependencies: impl IntoIterator<Item = PackageDependency>,
    ) {
        let index = match self
            .dependency_groups
            .iter()
            .position(|group| &group.target_framework == framework)
        {
            Some(index) => index,
            None => {
                self.dependency_groups
                    .push(DependencyGroup::new(framework.clone()));
                self.dependency_groups.len() - 1
            }
        };
        self.dependency_groups[index].dependencies.extend(dependencies);
    }

    #[must_use]
    pub fn dependency_group(&self, framework: &TargetFramework) -> Option<&DependencyGroup> {
        self.dependency_groups
            .iter()
            .find(|group| &group.target_framework == framework)
    }

    #[must_use]
    pub fn file(&self, target_path: &str) -> Option<&PackageFile> {
        self.files
            .iter()
            .find(|f| f.target_path.eq_ignore_ascii_case(target_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dep(id: &str, range: &str) -> PackageDependency {
        PackageDependency::new(id, VersionRange::parse(range).unwrap())
    }

    #[test]
    fn dependency_ids_compare_case_insensitively() {
        assert_eq!(dep("Newtonsoft.Json", "9.0.1"), dep("newtonsoft.json", "9.0.1"));
        assert_ne!(dep("A", "1.0.0"), dep("A", "2.0.0"));
    }

    #[test]
    fn merging_the_same_framework_unions_dependencies() {
        let mut model = PackageModel::new("Demo", DEFAULT_PACKAGE_VERSION);
        let net45 = TargetFramework::parse("net45");

        model.merge_dependencies(&net45, [dep("A", "1.0.0"), dep("C", "1.0.0")]);
        model.merge_dependencies(&net45, [dep("c", "1.0.0"), dep("B", "2.0.0")]);

        assert_eq!(model.dependency_groups.len(), 1);
        let group = model.dependency_group(&net45).unwrap();
        assert_eq!(group.dependencies.len(), 3);
        assert!(group.contains_id("b"));
    }

    #[test]
    fn first_file_wins_on_target_collision() {
        let mut model = PackageModel::new("Demo", DEFAULT_PACKAGE_VERSION);
        let mut diagnostics = Diagnostics::new();

        assert!(model.add_file(
            PackageFile::new("/one/a.dll", "lib/net45/a.dll"),
            &mut diagnostics
        ));
        assert!(!model.add_file(
            PackageFile::new("/two/A.dll", "lib/net45/A.dll"),
            &mut diagnostics
        ));

        assert_eq!(model.files.len(), 1);
        assert_eq!(
            model.file("lib/net45/a.dll").unwrap().source_path,
            PathBuf::from("/one/a.dll")
        );
        assert!(matches!(
            diagnostics.warnings(),
            [PackWarning::DuplicateTargetPath { .. }]
        ));
    }

    #[test]
    fn re_adding_the_same_file_is_silent() {
        let mut model = PackageModel::new("Demo", DEFAULT_PACKAGE_VERSION);
        let mut diagnostics = Diagnostics::new();
        let file = PackageFile::new("/one/a.dll", "lib/a.dll");

        model.add_file(file.clone(), &mut diagnostics);
        model.add_file(file, &mut diagnostics);

        assert_eq!(model.files.len(), 1);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn package_types_parse_with_optional_versions() {
        let types = PackageType::parse_list("Dependency; DotnetCliTool, 1.0;;").unwrap();
        assert_eq!(types.len(), 2);
        assert_eq!(types[0].name, "Dependency");
        assert_eq!(types[0].version, PackageType::UNSPECIFIED_VERSION);
        assert_eq!(types[1].version.to_string(), "1.0.0");
    }

    #[test]
    fn package_type_with_bad_version_fails() {
        let err = PackageType::parse_list("Tool, nope").unwrap_err();
        assert!(matches!(err, PackError::InvalidVersion { .. }));
    }
}
