//! Classification of pipe-delimited reference descriptors.
//!
//! Two kinds are recognized:
//!
//! ```text
//! PROJECT|<targetPath>|<assemblyName>|<projectFilePath>
//! PACKAGE|<packageId>[|<versionRange>]
//! ```
//!
//! A project reference means the referenced project's build output is copied
//! into this package and its project specification is merged (one level deep).
//! A package reference becomes a dependency in the framework-agnostic group.

use crate::args::InvocationContext;
use crate::diagnostics::{Diagnostics, PackWarning};
use crate::model::PackageDependency;
use crate::paths;
use crate::version::VersionRange;
use crate::PackError;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

const PROJECT_KIND: &str = "PROJECT";
const PACKAGE_KIND: &str = "PACKAGE";

/// Range used for `PACKAGE` descriptors that omit one.
const DEFAULT_PACKAGE_RANGE: &str = "1.0.0";

/// A project-to-project edge whose output is copied into the package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectReference {
    pub assembly_name: String,
    pub target_path: PathBuf,
}

/// Where a project's specification lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecLocation {
    pub directory: PathBuf,
    /// The project file name, e.g. `Lib.csproj`.
    pub file_name: String,
}

impl SpecLocation {
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            file_name: file_name.into(),
        }
    }

    /// Locate the specification beside a project file.
    #[must_use]
    pub fn beside(project_file: &Path) -> Self {
        Self {
            directory: project_file
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
            file_name: project_file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }
}

/// One parsed descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceDescriptor {
    Project {
        target_path: String,
        assembly_name: String,
        project_file: String,
    },
    Package(PackageDependency),
}

/// The outcome of parsing one descriptor string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedDescriptor {
    Reference(ReferenceDescriptor),
    /// The descriptor does not match the grammar and is skipped.
    Malformed(&'static str),
}

impl ReferenceDescriptor {
    /// Parse a descriptor.
    ///
    /// Descriptors that do not match the grammar come back as
    /// [`ParsedDescriptor::Malformed`] rather than failing the run.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::InvalidVersion`] if a `PACKAGE` range does not parse.
    pub fn parse(descriptor: &str) -> Result<ParsedDescriptor, PackError> {
        let segments: Vec<&str> = descriptor.split('|').filter(|s| !s.is_empty()).collect();

        if segments.len() < 2 {
            return Ok(ParsedDescriptor::Malformed(
                "expected at least two '|'-separated segments",
            ));
        }

        let parsed = match segments[0] {
            PROJECT_KIND => {
                if segments.len() < 4 {
                    return Ok(ParsedDescriptor::Malformed(
                        "PROJECT needs a target path, an assembly name and a project file",
                    ));
                }
                Self::Project {
                    target_path: segments[1].to_string(),
                    assembly_name: segments[2].to_string(),
                    project_file: segments[3].to_string(),
                }
            }
            PACKAGE_KIND => {
                // The range is honored only in the three-segment form.
                let range = match segments.as_slice() {
                    [_, _, range] => *range,
                    _ => DEFAULT_PACKAGE_RANGE,
                };
                let range = VersionRange::parse(range)?;
                Self::Package(PackageDependency::new(segments[1], range))
            }
            _ => return Ok(ParsedDescriptor::Malformed("unrecognized reference kind")),
        };

        Ok(ParsedDescriptor::Reference(parsed))
    }
}

/// The outcome of classifying every descriptor.
#[derive(Debug, Clone, Default)]
pub struct ClassifiedReferences {
    pub project_references: Vec<ProjectReference>,
    pub package_dependencies: BTreeSet<PackageDependency>,
    /// Specifications of referenced projects, to merge as non-host projects.
    pub referenced_specs: Vec<SpecLocation>,
}

/// Splits reference descriptors into project references and package dependencies.
#[derive(Debug)]
pub struct ReferenceClassifier<'a> {
    context: &'a InvocationContext,
}

impl<'a> ReferenceClassifier<'a> {
    #[must_use]
    pub fn new(context: &'a InvocationContext) -> Self {
        Self { context }
    }

    /// Classify descriptors, warning about and skipping malformed ones.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::InvalidVersion`] if a package range does not parse.
    pub fn classify(
        &self,
        descriptors: &[String],
        diagnostics: &mut Diagnostics,
    ) -> Result<ClassifiedReferences, PackError> {
        let mut classified = ClassifiedReferences::default();

        for descriptor in descriptors {
            match ReferenceDescriptor::parse(descriptor)? {
                ParsedDescriptor::Reference(ReferenceDescriptor::Project {
                    target_path,
                    assembly_name,
                    project_file,
                }) => {
                    let reference = ProjectReference {
                        assembly_name,
                        target_path: self.context.resolve(&target_path),
                    };
                    if !classified.project_references.contains(&reference) {
                        classified.project_references.push(reference);
                    }

                    let project_file = paths::normalize(
                        &self.context.working_directory,
                        &paths::from_build_path(&project_file),
                    );
                    let location = SpecLocation::beside(&project_file);
                    if !classified.referenced_specs.contains(&location) {
                        classified.referenced_specs.push(location);
                    }
                }
                ParsedDescriptor::Reference(ReferenceDescriptor::Package(dependency)) => {
                    classified.package_dependencies.insert(dependency);
                }
                ParsedDescriptor::Malformed(reason) => {
                    diagnostics.warn(PackWarning::MalformedReferenceDescriptor {
                        descriptor: descriptor.clone(),
                        reason,
                    });
                }
            }
        }

        tracing::debug!(
            projects = classified.project_references.len(),
            packages = classified.package_dependencies.len(),
            "classified references"
        );

        Ok(classified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{ExclusionSet, Properties};

    fn context() -> InvocationContext {
        InvocationContext {
            working_directory: PathBuf::from("/work/host"),
            path: PathBuf::from("/work/host/host.csproj"),
            arguments: vec!["host.csproj".to_string()],
            exclude: ExclusionSet::default(),
            properties: Properties::default(),
            output_directory: None,
            tool: false,
            symbols: false,
        }
    }

    fn descriptors(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn project_descriptor() {
        let context = context();
        let mut diagnostics = Diagnostics::new();
        let classified = ReferenceClassifier::new(&context)
            .classify(
                &descriptors(&["PROJECT|bin/ref.dll|RefLib|../ref/ref.csproj"]),
                &mut diagnostics,
            )
            .unwrap();

        assert_eq!(
            classified.project_references,
            vec![ProjectReference {
                assembly_name: "RefLib".to_string(),
                target_path: PathBuf::from("/work/host/bin/ref.dll"),
            }]
        );
        assert_eq!(
            classified.referenced_specs,
            vec![SpecLocation::new("/work/ref", "ref.csproj")]
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn package_descriptor_defaults_range() {
        let context = context();
        let mut diagnostics = Diagnostics::new();
        let classified = ReferenceClassifier::new(&context)
            .classify(
                &descriptors(&["PACKAGE|Newtonsoft.Json|[9.0.1, )", "PACKAGE|Serilog"]),
                &mut diagnostics,
            )
            .unwrap();

        let deps: Vec<_> = classified.package_dependencies.iter().collect();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].id, "Newtonsoft.Json");
        assert_eq!(deps[0].version_range.to_string(), "9.0.1");
        assert_eq!(deps[1].id, "Serilog");
        assert_eq!(deps[1].version_range.to_string(), "1.0.0");
    }

    #[test]
    fn malformed_descriptors_are_ignored_with_warnings() {
        let context = context();
        let mut diagnostics = Diagnostics::new();
        let classified = ReferenceClassifier::new(&context)
            .classify(
                &descriptors(&["PROJECT", "FOO|bar", "PROJECT|bin/x.dll|X", "project|a|b|c"]),
                &mut diagnostics,
            )
            .unwrap();

        assert!(classified.project_references.is_empty());
        assert!(classified.package_dependencies.is_empty());
        assert_eq!(diagnostics.warnings().len(), 4);
        assert!(diagnostics
            .warnings()
            .iter()
            .all(|w| matches!(w, PackWarning::MalformedReferenceDescriptor { .. })));
    }

    #[test]
    fn package_range_needs_exactly_three_segments() {
        let ParsedDescriptor::Reference(ReferenceDescriptor::Package(dependency)) =
            ReferenceDescriptor::parse("PACKAGE|Foo|2.0.0|extra").unwrap()
        else {
            panic!("expected a package descriptor");
        };
        assert_eq!(dependency.version_range.to_string(), "1.0.0");

        let ParsedDescriptor::Reference(ReferenceDescriptor::Package(dependency)) =
            ReferenceDescriptor::parse("PACKAGE|Foo|2.0.0").unwrap()
        else {
            panic!("expected a package descriptor");
        };
        assert_eq!(dependency.version_range.to_string(), "2.0.0");
    }

    #[test]
    fn parse_reports_malformed_reason() {
        assert_eq!(
            ReferenceDescriptor::parse("FOO|bar").unwrap(),
            ParsedDescriptor::Malformed("unrecognized reference kind")
        );
        assert!(matches!(
            ReferenceDescriptor::parse("PROJECT|a|b|c").unwrap(),
            ParsedDescriptor::Reference(ReferenceDescriptor::Project { .. })
        ));
    }

    #[test]
    fn invalid_package_range_is_fatal() {
        let context = context();
        let mut diagnostics = Diagnostics::new();
        let err = ReferenceClassifier::new(&context)
            .classify(&descriptors(&["PACKAGE|Foo|not-a-version"]), &mut diagnostics)
            .unwrap_err();
        assert!(matches!(err, PackError::InvalidVersion { .. }));
    }

    #[test]
    fn duplicate_descriptors_collapse() {
        let context = context();
        let mut diagnostics = Diagnostics::new();
        let classified = ReferenceClassifier::new(&context)
            .classify(
                &descriptors(&[
                    "PROJECT|bin/ref.dll|RefLib|../ref/ref.csproj",
                    "PROJECT|bin/ref.dll|RefLib|../ref/ref.csproj",
                    "PACKAGE|A|1.0.0",
                    "PACKAGE|a|1.0.0",
                ]),
                &mut diagnostics,
            )
            .unwrap();

        assert_eq!(classified.project_references.len(), 1);
        assert_eq!(classified.referenced_specs.len(), 1);
        assert_eq!(classified.package_dependencies.len(), 1);
    }
}
