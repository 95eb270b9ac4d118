//! The pack pipeline: request in, package model out.

use crate::args::{ArgsNormalizer, InvocationContext, PackRequest};
use crate::content::{self, ContentMapper};
use crate::diagnostics::{Diagnostics, PackWarning};
use crate::filter::FileFilter;
use crate::framework::TargetFramework;
use crate::merge::SpecMerger;
use crate::model::{PackageMetadata, PackageModel, PackageType, DEFAULT_PACKAGE_VERSION};
use crate::output::OutputCollector;
use crate::reference::{ReferenceClassifier, SpecLocation};
use crate::spec::{JsonSpecReader, SpecReader};
use crate::version::PackageVersion;
use crate::writer::ArchiveWriter;
use crate::PackError;
use std::path::PathBuf;
use url::Url;

/// The result of a successful pack run.
#[derive(Debug, Clone)]
pub struct PackReport {
    pub model: PackageModel,
    /// Conditions that were tolerated during the run.
    pub warnings: Vec<PackWarning>,
    /// Where the package goes: the requested output path, or the project directory.
    pub output_directory: PathBuf,
}

/// Runs the pack pipeline.
///
/// Stages run in order: argument normalization, reference classification,
/// specification merging, content mapping, and output collection. Any fatal
/// error aborts the run and is returned unchanged.
#[derive(Debug, Clone, Default)]
pub struct Packer<R: SpecReader = JsonSpecReader> {
    reader: R,
}

impl Packer {
    /// A packer that reads `project.json` specifications from disk.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: SpecReader> Packer<R> {
    /// A packer that reads specifications through `reader`.
    pub fn with_reader(reader: R) -> Self {
        Self { reader }
    }

    /// Build the package model for `request`.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`PackError`] raised by any stage.
    pub fn pack(&self, request: &PackRequest) -> Result<PackReport, PackError> {
        let context = ArgsNormalizer::normalize(request)?;
        let mut diagnostics = Diagnostics::new();

        let mut model = Self::initial_model(request, &context)?;
        tracing::info!(
            id = %model.id,
            version = %model.version,
            project = %context.path.display(),
            "packing"
        );

        let mut target = ArgsNormalizer::target_args(request, &context)?;

        let classified = ReferenceClassifier::new(&context)
            .classify(&request.project_references, &mut diagnostics)?;
        if !classified.package_dependencies.is_empty() {
            model.merge_dependencies(&TargetFramework::Any, classified.package_dependencies);
        }
        target.project_references = classified.project_references;

        let merger = SpecMerger::new(&self.reader, &target.target_frameworks);
        merger.merge(
            &SpecLocation::beside(&context.path),
            true,
            &mut model,
            &mut diagnostics,
        )?;
        for location in &classified.referenced_specs {
            merger.merge(location, false, &mut model, &mut diagnostics)?;
        }

        target.content_files = ContentMapper::new(&context).map(&request.package_files);

        let filter = FileFilter::new(&context.working_directory, &context.exclude)?;
        let outputs = OutputCollector::new(context.symbols, context.tool, filter.clone()).collect(
            &target,
            &model.target_frameworks,
            &mut diagnostics,
        )?;

        for file in outputs
            .into_iter()
            .chain(content::package_files(&target.content_files, &filter))
        {
            model.add_file(file, &mut diagnostics);
        }

        tracing::info!(
            files = model.files.len(),
            dependency_groups = model.dependency_groups.len(),
            warnings = diagnostics.warnings().len(),
            "package model complete"
        );

        Ok(PackReport {
            model,
            warnings: diagnostics.into_warnings(),
            output_directory: context
                .output_directory
                .unwrap_or(context.working_directory),
        })
    }

    /// Build the package model and hand it to `writer`.
    ///
    /// The writer is not invoked when the run fails.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`PackError`] raised by any stage or by the writer.
    pub fn pack_and_write<W: ArchiveWriter>(
        &self,
        request: &PackRequest,
        writer: &mut W,
    ) -> Result<(PackReport, PathBuf), PackError> {
        let report = self.pack(request)?;
        let path = writer.write(&report.model)?;
        Ok((report, path))
    }

    fn initial_model(
        request: &PackRequest,
        context: &InvocationContext,
    ) -> Result<PackageModel, PackError> {
        let version = match non_empty(request.package_version.as_deref()) {
            Some(version) => PackageVersion::parse(version)?,
            None => DEFAULT_PACKAGE_VERSION,
        };

        let id = non_empty(request.package_id.as_deref()).map_or_else(
            || {
                context
                    .path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default()
            },
            ToString::to_string,
        );

        let mut model = PackageModel::new(id, version);
        model.metadata = metadata(request);
        if let Some(types) = non_empty(request.package_types.as_deref()) {
            model.package_types = PackageType::parse_list(types)?;
        }
        Ok(model)
    }
}

fn metadata(request: &PackRequest) -> PackageMetadata {
    PackageMetadata {
        authors: split_list(request.authors.as_deref()),
        owners: split_list(request.owners.as_deref()),
        description: non_empty(request.description.as_deref()).map(ToString::to_string),
        copyright: non_empty(request.copyright.as_deref()).map(ToString::to_string),
        summary: non_empty(request.summary.as_deref()).map(ToString::to_string),
        release_notes: non_empty(request.release_notes.as_deref()).map(ToString::to_string),
        tags: split_list(request.tags.as_deref()),
        license_url: absolute_url("license-url", request.license_url.as_deref()),
        project_url: absolute_url("project-url", request.project_url.as_deref()),
        icon_url: absolute_url("icon-url", request.icon_url.as_deref()),
        require_license_acceptance: request.require_license_acceptance,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Split on `,` and `;`, dropping empty entries.
fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split([',', ';'])
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Keep a URL only when it is absolute.
fn absolute_url(key: &str, value: Option<&str>) -> Option<String> {
    let value = non_empty(value)?;
    match Url::parse(value) {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            tracing::debug!(key, value, error = %e, "dropping invalid url");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::PackItem;
    use crate::spec::{FrameworkSpec, ProjectSpec, SpecDependency};
    use crate::version::VersionRange;
    use std::cell::Cell;

    #[derive(Default)]
    struct FixedReader {
        host: Option<ProjectSpec>,
        reads: Cell<usize>,
    }

    impl SpecReader for FixedReader {
        fn read(&self, location: &SpecLocation) -> Result<Option<ProjectSpec>, PackError> {
            self.reads.set(self.reads.get() + 1);
            if location.file_name == "host.csproj" {
                Ok(self.host.clone())
            } else {
                Ok(None)
            }
        }
    }

    fn net45_spec() -> ProjectSpec {
        ProjectSpec {
            frameworks: vec![FrameworkSpec {
                framework: TargetFramework::parse("net45"),
                dependencies: vec![SpecDependency::new(
                    "A",
                    VersionRange::parse("1.0.0").unwrap(),
                )],
            }],
            ..ProjectSpec::default()
        }
    }

    fn request() -> PackRequest {
        PackRequest {
            pack_item: Some(PackItem {
                root_dir: "/virtual/host".to_string(),
                file_name: "host".to_string(),
                extension: ".csproj".to_string(),
            }),
            ..PackRequest::default()
        }
    }

    #[test]
    fn defaults_id_and_version() {
        let packer = Packer::with_reader(FixedReader {
            host: Some(net45_spec()),
            ..FixedReader::default()
        });

        let report = packer.pack(&request()).unwrap();

        assert_eq!(report.model.id, "host");
        assert_eq!(report.model.version, DEFAULT_PACKAGE_VERSION);
        assert!(report.model.files.is_empty());
        assert_eq!(report.model.dependency_groups.len(), 1);
        assert_eq!(report.output_directory, PathBuf::from("/virtual/host"));
    }

    #[test]
    fn invalid_version_fails_before_reading_specs() {
        let packer = Packer::with_reader(FixedReader::default());
        let mut request = request();
        request.package_version = Some("not-a-version".to_string());

        let err = packer.pack(&request).unwrap_err();

        assert!(matches!(err, PackError::InvalidVersion { ref value, .. } if value == "not-a-version"));
        assert_eq!(packer.reader.reads.get(), 0);
    }

    #[test]
    fn package_references_form_the_any_group() {
        let packer = Packer::with_reader(FixedReader {
            host: Some(net45_spec()),
            ..FixedReader::default()
        });
        let mut request = request();
        request.project_references = vec![
            "PACKAGE|Serilog|2.0.0".to_string(),
            "PROJECT|bin/ref.dll|RefLib|../ref/ref.csproj".to_string(),
        ];

        let report = packer.pack(&request).unwrap();

        let any = report
            .model
            .dependency_group(&TargetFramework::Any)
            .unwrap();
        assert!(any.contains_id("serilog"));
        assert!(matches!(
            report.warnings.as_slice(),
            [PackWarning::MissingReferencedSpec { .. }]
        ));
        assert_eq!(packer.reader.reads.get(), 2);
    }

    #[test]
    fn missing_host_spec_is_fatal() {
        let packer = Packer::with_reader(FixedReader::default());
        let err = packer.pack(&request()).unwrap_err();
        assert!(matches!(err, PackError::SpecRead { .. }));
    }

    #[test]
    fn metadata_is_normalized() {
        let mut request = request();
        request.authors = Some("Ada, Grace;;".to_string());
        request.tags = Some("pack;build".to_string());
        request.project_url = Some("https://example.com/demo".to_string());
        request.icon_url = Some("images/icon.png".to_string());
        request.description = Some("  ".to_string());

        let metadata = metadata(&request);

        assert_eq!(metadata.authors, ["Ada", "Grace"]);
        assert_eq!(metadata.tags, ["pack", "build"]);
        assert_eq!(
            metadata.project_url.as_deref(),
            Some("https://example.com/demo")
        );
        assert_eq!(metadata.icon_url, None);
        assert_eq!(metadata.description, None);
    }

    #[test]
    fn package_types_are_parsed() {
        let packer = Packer::with_reader(FixedReader {
            host: Some(net45_spec()),
            ..FixedReader::default()
        });
        let mut request = request();
        request.package_types = Some("DotnetCliTool, 1.0.0".to_string());

        let report = packer.pack(&request).unwrap();

        assert_eq!(report.model.package_types.len(), 1);
        assert_eq!(report.model.package_types[0].name, "DotnetCliTool");
    }
}
