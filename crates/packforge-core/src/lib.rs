//! Package assembly from compiled project outputs.
//!
//! This crate provides:
//! - Normalization of pack requests (`pack.toml`) into an invocation context
//! - Classification of `PROJECT|...` and `PACKAGE|...` reference descriptors
//! - Merging of per-framework `project.json` dependencies into dependency groups
//! - Content-file mapping with inclusion flags and exclusion patterns
//! - Collection of build outputs, including referenced projects' binaries
//! - A package model handed to an archive writer

mod args;
mod content;
mod diagnostics;
mod error;
mod filter;
mod framework;
mod merge;
mod model;
mod output;
mod paths;
mod pipeline;
mod reference;
mod spec;
mod version;
mod writer;

pub use args::{
    ArgsNormalizer, ContentItem, ExclusionSet, InvocationContext, MetadataFlag, PackItem,
    PackRequest, PackTargetArgs, Properties,
};
pub use content::{package_files, ContentFiles, ContentMapper, CONTENT_FOLDER};
pub use diagnostics::{Diagnostics, PackWarning};
pub use error::PackError;
pub use filter::{FileFilter, DEFAULT_EXCLUDED_FILES};
pub use framework::{FrameworkName, TargetFramework};
pub use merge::SpecMerger;
pub use model::{
    DependencyGroup, PackageDependency, PackageFile, PackageMetadata, PackageModel, PackageType,
    DEFAULT_PACKAGE_VERSION,
};
pub use output::{OutputCollector, LIB_FOLDER, OUTPUT_EXTENSIONS, SYMBOL_EXTENSION, TOOLS_FOLDER};
pub use pipeline::{PackReport, Packer};
pub use reference::{
    ClassifiedReferences, ParsedDescriptor, ProjectReference, ReferenceClassifier,
    ReferenceDescriptor, SpecLocation,
};
pub use spec::{
    FrameworkSpec, JsonSpecReader, ProjectSpec, SpecDependency, SpecReader, SPEC_FILE_NAME,
};
pub use version::{PackageVersion, VersionRange};
pub use writer::{ArchiveWriter, ManifestWriter, MANIFEST_EXTENSION};
