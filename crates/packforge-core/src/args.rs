//! Raw pack inputs and their normalization into an invocation context.
//!
//! A pack request mirrors the parameters a build system hands to the pack
//! step. It is usually read from a TOML file:
//!
//! ```toml
//! package-id = "Demo"
//! package-version = "2.0.0"
//! target-path = "bin/Debug/Demo.dll"
//! include-symbols = true
//! exclude = "*.xml;docs/**"
//! properties = "Configuration=Release;Platform=AnyCPU"
//! project-references = ["PROJECT|bin\\Lib.dll|Lib|..\\Lib\\Lib.csproj"]
//!
//! [pack-item]
//! root-dir = "."
//! file-name = "Demo"
//! extension = ".csproj"
//!
//! [[package-files]]
//! full-path = "readme.txt"
//! package-path = "docs/"
//! ```

use crate::framework::TargetFramework;
use crate::paths;
use crate::reference::ProjectReference;
use crate::PackError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// The raw inputs of one pack invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct PackRequest {
    /// The project file being packed (required).
    pub pack_item: Option<PackItem>,

    /// Declared content files.
    pub package_files: Vec<ContentItem>,

    /// Pipe-delimited reference descriptors.
    pub project_references: Vec<String>,

    /// Frameworks to pack for; empty means every framework the project declares.
    pub target_frameworks: Vec<String>,

    pub package_id: Option<String>,
    pub package_version: Option<String>,
    pub authors: Option<String>,
    pub owners: Option<String>,
    pub description: Option<String>,
    pub copyright: Option<String>,
    pub summary: Option<String>,
    pub release_notes: Option<String>,
    pub tags: Option<String>,
    pub require_license_acceptance: bool,
    pub license_url: Option<String>,
    pub project_url: Option<String>,
    pub icon_url: Option<String>,

    /// `key=value` pairs separated by `;`.
    pub properties: Option<String>,
    pub configuration: Option<String>,
    pub output_path: Option<String>,
    pub target_path: Option<String>,
    pub assembly_name: Option<String>,

    /// Exclusion patterns separated by `;` or `,`.
    pub exclude: Option<String>,

    /// Directory the finished package is written to.
    pub package_output_path: Option<String>,
    pub is_tool: bool,
    pub include_symbols: bool,

    /// `name[, version]` entries separated by `;`.
    pub package_types: Option<String>,

    /// Directory that relative paths in the request resolve against.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl PackRequest {
    /// Load a request from a TOML file.
    ///
    /// Relative paths in the request resolve against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PackError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut request = Self::parse(&content)?;
        request.base_dir = path.parent().map(Path::to_path_buf);
        Ok(request)
    }

    /// Parse a request from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or has unknown keys.
    pub fn parse(content: &str) -> Result<Self, PackError> {
        Ok(toml::from_str(content)?)
    }
}

/// Descriptor of the project file being packed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PackItem {
    /// Directory containing the project file.
    pub root_dir: String,
    /// File name without extension.
    pub file_name: String,
    /// Extension including the leading dot.
    #[serde(default)]
    pub extension: String,
}

/// A declared content file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ContentItem {
    pub full_path: String,

    /// Project that owns a linked file.
    #[serde(default)]
    pub source_project_file: Option<String>,

    /// Path of a linked file relative to its owning project.
    #[serde(default)]
    pub identity: Option<String>,

    /// Whether the file is packed; absent means yes.
    #[serde(default)]
    pub pack: Option<MetadataFlag>,

    /// Explicit in-package path; absent means the default content folder.
    #[serde(default)]
    pub package_path: Option<String>,
}

impl ContentItem {
    #[must_use]
    pub fn new(full_path: impl Into<String>) -> Self {
        Self {
            full_path: full_path.into(),
            ..Self::default()
        }
    }

    /// Whether the item opts out of packing.
    #[must_use]
    pub fn is_excluded(&self) -> bool {
        self.pack.as_ref().is_some_and(|flag| !flag.is_true())
    }
}

/// A boolean item flag, written either as a boolean or as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataFlag {
    Bool(bool),
    Text(String),
}

impl MetadataFlag {
    /// Text parses case-insensitively; anything other than `true` is false.
    #[must_use]
    pub fn is_true(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::Text(text) => text.trim().eq_ignore_ascii_case("true"),
        }
    }
}

/// Case-insensitive set of exclusion tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    tokens: BTreeMap<String, String>,
}

impl ExclusionSet {
    /// Split on `;` and `,`, dropping empty tokens.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let mut set = Self::default();
        for token in value.split([';', ',']).map(str::trim) {
            set.insert(token);
        }
        set
    }

    pub fn insert(&mut self, token: &str) {
        if !token.is_empty() {
            self.tokens
                .entry(token.to_lowercase())
                .or_insert_with(|| token.to_string());
        }
    }

    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains_key(&token.to_lowercase())
    }

    /// Tokens as originally written.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.values().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Ordered `key=value` properties with case-insensitive unique keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: Vec<(String, String)>,
}

impl Properties {
    /// Parse `;`-separated `key=value` pairs.
    ///
    /// Pairs without `=`, or with `=` as the first or last character, are
    /// skipped. The first occurrence of a key wins.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let mut properties = Self::default();
        for pair in value.split(';') {
            match pair.find('=') {
                Some(index) if index > 0 && index < pair.len() - 1 => {
                    properties.insert(&pair[..index], &pair[index + 1..]);
                }
                _ => {}
            }
        }
        properties
    }

    /// Insert a property unless the key is already present. Returns whether it was inserted.
    pub fn insert(&mut self, key: &str, value: &str) -> bool {
        if self.get(key).is_some() {
            return false;
        }
        self.entries.push((key.to_string(), value.to_string()));
        true
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Normalized invocation arguments. Read-only once built.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    /// Absolute directory of the project being packed.
    pub working_directory: PathBuf,
    /// Absolute path of the project file.
    pub path: PathBuf,
    /// The project file name with extension.
    pub arguments: Vec<String>,
    pub exclude: ExclusionSet,
    pub properties: Properties,
    /// Where the finished package goes.
    pub output_directory: Option<PathBuf>,
    pub tool: bool,
    pub symbols: bool,
}

impl InvocationContext {
    /// The project file name, e.g. `Demo.csproj`.
    #[must_use]
    pub fn project_file_name(&self) -> &str {
        self.arguments.first().map_or("", String::as_str)
    }

    /// Resolve a path from build metadata against the working directory.
    #[must_use]
    pub fn resolve(&self, raw: &str) -> PathBuf {
        paths::normalize(&self.working_directory, &paths::from_build_path(raw))
    }
}

/// Where the build put its outputs, and what the pack collects from them.
#[derive(Debug, Clone, Default)]
pub struct PackTargetArgs {
    pub target_path: Option<PathBuf>,
    pub assembly_name: Option<String>,
    pub output_path: Option<PathBuf>,
    pub configuration: Option<String>,
    pub project_references: Vec<ProjectReference>,
    /// Source path to the set of in-package target paths.
    pub content_files: BTreeMap<PathBuf, BTreeSet<String>>,
    pub target_frameworks: BTreeSet<TargetFramework>,
}

impl PackTargetArgs {
    /// The assembly name, falling back to the target path's file stem.
    #[must_use]
    pub fn effective_assembly_name(&self) -> Option<String> {
        self.assembly_name.clone().or_else(|| {
            self.target_path
                .as_ref()
                .and_then(|p| p.file_stem())
                .map(|s| s.to_string_lossy().into_owned())
        })
    }
}

/// Turns a [`PackRequest`] into an [`InvocationContext`] and [`PackTargetArgs`].
#[derive(Debug, Default)]
pub struct ArgsNormalizer;

impl ArgsNormalizer {
    /// Build the invocation context.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::MissingInput`] when the request has no pack item,
    /// before touching the file system.
    pub fn normalize(request: &PackRequest) -> Result<InvocationContext, PackError> {
        let item = request
            .pack_item
            .as_ref()
            .ok_or(PackError::MissingInput("PackItem"))?;

        let cwd = std::env::current_dir()?;
        let base = request
            .base_dir
            .as_deref()
            .map_or_else(|| cwd.clone(), |dir| paths::normalize(&cwd, dir));
        let working_directory = paths::normalize(&base, &paths::from_build_path(&item.root_dir));

        let file_name = format!("{}{}", item.file_name, item.extension);
        let path = working_directory.join(&file_name);

        let output_directory = request
            .package_output_path
            .as_deref()
            .map(|p| paths::normalize(&working_directory, &paths::from_build_path(p)));

        Ok(InvocationContext {
            path,
            arguments: vec![file_name],
            exclude: request
                .exclude
                .as_deref()
                .map(ExclusionSet::parse)
                .unwrap_or_default(),
            properties: request
                .properties
                .as_deref()
                .map(Properties::parse)
                .unwrap_or_default(),
            output_directory,
            tool: request.is_tool,
            symbols: request.include_symbols,
            working_directory,
        })
    }

    /// Build the output-location descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::UnsupportedFramework`] if a requested framework is not recognized.
    pub fn target_args(
        request: &PackRequest,
        context: &InvocationContext,
    ) -> Result<PackTargetArgs, PackError> {
        let mut target_frameworks = BTreeSet::new();
        for name in &request.target_frameworks {
            let framework = TargetFramework::parse(name);
            if framework.is_unsupported() {
                return Err(PackError::UnsupportedFramework(name.clone()));
            }
            target_frameworks.insert(framework);
        }

        Ok(PackTargetArgs {
            target_path: request.target_path.as_deref().map(|p| context.resolve(p)),
            assembly_name: request
                .assembly_name
                .clone()
                .filter(|name| !name.trim().is_empty()),
            output_path: request.output_path.as_deref().map(|p| context.resolve(p)),
            configuration: request.configuration.clone(),
            project_references: Vec::new(),
            content_files: BTreeMap::new(),
            target_frameworks,
        })
    }
}
