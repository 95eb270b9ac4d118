//! Collection of build outputs into package folders.
//!
//! Outputs are found by scanning the project's output directory for files
//! named after the host assembly or after any referenced project's assembly,
//! restricted to an allow-list of extensions. Referenced projects' binaries
//! are copied next to the host's by the build, so they are picked up from the
//! same directory.

use crate::args::PackTargetArgs;
use crate::diagnostics::{Diagnostics, PackWarning};
use crate::filter::FileFilter;
use crate::framework::TargetFramework;
use crate::model::PackageFile;
use crate::paths;
use crate::PackError;
use glob::{MatchOptions, Pattern};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Extensions of build outputs that enter a package.
pub const OUTPUT_EXTENSIONS: &[&str] = &["dll", "exe", "xml", "winmd"];

/// Debug symbols, collected only for symbol packages.
pub const SYMBOL_EXTENSION: &str = "pdb";

pub const LIB_FOLDER: &str = "lib";
pub const TOOLS_FOLDER: &str = "tools";

const SCAN_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Collects build outputs of the host project and its referenced projects.
#[derive(Debug, Clone)]
pub struct OutputCollector {
    extensions: Vec<String>,
    tool: bool,
    filter: FileFilter,
}

impl OutputCollector {
    /// Create a collector.
    ///
    /// `symbols` adds [`SYMBOL_EXTENSION`] to the allow-list; `tool` places
    /// every output in [`TOOLS_FOLDER`].
    #[must_use]
    pub fn new(symbols: bool, tool: bool, filter: FileFilter) -> Self {
        let mut extensions: Vec<String> = OUTPUT_EXTENSIONS.iter().map(ToString::to_string).collect();
        if symbols {
            extensions.push(SYMBOL_EXTENSION.to_string());
        }
        Self {
            extensions,
            tool,
            filter,
        }
    }

    #[must_use]
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Collect the output files for the package.
    ///
    /// `frameworks` are the package's target frameworks; at most one is
    /// allowed. A missing output directory is a warning and yields no files.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::MultipleFrameworksUnexpected`] before touching the
    /// file system when more than one framework is given, and
    /// [`PackError::Io`] if the output directory cannot be scanned.
    pub fn collect(
        &self,
        args: &PackTargetArgs,
        frameworks: &BTreeSet<TargetFramework>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<PackageFile>, PackError> {
        if frameworks.len() > 1 {
            return Err(PackError::MultipleFrameworksUnexpected(
                frameworks.iter().map(ToString::to_string).collect(),
            ));
        }

        let Some(target_path) = &args.target_path else {
            tracing::debug!("no target path, skipping build outputs");
            return Ok(Vec::new());
        };

        let target_is_dir = target_path.is_dir();
        let output_dir = if target_is_dir {
            target_path.as_path()
        } else {
            target_path.parent().unwrap_or(target_path.as_path())
        };

        if !output_dir.is_dir() {
            diagnostics.warn(PackWarning::MissingOutputDirectory {
                path: output_dir.to_path_buf(),
            });
            return Ok(Vec::new());
        }

        let mut names: Vec<String> = Vec::new();
        if let Some(name) = args.effective_assembly_name() {
            names.push(name);
        }
        for reference in &args.project_references {
            if !names
                .iter()
                .any(|n| n.eq_ignore_ascii_case(&reference.assembly_name))
            {
                names.push(reference.assembly_name.clone());
            }
        }

        let mut sources = BTreeSet::new();
        for name in &names {
            sources.extend(self.scan(output_dir, name)?);
        }

        let framework = frameworks.iter().next();
        let files: Vec<PackageFile> = sources
            .into_iter()
            .map(|source| {
                let folder = self.target_folder(&source, output_dir, target_is_dir, framework);
                let name = source
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                PackageFile::new(&source, paths::join_package_path(&folder, &name))
            })
            .collect();

        tracing::debug!(
            directory = %output_dir.display(),
            assemblies = names.len(),
            files = files.len(),
            "collected build outputs"
        );
        Ok(files)
    }

    /// Find the outputs named `name` anywhere below `dir`.
    fn scan(&self, dir: &Path, name: &str) -> Result<Vec<PathBuf>, PackError> {
        let pattern = format!(
            "{}/**/{}.*",
            Pattern::escape(&dir.to_string_lossy()),
            Pattern::escape(name)
        );

        let mut found = Vec::new();
        for entry in glob::glob_with(&pattern, SCAN_OPTIONS)? {
            let path = entry.map_err(|e| PackError::Io(e.into_error()))?;
            if path.is_file() && self.is_output(&path, name) {
                found.push(path);
            }
        }
        Ok(found)
    }

    fn is_output(&self, path: &Path, name: &str) -> bool {
        let stem_matches = path
            .file_stem()
            .is_some_and(|stem| stem.to_string_lossy().eq_ignore_ascii_case(name));
        let extension_allowed = path.extension().is_some_and(|ext| {
            let ext = ext.to_string_lossy();
            self.extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
        });
        stem_matches && extension_allowed && !self.filter.is_excluded(path)
    }

    fn target_folder(
        &self,
        source: &Path,
        output_dir: &Path,
        target_is_dir: bool,
        framework: Option<&TargetFramework>,
    ) -> String {
        if self.tool {
            return TOOLS_FOLDER.to_string();
        }
        if target_is_dir {
            let relative = source
                .parent()
                .and_then(|parent| parent.strip_prefix(output_dir).ok())
                .map(paths::to_package_path)
                .unwrap_or_default();
            return paths::join_package_path(LIB_FOLDER, &relative);
        }
        match framework {
            Some(framework) if !framework.is_any() => {
                format!("{LIB_FOLDER}/{}", framework.short_folder_name())
            }
            _ => LIB_FOLDER.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::ExclusionSet;
    use crate::reference::ProjectReference;
    use tempfile::TempDir;

    fn touch(dir: &Path, relative: &str) {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, b"").unwrap();
    }

    fn frameworks(names: &[&str]) -> BTreeSet<TargetFramework> {
        names.iter().map(|n| TargetFramework::parse(n)).collect()
    }

    fn targets(files: &[PackageFile]) -> Vec<&str> {
        files.iter().map(|f| f.target_path.as_str()).collect()
    }

    fn host_args(dir: &Path) -> PackTargetArgs {
        PackTargetArgs {
            target_path: Some(dir.join("host.dll")),
            ..PackTargetArgs::default()
        }
    }

    #[test]
    fn collects_allowed_extensions_for_the_host() {
        let dir = TempDir::new().unwrap();
        for file in ["host.dll", "host.xml", "host.pdb", "host.txt", "hostess.dll", "other.dll"] {
            touch(dir.path(), file);
        }

        let collector = OutputCollector::new(false, false, FileFilter::builtin(dir.path()));
        let mut diagnostics = Diagnostics::new();
        let files = collector
            .collect(&host_args(dir.path()), &frameworks(&["net45"]), &mut diagnostics)
            .unwrap();

        assert_eq!(targets(&files), ["lib/net45/host.dll", "lib/net45/host.xml"]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn symbols_add_pdb_files() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "host.dll");
        touch(dir.path(), "host.pdb");

        let collector = OutputCollector::new(true, false, FileFilter::builtin(dir.path()));
        let files = collector
            .collect(
                &host_args(dir.path()),
                &frameworks(&["net45"]),
                &mut Diagnostics::new(),
            )
            .unwrap();

        assert_eq!(targets(&files), ["lib/net45/host.dll", "lib/net45/host.pdb"]);
    }

    #[test]
    fn referenced_assemblies_are_collected_transitively() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "host.dll");
        touch(dir.path(), "RefLib.dll");

        let mut args = host_args(dir.path());
        args.project_references.push(ProjectReference {
            assembly_name: "RefLib".to_string(),
            target_path: dir.path().join("ref.dll"),
        });

        let collector = OutputCollector::new(false, false, FileFilter::builtin(dir.path()));
        let files = collector
            .collect(&args, &frameworks(&["net45"]), &mut Diagnostics::new())
            .unwrap();

        assert_eq!(targets(&files), ["lib/net45/RefLib.dll", "lib/net45/host.dll"]);
    }

    #[test]
    fn more_than_one_framework_is_rejected() {
        let collector = OutputCollector::new(false, false, FileFilter::builtin("/nowhere"));
        let args = PackTargetArgs {
            target_path: Some(PathBuf::from("/nowhere/host.dll")),
            ..PackTargetArgs::default()
        };
        let mut diagnostics = Diagnostics::new();

        let err = collector
            .collect(&args, &frameworks(&["net45", "net46"]), &mut diagnostics)
            .unwrap_err();

        assert!(matches!(err, PackError::MultipleFrameworksUnexpected(ref names) if names.len() == 2));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn missing_output_directory_warns() {
        let dir = TempDir::new().unwrap();
        let args = PackTargetArgs {
            target_path: Some(dir.path().join("bin/Debug/host.dll")),
            ..PackTargetArgs::default()
        };
        let collector = OutputCollector::new(false, false, FileFilter::builtin(dir.path()));
        let mut diagnostics = Diagnostics::new();

        let files = collector
            .collect(&args, &frameworks(&["net45"]), &mut diagnostics)
            .unwrap();

        assert!(files.is_empty());
        assert!(matches!(
            diagnostics.warnings(),
            [PackWarning::MissingOutputDirectory { .. }]
        ));
    }

    #[test]
    fn tool_packages_use_the_tools_folder() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "host.exe");

        let collector = OutputCollector::new(false, true, FileFilter::builtin(dir.path()));
        let files = collector
            .collect(
                &host_args(dir.path()),
                &frameworks(&["net45"]),
                &mut Diagnostics::new(),
            )
            .unwrap();

        assert_eq!(targets(&files), ["tools/host.exe"]);
    }

    #[test]
    fn directory_targets_keep_sub_structure() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "publish/host.dll");
        touch(dir.path(), "publish/runtimes/win/host.dll");

        let args = PackTargetArgs {
            target_path: Some(dir.path().join("publish")),
            assembly_name: Some("host".to_string()),
            ..PackTargetArgs::default()
        };
        let collector = OutputCollector::new(false, false, FileFilter::builtin(dir.path()));
        let files = collector
            .collect(&args, &frameworks(&["net45"]), &mut Diagnostics::new())
            .unwrap();

        assert_eq!(targets(&files), ["lib/host.dll", "lib/runtimes/win/host.dll"]);
    }

    #[test]
    fn no_framework_uses_the_lib_folder() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "host.dll");

        let collector = OutputCollector::new(false, false, FileFilter::builtin(dir.path()));
        let files = collector
            .collect(&host_args(dir.path()), &BTreeSet::new(), &mut Diagnostics::new())
            .unwrap();

        assert_eq!(targets(&files), ["lib/host.dll"]);
    }

    #[test]
    fn exclusions_apply_to_outputs() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "host.dll");
        touch(dir.path(), "host.xml");

        let filter = FileFilter::new(dir.path(), &ExclusionSet::parse("*.xml")).unwrap();
        let collector = OutputCollector::new(false, false, filter);
        let files = collector
            .collect(
                &host_args(dir.path()),
                &frameworks(&["net45"]),
                &mut Diagnostics::new(),
            )
            .unwrap();

        assert_eq!(targets(&files), ["lib/net45/host.dll"]);
    }
}
