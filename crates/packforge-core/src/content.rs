//! Mapping of declared content files to in-package paths.

use crate::args::{ContentItem, InvocationContext};
use crate::filter::FileFilter;
use crate::model::PackageFile;
use crate::paths;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Folder used for content files without an explicit package path.
pub const CONTENT_FOLDER: &str = "content";

/// Source path to the set of requested in-package paths.
///
/// An empty target means the default content location.
pub type ContentFiles = BTreeMap<PathBuf, BTreeSet<String>>;

/// Maps content items to target paths, honoring their inclusion flags.
#[derive(Debug)]
pub struct ContentMapper<'a> {
    context: &'a InvocationContext,
}

impl<'a> ContentMapper<'a> {
    #[must_use]
    pub fn new(context: &'a InvocationContext) -> Self {
        Self { context }
    }

    /// Build the content mapping.
    ///
    /// A source excluded by any of its items is excluded for all of them.
    #[must_use]
    pub fn map(&self, items: &[ContentItem]) -> ContentFiles {
        let resolved: Vec<(PathBuf, &ContentItem)> = items
            .iter()
            .map(|item| (self.source_path(item), item))
            .collect();

        let excluded: BTreeSet<&PathBuf> = resolved
            .iter()
            .filter(|(_, item)| item.is_excluded())
            .map(|(path, _)| path)
            .collect();

        let mut files = ContentFiles::new();
        for (path, item) in &resolved {
            if excluded.contains(path) {
                continue;
            }
            files
                .entry(path.clone())
                .or_default()
                .insert(item.package_path.clone().unwrap_or_default());
        }

        tracing::debug!(
            sources = files.len(),
            excluded = excluded.len(),
            "mapped content files"
        );
        files
    }

    /// The effective source path of an item.
    ///
    /// Linked items resolve their identity against the owning project's directory.
    fn source_path(&self, item: &ContentItem) -> PathBuf {
        match (&item.source_project_file, &item.identity) {
            (Some(project), Some(identity)) => {
                let project = self.context.resolve(project);
                let project_dir = project.parent().unwrap_or(project.as_path());
                paths::normalize(project_dir, &paths::from_build_path(identity))
            }
            _ => self.context.resolve(&item.full_path),
        }
    }
}

/// Turn a content mapping into package files.
///
/// Files rejected by `filter` are skipped.
#[must_use]
pub fn package_files(content: &ContentFiles, filter: &FileFilter) -> Vec<PackageFile> {
    let mut files = Vec::new();
    for (source, targets) in content {
        if filter.is_excluded(source) {
            tracing::debug!(path = %source.display(), "content file excluded");
            continue;
        }
        for target in targets {
            files.push(PackageFile::new(source, content_target(source, target)));
        }
    }
    files
}

/// Resolve one requested target for `source` to an in-package path.
fn content_target(source: &Path, target: &str) -> String {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let target = target.replace('\\', "/");

    if target.is_empty() {
        return paths::join_package_path(CONTENT_FOLDER, &name);
    }
    if target.ends_with('/') {
        return paths::join_package_path(&target, &name);
    }

    let source_extension = source.extension().map(|e| e.to_string_lossy().to_lowercase());
    let target_extension = Path::new(&target)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase());
    if source_extension.is_some() && source_extension == target_extension {
        target.trim_start_matches('/').to_string()
    } else {
        paths::join_package_path(&target, &name)
    }
}
