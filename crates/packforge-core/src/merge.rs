//! Merging of project specifications into the package's dependency groups.

use crate::diagnostics::{Diagnostics, PackWarning};
use crate::framework::TargetFramework;
use crate::model::{PackageDependency, PackageModel};
use crate::reference::SpecLocation;
use crate::spec::{ProjectSpec, SpecDependency, SpecReader, SPEC_FILE_NAME};
use crate::PackError;
use std::collections::BTreeSet;

/// Merges per-framework and framework-agnostic dependencies of project
/// specifications into a [`PackageModel`].
///
/// Only the host project's frameworks become the package's target
/// frameworks. Referenced projects contribute dependencies only.
#[derive(Debug)]
pub struct SpecMerger<'a, R: SpecReader> {
    reader: &'a R,
    requested: &'a BTreeSet<TargetFramework>,
}

impl<'a, R: SpecReader> SpecMerger<'a, R> {
    /// Create a merger.
    ///
    /// A non-empty `requested` set restricts which host frameworks become
    /// package target frameworks.
    pub fn new(reader: &'a R, requested: &'a BTreeSet<TargetFramework>) -> Self {
        Self { reader, requested }
    }

    /// Read and merge the specification at `location`.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::SpecRead`] when the host project has no
    /// specification, [`PackError::UnsupportedFramework`] when a framework
    /// entry is not recognized, and any error raised by the reader.
    pub fn merge(
        &self,
        location: &SpecLocation,
        is_host: bool,
        model: &mut PackageModel,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), PackError> {
        match self.reader.read(location)? {
            Some(spec) => self.merge_spec(&spec, is_host, model),
            None if is_host => Err(PackError::SpecRead {
                path: location.directory.join(SPEC_FILE_NAME),
                reason: "file not found".to_string(),
            }),
            None => {
                diagnostics.warn(PackWarning::MissingReferencedSpec {
                    path: location.directory.clone(),
                });
                Ok(())
            }
        }
    }

    /// Merge an already loaded specification.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::UnsupportedFramework`] when a framework entry is
    /// not recognized, or when the host does not declare a requested framework.
    pub fn merge_spec(
        &self,
        spec: &ProjectSpec,
        is_host: bool,
        model: &mut PackageModel,
    ) -> Result<(), PackError> {
        let shared: Vec<PackageDependency> = packable(&spec.dependencies).collect();

        for entry in &spec.frameworks {
            if let TargetFramework::Unsupported(name) = &entry.framework {
                return Err(PackError::UnsupportedFramework(name.clone()));
            }

            if is_host && (self.requested.is_empty() || self.requested.contains(&entry.framework)) {
                model.target_frameworks.insert(entry.framework.clone());
            }

            let dependencies = packable(&entry.dependencies).chain(shared.iter().cloned());
            model.merge_dependencies(&entry.framework, dependencies);
        }

        if is_host {
            if let Some(missing) = self
                .requested
                .iter()
                .find(|framework| !spec.frameworks.iter().any(|e| e.framework == **framework))
            {
                return Err(PackError::UnsupportedFramework(missing.to_string()));
            }
        }

        if spec.frameworks.is_empty() && !shared.is_empty() {
            model.merge_dependencies(&TargetFramework::Any, shared);
        }

        tracing::debug!(
            path = %spec.path.display(),
            host = is_host,
            frameworks = spec.frameworks.len(),
            "merged project specification"
        );
        Ok(())
    }
}

fn packable(dependencies: &[SpecDependency]) -> impl Iterator<Item = PackageDependency> + '_ {
    dependencies
        .iter()
        .filter(|d| !d.suppressed)
        .map(|d| d.dependency.clone())
}
