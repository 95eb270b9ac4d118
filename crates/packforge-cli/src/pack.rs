//! Implementation of the `packforge pack` command.
//!
//! Loads a pack request, applies command-line overrides, runs the pipeline,
//! and hands the package model to the manifest writer.

use anyhow::{Context, Result};
use packforge_core::{ArchiveWriter, ManifestWriter, PackReport, PackRequest, Packer};
use std::path::{Path, PathBuf};

/// Default request file name.
pub const REQUEST_FILE: &str = "pack.toml";

/// Options for the pack command.
#[derive(Debug, Default)]
pub struct PackOptions {
    /// Path to the pack request.
    pub request: PathBuf,
    /// Include debug symbols.
    pub symbols: bool,
    /// Build a tool package.
    pub tool: bool,
    /// Override the package version.
    pub version: Option<String>,
    /// Override the package output directory.
    pub output: Option<PathBuf>,
    /// Restrict the pack to these target frameworks.
    pub frameworks: Vec<String>,
    /// Build the model without writing anything.
    pub dry_run: bool,
}

/// Run the pack command.
pub fn run_pack(options: &PackOptions) -> Result<()> {
    if !options.request.exists() {
        return Err(anyhow::anyhow!(
            "No pack request found at {}. Pass the path to a {} file.",
            options.request.display(),
            REQUEST_FILE
        ));
    }

    let mut request = PackRequest::from_path(&options.request)
        .with_context(|| format!("Failed to read {}", options.request.display()))?;
    apply_overrides(&mut request, options)?;

    let report = Packer::new()
        .pack(&request)
        .context("Failed to build the package")?;

    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }
    print_summary(&report);

    let mut writer = ManifestWriter::new(&report.output_directory);
    if options.dry_run {
        println!("\n[Dry run] Would write:");
        println!("  Manifest: {}", writer.manifest_path(&report.model).display());
        println!("\nDry run complete. No files were written.");
        return Ok(());
    }

    let path = writer
        .write(&report.model)
        .context("Failed to write the package manifest")?;
    println!("\nWrote {}", path.display());
    Ok(())
}

/// Apply command-line overrides on top of the request file.
fn apply_overrides(request: &mut PackRequest, options: &PackOptions) -> Result<()> {
    if options.symbols {
        request.include_symbols = true;
    }
    if options.tool {
        request.is_tool = true;
    }
    if let Some(version) = &options.version {
        request.package_version = Some(version.clone());
    }
    if let Some(output) = &options.output {
        let output = absolute(output)?;
        request.package_output_path = Some(output.to_string_lossy().into_owned());
    }
    if !options.frameworks.is_empty() {
        request.target_frameworks.clone_from(&options.frameworks);
    }
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()
            .context("Failed to determine the current directory")?
            .join(path))
    }
}

fn print_summary(report: &PackReport) {
    let model = &report.model;
    println!("Packed {} {}", model.id, model.version);

    if !model.target_frameworks.is_empty() {
        let frameworks: Vec<String> = model
            .target_frameworks
            .iter()
            .map(ToString::to_string)
            .collect();
        println!("  Frameworks: {}", frameworks.join(", "));
    }

    println!("  Files ({}):", model.files.len());
    for file in &model.files {
        println!("    {} <- {}", file.target_path, file.source_path.display());
    }

    if !model.dependency_groups.is_empty() {
        println!("  Dependencies:");
        for group in &model.dependency_groups {
            println!("    {}:", group.target_framework);
            for dependency in &group.dependencies {
                println!("      {} {}", dependency.id, dependency.version_range);
            }
        }
    }

    if !model.package_types.is_empty() {
        let types: Vec<&str> = model.package_types.iter().map(|t| t.name.as_str()).collect();
        println!("  Package types: {}", types.join(", "));
    }
}
