/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Command implementations for the biblayout CLI
//!
//! Each command module handles the CLI interface and delegates to the
//! biblayout crates for the actual work.

pub mod check;
pub mod render;
pub mod resolve;

use anyhow::{Context, Result, anyhow};
use biblayout::{FormatterRegistry, Layout, LayoutConfig};
use std::io::IsTerminal;
use std::path::Path;

use crate::diagnostics::render_layout_error;

/// Load the configuration file, or an empty configuration when none is
/// given. Relative file directories are taken relative to the file.
pub fn load_config(path: Option<&Path>) -> Result<LayoutConfig> {
    let Some(path) = path else {
        return Ok(LayoutConfig::default());
    };
    let mut config = LayoutConfig::from_file(path)
        .with_context(|| format!("Failed to load configuration {}", path.display()))?;

    if let Some(base) = path.parent() {
        for dir in &mut config.file_directories {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }
    tracing::debug!(
        config = %path.display(),
        formatters = config.name_formatters.len(),
        macros = config.macros.len(),
        "Loaded configuration"
    );
    Ok(config)
}

/// Read and compile a layout file, printing a source-annotated report to
/// stderr when compilation fails.
pub fn compile_layout(path: &Path, registry: &FormatterRegistry) -> Result<Layout> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read layout {}", path.display()))?;

    Layout::compile(&source, registry).map_err(|err| {
        let report = render_layout_error(
            &path.display().to_string(),
            &source,
            &err,
            std::io::stderr().is_terminal(),
        );
        eprint!("{}", report);
        anyhow!("{} could not be compiled", path.display())
    })
}
