/*
 * render.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Render command implementation
 */

//! Render command implementation.
//!
//! Compiles a layout once and renders every entry of a JSON entry file
//! through it. Output goes to a file or to stdout.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use biblayout::RenderContext;
use biblayout_model::Entry;

use super::{compile_layout, load_config};

/// Arguments for the render command
#[derive(Debug)]
pub struct RenderArgs {
    /// Layout file
    pub layout: PathBuf,
    /// JSON entry file
    pub entries: PathBuf,
    /// Optional YAML configuration
    pub config: Option<PathBuf>,
    /// Extra attached-file directories, tried before the configured ones
    pub file_dirs: Vec<PathBuf>,
    /// Text between rendered entries
    pub separator: String,
    /// Output file; stdout when absent
    pub output: Option<PathBuf>,
}

/// Execute the render command
pub fn execute(args: RenderArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let registry = config.formatter_registry();
    let layout = compile_layout(&args.layout, &registry)?;

    let entries_source = std::fs::read_to_string(&args.entries)
        .with_context(|| format!("Failed to read entries {}", args.entries.display()))?;
    let entries = Entry::list_from_json(&entries_source)
        .with_context(|| format!("Failed to decode entries {}", args.entries.display()))?;

    let macros = config.macro_table()?;
    let mut directories = args.file_dirs;
    directories.extend(config.file_directories.iter().cloned());
    let ctx = RenderContext::new(&macros).with_file_directories(&directories);

    let rendered = entries
        .iter()
        .map(|entry| {
            layout.render(entry, &ctx).with_context(|| match entry.citation_key() {
                Some(key) => format!("Failed to render entry '{}'", key),
                None => format!("Failed to render {}", entry.id()),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let output = rendered.join(&args.separator);

    match &args.output {
        Some(path) => std::fs::write(path, &output)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(output.as_bytes())?;
            stdout.flush()?;
        }
    }

    info!(
        entries = entries.len(),
        layout = %args.layout.display(),
        "Rendered entries"
    );
    Ok(())
}
