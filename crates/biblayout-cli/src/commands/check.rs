/*
 * check.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Check command implementation
 */

//! Compile a layout without rendering and list the fields it reads.

use std::path::Path;

use anyhow::Result;

use super::{compile_layout, load_config};

/// Execute the check command
pub fn execute(layout: &Path, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let compiled = compile_layout(layout, &config.formatter_registry())?;

    let fields = compiled.referenced_fields();
    println!("{}: ok", layout.display());
    if !fields.is_empty() {
        println!("fields: {}", fields.join(", "));
    }
    Ok(())
}
