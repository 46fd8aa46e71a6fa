/*
 * resolve.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Print a text with its `#macro#` references expanded.

use std::path::Path;

use anyhow::Result;

use super::load_config;

/// Execute the resolve command
pub fn execute(text: &str, config: Option<&Path>) -> Result<()> {
    let macros = load_config(config)?.macro_table()?;
    println!("{}", macros.resolve(text));
    Ok(())
}
