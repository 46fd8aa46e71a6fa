/*
 * config.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Layout configuration.
//!
//! A YAML document bundling what a render needs besides the layout and the
//! entries:
//!
//! ```yaml
//! name-formatters:
//!   - name: DCA
//!     format: "1@*@{ll}@@2@1..1@{ff}{ll}@2..2@ and {ff}{l}@@*@*@more"
//! file-directories:
//!   - /home/me/papers
//! macros:
//!   ieee: "IEEE Transactions"
//! ```
//!
//! Every key is optional.

use crate::error::{LayoutError, LayoutResult};
use crate::formatters::FormatterRegistry;
use biblayout_model::MacroTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Custom name formatter: a registry name bound to a name-format spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NameFormatterConfig {
    pub name: String,
    pub format: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct LayoutConfig {
    #[serde(default)]
    pub name_formatters: Vec<NameFormatterConfig>,

    /// Base directories for attached files, tried in order.
    #[serde(default)]
    pub file_directories: Vec<PathBuf>,

    #[serde(default)]
    pub macros: BTreeMap<String, String>,
}

impl LayoutConfig {
    pub fn from_yaml_str(source: &str) -> LayoutResult<Self> {
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(source).map_err(|e| LayoutError::Config {
            message: e.to_string(),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> LayoutResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&source).map_err(|e| match e {
            LayoutError::Config { message } => LayoutError::Config {
                message: format!("{}: {}", path.display(), message),
            },
            other => other,
        })
    }

    /// Built-in formatters plus the configured name formatters.
    ///
    /// A configured name formatter may shadow a built-in one.
    pub fn formatter_registry(&self) -> FormatterRegistry {
        let mut registry = FormatterRegistry::with_builtins();
        for custom in &self.name_formatters {
            if registry
                .register_name_formatter(&custom.name, &custom.format)
                .is_some()
            {
                tracing::debug!(formatter = %custom.name, "Configured formatter replaces an existing one");
            }
        }
        registry
    }

    /// The configured macros as a table.
    ///
    /// # Errors
    ///
    /// Names that differ only by case collide.
    pub fn macro_table(&self) -> LayoutResult<MacroTable> {
        let mut table = MacroTable::new();
        for (name, value) in &self.macros {
            table
                .add(name.as_str(), value.as_str())
                .map_err(|e| LayoutError::Config {
                    message: e.to_string(),
                })?;
        }
        Ok(table)
    }
}
