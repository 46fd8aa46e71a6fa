/*
 * formatters/mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Formatters and the formatter registry.
//!
//! A formatter transforms the rendered text of a `\format[...]{...}` body,
//! optionally guided by an argument (`\format[Name(argument)]{...}`).
//! Formatters are looked up by case-sensitive name when a layout is
//! compiled; an unknown name is a compile error.
//!
//! Built-in formatters:
//!
//! | Name | Behaviour |
//! |------|-----------|
//! | `HTMLChars` | HTML escaping, line and paragraph breaks, LaTeX accents |
//! | `NameFormatter` | Reformat a name list with a name-format specification |
//! | `WrapFileLinks` | Expand attached files through a link template |
//! | `ToUpperCase` / `ToLowerCase` | Case conversion |
//! | `Default` | Substitute the argument when the body is empty |

pub mod files;
pub mod html;
pub mod names;

use crate::context::RenderContext;
use crate::error::FormatError;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub use files::WrapFileLinks;
pub use html::HtmlChars;
pub use names::{DEFAULT_NAME_FORMAT, NameFormatSpec, NameFormatter};

pub const HTML_CHARS: &str = "HTMLChars";
pub const NAME_FORMATTER: &str = "NameFormatter";
pub const WRAP_FILE_LINKS: &str = "WrapFileLinks";
pub const TO_UPPER_CASE: &str = "ToUpperCase";
pub const TO_LOWER_CASE: &str = "ToLowerCase";
pub const DEFAULT: &str = "Default";

/// A text transformation usable inside `\format[...]`.
///
/// Implementations must not keep per-render state: one formatter instance
/// is shared by every layout compiled against the registry, possibly
/// across threads.
pub trait LayoutFormatter: Send + Sync {
    /// Transform `input`.
    ///
    /// # Arguments
    /// * `input` - The rendered body of the `\format` block
    /// * `argument` - The text inside `Name(...)`, if given
    /// * `context` - Read-only render inputs (file directories, locator)
    fn format(
        &self,
        input: &str,
        argument: Option<&str>,
        context: &RenderContext<'_>,
    ) -> Result<String, FormatError>;
}

/// Upper- or lower-case conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseFormatter {
    Upper,
    Lower,
}

impl LayoutFormatter for CaseFormatter {
    fn format(
        &self,
        input: &str,
        _argument: Option<&str>,
        _context: &RenderContext<'_>,
    ) -> Result<String, FormatError> {
        Ok(match self {
            CaseFormatter::Upper => input.to_uppercase(),
            CaseFormatter::Lower => input.to_lowercase(),
        })
    }
}

/// Replace an empty body with the argument.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFormatter;

impl LayoutFormatter for DefaultFormatter {
    fn format(
        &self,
        input: &str,
        argument: Option<&str>,
        _context: &RenderContext<'_>,
    ) -> Result<String, FormatError> {
        if input.trim().is_empty() {
            Ok(argument.unwrap_or_default().to_string())
        } else {
            Ok(input.to_string())
        }
    }
}

/// Named set of formatters available to layout compilation.
#[derive(Clone, Default)]
pub struct FormatterRegistry {
    formatters: HashMap<String, Arc<dyn LayoutFormatter>>,
}

impl FormatterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding all built-in formatters.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(HTML_CHARS, HtmlChars);
        registry.register(NAME_FORMATTER, NameFormatter::new());
        registry.register(WRAP_FILE_LINKS, WrapFileLinks);
        registry.register(TO_UPPER_CASE, CaseFormatter::Upper);
        registry.register(TO_LOWER_CASE, CaseFormatter::Lower);
        registry.register(DEFAULT, DefaultFormatter);
        registry
    }

    /// Register a formatter under `name`, replacing any previous one.
    ///
    /// Layouts compiled before the call keep the formatter they resolved.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        formatter: impl LayoutFormatter + 'static,
    ) -> Option<Arc<dyn LayoutFormatter>> {
        let name = name.into();
        tracing::trace!(formatter = %name, "Registering formatter");
        self.formatters.insert(name, Arc::new(formatter))
    }

    /// Register a name formatter bound to a fixed name-format specification.
    ///
    /// The specification is checked when the formatter runs, so a malformed
    /// one surfaces as a render error.
    pub fn register_name_formatter(
        &mut self,
        name: impl Into<String>,
        format: impl Into<String>,
    ) -> Option<Arc<dyn LayoutFormatter>> {
        self.register(name, NameFormatter::with_format(format))
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn LayoutFormatter>> {
        self.formatters.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.formatters.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.formatters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.formatters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formatters.is_empty()
    }
}

impl fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatterRegistry")
            .field("formatters", &self.names())
            .finish()
    }
}
