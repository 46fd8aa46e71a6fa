/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Bibliographic layout engine.
//!
//! A layout is a small text template that turns one bibliography entry into
//! formatted text. It supports:
//!
//! - Field references: `\author`, `\year`, terminated by any character that
//!   cannot be part of a name, or explicitly by `{}` (`\edition{}th`)
//! - Pseudo-fields: `\bibtextype` (entry type), `\bibtexkey` (citation key)
//! - Conditionals on field presence: `\begin{editor||!author}...\end{editor||!author}`
//! - Formatter chains: `\format[HTMLChars,NameFormatter(*@*@{ll})]{\author}`
//! - A literal backslash: `\\`
//!
//! Field values are expanded through a [`MacroTable`](biblayout_model::MacroTable)
//! (`#name#` references) before they reach the output.
//!
//! # Example
//!
//! ```
//! use biblayout::{FormatterRegistry, Layout, RenderContext};
//! use biblayout_model::{Entry, EntryType};
//!
//! let registry = FormatterRegistry::with_builtins();
//! let layout = Layout::compile("\\bibtextype: \\format[ToUpperCase]{\\title}", &registry)?;
//!
//! let entry = Entry::new(EntryType::Article).with_field("title", "Layouts");
//! assert_eq!(layout.render(&entry, &RenderContext::default())?, "Article: LAYOUTS");
//! # Ok::<(), biblayout::LayoutError>(())
//! ```

pub mod ast;
pub mod condition;
pub mod config;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod field;
pub mod formatters;
pub mod locator;
pub mod parser;

// Re-export main types at crate root
pub use ast::{Conditional, FieldRef, FormatCall, FormatterCall, LayoutNode, Literal};
pub use condition::{Condition, Operator, Predicate};
pub use config::{LayoutConfig, NameFormatterConfig};
pub use context::RenderContext;
pub use error::{FormatError, LayoutError, LayoutResult, Location};
pub use field::{PseudoField, is_field_present, resolve_field};
pub use formatters::{FormatterRegistry, LayoutFormatter};
pub use locator::{FileSystemLocator, MemoryLocator, PathLocator};
pub use parser::Layout;

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_layout_is_shareable() {
        assert_send_sync::<Layout>();
        assert_send_sync::<FormatterRegistry>();
    }
}
