/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Bibliographic entry model for biblayout.
//!
//! This crate holds the read-only collaborators that the layout engine
//! consumes:
//!
//! - [`Entry`]: a typed record with case-insensitive fields and an optional
//!   citation key
//! - [`MacroTable`]: named text fragments referenced as `#name#` inside field
//!   values, together with the cycle-safe resolver that expands them
//! - [`LinkedFile`]: attached-file descriptors parsed from the `file` field
//!
//! # Example
//!
//! ```
//! use biblayout_model::{Entry, EntryType, MacroTable};
//!
//! let mut macros = MacroTable::new();
//! macros.add("DSP", "Digital Signal Processing").unwrap();
//!
//! let entry = Entry::new(EntryType::Article).with_field("journal", "#DSP# Letters");
//! let journal = entry.field("journal").unwrap();
//! assert_eq!(macros.resolve(journal), "Digital Signal Processing Letters");
//! ```

pub mod entry;
pub mod error;
pub mod files;
pub mod macros;

pub use entry::{Entry, EntryId, EntryType};
pub use error::{ModelError, ModelResult};
pub use files::{LinkedFile, parse_file_field};
pub use macros::{MACRO_DELIMITER, Macro, MacroTable};
