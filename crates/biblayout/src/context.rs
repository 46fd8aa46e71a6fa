/*
 * context.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Render context.
//!
//! [`RenderContext`] bundles the externally owned collaborators a render
//! call reads: the macro table used to expand field values, the ordered list
//! of base directories for attached files, and the locator that checks whether
//! a file exists. It is passed explicitly to [`crate::Layout::render`] and to
//! every formatter; nothing is global.

use crate::locator::{FileSystemLocator, PathLocator};
use biblayout_model::MacroTable;
use std::fmt;
use std::path::PathBuf;

static EMPTY_MACROS: MacroTable = MacroTable::new();

/// Read-only inputs to a render call.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    /// Macro definitions for `#name#` expansion in field values.
    pub macros: &'a MacroTable,

    /// Base directories tried, in order, when locating attached files.
    pub file_directories: &'a [PathBuf],

    /// Existence check for attached files.
    pub locator: &'a dyn PathLocator,
}

impl<'a> RenderContext<'a> {
    /// Create a context with the given macros, no file directories and a
    /// filesystem locator.
    pub fn new(macros: &'a MacroTable) -> Self {
        Self {
            macros,
            file_directories: &[],
            locator: &FileSystemLocator,
        }
    }

    pub fn with_file_directories(mut self, directories: &'a [PathBuf]) -> Self {
        self.file_directories = directories;
        self
    }

    pub fn with_locator(mut self, locator: &'a dyn PathLocator) -> Self {
        self.locator = locator;
        self
    }
}

impl Default for RenderContext<'static> {
    fn default() -> Self {
        RenderContext::new(&EMPTY_MACROS)
    }
}

impl fmt::Debug for RenderContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("macros", &self.macros.len())
            .field("file_directories", &self.file_directories)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::MemoryLocator;
    use std::path::Path;

    #[test]
    fn test_default_context() {
        let ctx = RenderContext::default();
        assert!(ctx.macros.is_empty());
        assert!(ctx.file_directories.is_empty());
    }

    #[test]
    fn test_builder() {
        let mut macros = MacroTable::new();
        macros.add("DSP", "Digital Signal Processing").unwrap();
        let dirs = vec![PathBuf::from("/docs")];
        let locator = MemoryLocator::new().with_path("/docs/a.pdf");

        let ctx = RenderContext::new(&macros)
            .with_file_directories(&dirs)
            .with_locator(&locator);

        assert_eq!(ctx.macros.len(), 1);
        assert_eq!(ctx.file_directories, &dirs[..]);
        assert!(ctx.locator.locate(Path::new("/docs/a.pdf")).is_some());
    }
}
