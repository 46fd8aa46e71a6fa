/*
 * locator.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Path existence checks for file-link expansion.
//!
//! Formatters that point at attached files need to know whether a candidate
//! path exists and what its real absolute path is. This module provides a
//! trait for that check and implementations backed by the filesystem or by
//! a fixed set of paths.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Trait for locating files.
pub trait PathLocator: Send + Sync {
    /// Return the real absolute path of `path` if it exists.
    fn locate(&self, path: &Path) -> Option<PathBuf>;
}

/// Locator that checks the filesystem.
///
/// Existing paths are canonicalized, so symlinks and `..` components are
/// resolved.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemLocator;

impl PathLocator for FileSystemLocator {
    fn locate(&self, path: &Path) -> Option<PathBuf> {
        std::fs::canonicalize(path).ok()
    }
}

/// Locator that knows a fixed set of paths (for testing without file I/O).
///
/// Paths are reported as-is; no canonicalization takes place.
#[derive(Debug, Clone, Default)]
pub struct MemoryLocator {
    paths: HashSet<PathBuf>,
}

impl MemoryLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an existing path.
    pub fn insert(&mut self, path: impl Into<PathBuf>) {
        self.paths.insert(path.into());
    }

    /// Builder form of [`MemoryLocator::insert`].
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.insert(path);
        self
    }
}

impl PathLocator for MemoryLocator {
    fn locate(&self, path: &Path) -> Option<PathBuf> {
        self.paths.get(path).cloned()
    }
}
