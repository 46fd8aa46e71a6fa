/*
 * formatters/files.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! `WrapFileLinks`: expand a `file` field through a link template.
//!
//! The argument is a template applied to each attached file in turn, the
//! results concatenated without separator. Placeholders:
//!
//! - `\i` 1-based position of the file
//! - `\d` description
//! - `\p` path, resolved against the file directories
//! - `\f` file type
//! - `\x` file extension
//! - `\\` a literal backslash
//!
//! Without an argument the template is `\p`.

use super::LayoutFormatter;
use crate::context::RenderContext;
use crate::error::FormatError;
use crate::locator::PathLocator;
use biblayout_model::{LinkedFile, parse_file_field};
use std::path::{Path, PathBuf};

const DEFAULT_TEMPLATE: &str = "\\p";

#[derive(Debug, Clone, Copy, Default)]
pub struct WrapFileLinks;

impl LayoutFormatter for WrapFileLinks {
    fn format(
        &self,
        input: &str,
        argument: Option<&str>,
        context: &RenderContext<'_>,
    ) -> Result<String, FormatError> {
        let template = parse_template(argument.unwrap_or(DEFAULT_TEMPLATE))?;
        let mut out = String::new();
        for (index, file) in parse_file_field(input).iter().enumerate() {
            for piece in &template {
                match piece {
                    Piece::Text(text) => out.push_str(text),
                    Piece::Index => out.push_str(&(index + 1).to_string()),
                    Piece::Description => out.push_str(&file.description),
                    Piece::Path => {
                        let path =
                            resolve_linked_path(file, context.file_directories, context.locator);
                        out.push_str(&path.to_string_lossy());
                    }
                    Piece::FileType => out.push_str(&file.file_type),
                    Piece::Extension => out.push_str(file.extension().unwrap_or_default()),
                }
            }
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Text(String),
    Index,
    Description,
    Path,
    FileType,
    Extension,
}

fn parse_template(template: &str) -> Result<Vec<Piece>, FormatError> {
    let mut pieces = Vec::new();
    let mut text = String::new();
    let mut chars = template.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            text.push(c);
            continue;
        }
        let placeholder = match chars.next() {
            Some('\\') => {
                text.push('\\');
                continue;
            }
            Some('i') => Piece::Index,
            Some('d') => Piece::Description,
            Some('p') => Piece::Path,
            Some('f') => Piece::FileType,
            Some('x') => Piece::Extension,
            Some(other) => {
                return Err(FormatError::new(format!(
                    "unknown placeholder '\\{}' in file link template",
                    other
                )));
            }
            None => {
                return Err(FormatError::new(
                    "file link template ends with a backslash",
                ));
            }
        };
        if !text.is_empty() {
            pieces.push(Piece::Text(std::mem::take(&mut text)));
        }
        pieces.push(placeholder);
    }
    if !text.is_empty() {
        pieces.push(Piece::Text(text));
    }
    Ok(pieces)
}

/// Locate an attached file.
///
/// Online links are returned as declared. Absolute paths are checked
/// directly; relative paths are tried against each of `directories` in
/// order. The first existing candidate wins, reported as its real absolute
/// path. When nothing exists the declared path is returned.
pub fn resolve_linked_path(
    file: &LinkedFile,
    directories: &[PathBuf],
    locator: &dyn PathLocator,
) -> PathBuf {
    if file.is_online() {
        return file.path.clone();
    }

    let declared: &Path = &file.path;
    let located = if declared.is_absolute() {
        locator.locate(declared)
    } else {
        directories
            .iter()
            .find_map(|dir| locator.locate(&dir.join(declared)))
    };

    located.unwrap_or_else(|| {
        tracing::debug!(
            path = %declared.display(),
            directories = directories.len(),
            "Attached file not found"
        );
        file.path.clone()
    })
}
