/*
 * files.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Attached-file descriptors.
//!
//! The `file` field lists attachments as `description:path:type` triples
//! separated by `;`. A backslash escapes `:`, `;` and itself. A descriptor
//! with a single part is just a path.

use std::path::{Path, PathBuf};

/// One attached file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedFile {
    pub description: String,
    /// The path as declared, usually relative to one of the file directories.
    pub path: PathBuf,
    pub file_type: String,
}

impl LinkedFile {
    pub fn new(
        description: impl Into<String>,
        path: impl Into<PathBuf>,
        file_type: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            path: path.into(),
            file_type: file_type.into(),
        }
    }

    /// Whether the declared path is a URL rather than a file on disk.
    pub fn is_online(&self) -> bool {
        let path = self.path.to_string_lossy();
        ["http://", "https://", "ftp://", "www."]
            .iter()
            .any(|prefix| path.starts_with(prefix))
    }

    /// File extension of the declared path, without the dot.
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.path).extension().and_then(|e| e.to_str())
    }

    /// Serialize back to the `file` field format.
    pub fn to_field_value(&self) -> String {
        format!(
            "{}:{}:{}",
            escape(&self.description),
            escape(&self.path.to_string_lossy()),
            escape(&self.file_type)
        )
    }
}

/// Parse the value of a `file` field into descriptors.
///
/// Empty descriptors (e.g. from a trailing `;`) are skipped.
pub fn parse_file_field(value: &str) -> Vec<LinkedFile> {
    let mut files = Vec::new();
    let mut parts: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) => current.push(escaped),
                None => current.push('\\'),
            },
            ':' => parts.push(std::mem::take(&mut current)),
            ';' => {
                parts.push(std::mem::take(&mut current));
                if let Some(file) = descriptor(std::mem::take(&mut parts)) {
                    files.push(file);
                }
            }
            _ => current.push(c),
        }
    }
    parts.push(current);
    if let Some(file) = descriptor(parts) {
        files.push(file);
    }
    files
}

fn descriptor(mut parts: Vec<String>) -> Option<LinkedFile> {
    if parts.iter().all(|p| p.trim().is_empty()) {
        return None;
    }
    if parts.len() == 1 {
        return Some(LinkedFile::new("", parts.remove(0).trim(), ""));
    }
    // URLs contain a scheme colon: "desc:https://x:PDF" splits into four parts
    if parts.len() > 3 {
        let file_type = parts.pop().unwrap_or_default();
        let description = parts.remove(0);
        return Some(LinkedFile::new(description, parts.join(":"), file_type));
    }
    let mut parts = parts.into_iter();
    let description = parts.next().unwrap_or_default();
    let path = parts.next().unwrap_or_default();
    let file_type = parts.next().unwrap_or_default();
    Some(LinkedFile::new(description, path, file_type))
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | ':' | ';') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_descriptor() {
        let files = parse_file_field("Test file:encrypted.pdf:PDF");
        assert_eq!(
            files,
            vec![LinkedFile::new("Test file", "encrypted.pdf", "PDF")]
        );
    }

    #[test]
    fn test_multiple_descriptors() {
        let files = parse_file_field("A:a.pdf:PDF;B:b.ps:PostScript;");
        assert_eq!(files.len(), 2);
        assert_eq!(files[1].description, "B");
        assert_eq!(files[1].extension(), Some("ps"));
    }

    #[test]
    fn test_bare_path() {
        let files = parse_file_field("papers/x.pdf");
        assert_eq!(files, vec![LinkedFile::new("", "papers/x.pdf", "")]);
    }

    #[test]
    fn test_escaped_separators() {
        let files = parse_file_field(r"Notes\: draft:C\:\\docs\\a.pdf:PDF");
        assert_eq!(files[0].description, "Notes: draft");
        assert_eq!(files[0].path, PathBuf::from(r"C:\docs\a.pdf"));
    }

    #[test]
    fn test_url_descriptor() {
        let files = parse_file_field("Online:https://example.org/a.pdf:PDF");
        assert_eq!(files[0].path, PathBuf::from("https://example.org/a.pdf"));
        assert_eq!(files[0].file_type, "PDF");
        assert!(files[0].is_online());
    }

    #[test]
    fn test_field_value_roundtrip() {
        let file = LinkedFile::new("a:b", "dir;x/f.pdf", "PDF");
        assert_eq!(parse_file_field(&file.to_field_value()), vec![file]);
    }

    #[test]
    fn test_empty_value() {
        assert!(parse_file_field("").is_empty());
        assert!(parse_file_field(";;").is_empty());
    }
}
