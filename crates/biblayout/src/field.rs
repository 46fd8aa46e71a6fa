/*
 * field.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Field resolution.
//!
//! Layouts reference stored fields (`\author`) and a few computed
//! pseudo-fields:
//!
//! - `\bibtextype`, `\entrytype`: display name of the entry type
//! - `\bibtexkey`, `\citationkey`: the citation key
//!
//! Stored values are expanded through the macro table before use.

use biblayout_model::{Entry, MacroTable};
use std::borrow::Cow;

/// Fields computed from the entry instead of read from its field map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoField {
    EntryType,
    CitationKey,
}

impl PseudoField {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "bibtextype" | "entrytype" => Some(PseudoField::EntryType),
            "bibtexkey" | "citationkey" => Some(PseudoField::CitationKey),
            _ => None,
        }
    }

    fn value(self, entry: &Entry) -> Option<&str> {
        match self {
            PseudoField::EntryType => Some(entry.entry_type().display_name()),
            PseudoField::CitationKey => entry.citation_key(),
        }
    }
}

/// Resolve `name` on `entry`.
///
/// Returns `None` when the field is absent. Stored values come back with
/// their macro references expanded.
pub fn resolve_field<'e>(entry: &'e Entry, name: &str, macros: &MacroTable) -> Option<Cow<'e, str>> {
    if let Some(pseudo) = PseudoField::from_name(name) {
        return pseudo.value(entry).map(Cow::Borrowed);
    }
    entry.field(name).map(|raw| macros.resolve(raw))
}

/// Whether `name` resolves to a value on `entry`. Used by conditionals.
pub fn is_field_present(entry: &Entry, name: &str) -> bool {
    match PseudoField::from_name(name) {
        Some(pseudo) => pseudo.value(entry).is_some(),
        None => entry.has_field(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biblayout_model::EntryType;

    #[test]
    fn test_stored_field_with_macros() {
        let mut macros = MacroTable::new();
        macros.add("DSP", "Digital Signal Processing").unwrap();
        let entry = Entry::new(EntryType::Article).with_field("journal", "#DSP# Letters");

        let value = resolve_field(&entry, "journal", &macros).unwrap();
        assert_eq!(value, "Digital Signal Processing Letters");
    }

    #[test]
    fn test_absent_and_empty_fields() {
        let macros = MacroTable::new();
        let entry = Entry::new(EntryType::Misc).with_field("note", "");

        assert_eq!(resolve_field(&entry, "note", &macros).as_deref(), Some(""));
        assert_eq!(resolve_field(&entry, "year", &macros), None);
        assert!(is_field_present(&entry, "note"));
        assert!(!is_field_present(&entry, "year"));
    }

    #[test]
    fn test_entry_type_pseudo_field() {
        let macros = MacroTable::new();
        let article = Entry::new(EntryType::Article);
        let custom = Entry::new(EntryType::parse("unknown"));

        assert_eq!(
            resolve_field(&article, "bibtextype", &macros).as_deref(),
            Some("Article")
        );
        assert_eq!(
            resolve_field(&custom, "entrytype", &macros).as_deref(),
            Some("Unknown")
        );
    }

    #[test]
    fn test_citation_key_pseudo_field() {
        let macros = MacroTable::new();
        let keyed = Entry::new(EntryType::Book).with_citation_key("knuth1984");
        let unkeyed = Entry::new(EntryType::Book);

        assert_eq!(
            resolve_field(&keyed, "bibtexkey", &macros).as_deref(),
            Some("knuth1984")
        );
        assert!(is_field_present(&keyed, "citationkey"));
        assert!(!is_field_present(&unkeyed, "bibtexkey"));
    }

    #[test]
    fn test_pseudo_field_names_are_case_insensitive() {
        assert_eq!(
            PseudoField::from_name("BibTeXType"),
            Some(PseudoField::EntryType)
        );
        assert_eq!(PseudoField::from_name("author"), None);
    }
}
