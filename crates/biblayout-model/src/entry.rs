/*
 * entry.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Bibliographic entries.
//!
//! An [`Entry`] maps case-insensitive field names to raw text values. Field
//! values are stored exactly as written, including any `#name#` macro
//! references; expansion is the job of [`crate::MacroTable::resolve`].
//!
//! Entries can be read from JSON:
//!
//! ```json
//! { "type": "article", "key": "doe2020", "fields": { "author": "Joe Doe" } }
//! ```

use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ENTRY_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque, process-unique identity of an entry.
///
/// Two entries with identical content still have different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(u64);

impl EntryId {
    fn next() -> Self {
        EntryId(NEXT_ENTRY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry-{}", self.0)
    }
}

/// The type of a bibliographic entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntryType {
    Article,
    Book,
    Booklet,
    Collection,
    Conference,
    Dataset,
    InBook,
    InCollection,
    InProceedings,
    Manual,
    MastersThesis,
    #[default]
    Misc,
    Online,
    Patent,
    PhdThesis,
    Proceedings,
    Report,
    Software,
    TechReport,
    Thesis,
    Unpublished,
    /// A type outside the standard catalog. The name is kept as written.
    Custom(String),
}

/// Display label used for types outside the standard catalog.
pub const UNKNOWN_TYPE_LABEL: &str = "Unknown";

/// (lowercase name, display label, variant) for every standard type.
const STANDARD_TYPES: &[(&str, &str, EntryType)] = &[
    ("article", "Article", EntryType::Article),
    ("book", "Book", EntryType::Book),
    ("booklet", "Booklet", EntryType::Booklet),
    ("collection", "Collection", EntryType::Collection),
    ("conference", "Conference", EntryType::Conference),
    ("dataset", "Dataset", EntryType::Dataset),
    ("inbook", "InBook", EntryType::InBook),
    ("incollection", "InCollection", EntryType::InCollection),
    ("inproceedings", "InProceedings", EntryType::InProceedings),
    ("manual", "Manual", EntryType::Manual),
    ("mastersthesis", "MastersThesis", EntryType::MastersThesis),
    ("misc", "Misc", EntryType::Misc),
    ("online", "Online", EntryType::Online),
    ("patent", "Patent", EntryType::Patent),
    ("phdthesis", "PhdThesis", EntryType::PhdThesis),
    ("proceedings", "Proceedings", EntryType::Proceedings),
    ("report", "Report", EntryType::Report),
    ("software", "Software", EntryType::Software),
    ("techreport", "TechReport", EntryType::TechReport),
    ("thesis", "Thesis", EntryType::Thesis),
    ("unpublished", "Unpublished", EntryType::Unpublished),
];

impl EntryType {
    /// Parse a type name. Matching is case-insensitive; anything not in the
    /// standard catalog becomes [`EntryType::Custom`].
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        STANDARD_TYPES
            .iter()
            .find(|(standard, _, _)| standard.eq_ignore_ascii_case(name))
            .map_or_else(
                || EntryType::Custom(name.to_string()),
                |(_, _, variant)| variant.clone(),
            )
    }

    /// The lowercase identifier of this type, as written in BibTeX sources.
    pub fn name(&self) -> &str {
        match self {
            EntryType::Custom(name) => name,
            standard => standard.catalog_entry().map_or("", |(name, _)| name),
        }
    }

    /// The human-readable label of this type.
    ///
    /// Custom types all share [`UNKNOWN_TYPE_LABEL`].
    pub fn display_name(&self) -> &str {
        self.catalog_entry()
            .map_or(UNKNOWN_TYPE_LABEL, |(_, label)| label)
    }

    /// Whether this type belongs to the standard catalog.
    pub fn is_standard(&self) -> bool {
        !matches!(self, EntryType::Custom(_))
    }

    fn catalog_entry(&self) -> Option<(&'static str, &'static str)> {
        STANDARD_TYPES
            .iter()
            .find(|(_, _, variant)| variant == self)
            .map(|(name, label, _)| (*name, *label))
    }
}

impl From<String> for EntryType {
    fn from(name: String) -> Self {
        EntryType::parse(&name)
    }
}

impl From<&str> for EntryType {
    fn from(name: &str) -> Self {
        EntryType::parse(name)
    }
}

impl From<EntryType> for String {
    fn from(entry_type: EntryType) -> Self {
        entry_type.name().to_string()
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single bibliographic record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "RawEntry", into = "RawEntry")]
pub struct Entry {
    id: EntryId,
    entry_type: EntryType,
    citation_key: Option<String>,
    /// Keys are lowercase field names.
    fields: BTreeMap<String, String>,
}

/// Equality ignores the opaque id.
impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.entry_type == other.entry_type
            && self.citation_key == other.citation_key
            && self.fields == other.fields
    }
}

impl Eq for Entry {}

impl Entry {
    /// Create an empty entry of the given type.
    pub fn new(entry_type: EntryType) -> Self {
        Self {
            id: EntryId::next(),
            entry_type,
            citation_key: None,
            fields: BTreeMap::new(),
        }
    }

    /// Builder form of [`Entry::set_field`].
    pub fn with_field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_field(name, value);
        self
    }

    /// Builder form of [`Entry::set_citation_key`].
    pub fn with_citation_key(mut self, key: impl Into<String>) -> Self {
        self.set_citation_key(key);
        self
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn entry_type(&self) -> &EntryType {
        &self.entry_type
    }

    pub fn set_entry_type(&mut self, entry_type: EntryType) {
        self.entry_type = entry_type;
    }

    pub fn citation_key(&self) -> Option<&str> {
        self.citation_key.as_deref()
    }

    pub fn set_citation_key(&mut self, key: impl Into<String>) {
        self.citation_key = Some(key.into());
    }

    /// Get the raw (unexpanded) value of a field.
    ///
    /// Returns `None` when the field is absent. A present field may still
    /// hold the empty string.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(&normalize_field_name(name)).map(String::as_str)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(&normalize_field_name(name))
    }

    /// Set a field, replacing any previous value. Returns the old value.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) -> Option<String> {
        self.fields.insert(normalize_field_name(name), value.into())
    }

    /// Remove a field. Returns the removed value.
    pub fn clear_field(&mut self, name: &str) -> Option<String> {
        self.fields.remove(&normalize_field_name(name))
    }

    /// Iterate over `(name, raw value)` pairs in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Decode a JSON array of entries.
    pub fn list_from_json(source: &str) -> ModelResult<Vec<Entry>> {
        serde_json::from_str(source).map_err(|e| ModelError::InvalidEntry {
            message: e.to_string(),
        })
    }
}

fn normalize_field_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Serialized shape of an entry.
#[derive(Debug, Serialize, Deserialize)]
struct RawEntry {
    #[serde(rename = "type", default)]
    entry_type: EntryType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    #[serde(default)]
    fields: BTreeMap<String, String>,
}

impl From<RawEntry> for Entry {
    fn from(raw: RawEntry) -> Self {
        let mut entry = Entry::new(raw.entry_type);
        entry.citation_key = raw.key;
        for (name, value) in raw.fields {
            entry.set_field(&name, value);
        }
        entry
    }
}

impl From<Entry> for RawEntry {
    fn from(entry: Entry) -> Self {
        RawEntry {
            entry_type: entry.entry_type,
            key: entry.citation_key,
            fields: entry.fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_entry_type_parse_is_case_insensitive() {
        assert_eq!(EntryType::parse("Article"), EntryType::Article);
        assert_eq!(EntryType::parse("INPROCEEDINGS"), EntryType::InProceedings);
        assert_eq!(
            EntryType::parse("video"),
            EntryType::Custom("video".to_string())
        );
    }

    #[test]
    fn test_entry_type_display_names() {
        assert_eq!(EntryType::Article.display_name(), "Article");
        assert_eq!(EntryType::Misc.display_name(), "Misc");
        assert_eq!(EntryType::PhdThesis.display_name(), "PhdThesis");
        assert_eq!(EntryType::parse("unknown").display_name(), "Unknown");
        assert_eq!(EntryType::parse("video").display_name(), "Unknown");
    }

    #[test]
    fn test_entry_type_name_roundtrip() {
        for (name, label, variant) in STANDARD_TYPES {
            assert_eq!(EntryType::parse(name), *variant);
            assert_eq!(EntryType::parse(&name.to_uppercase()), *variant);
            assert_eq!(variant.name(), *name);
            assert_eq!(variant.display_name(), *label);
        }
        assert_eq!(EntryType::parse("Video").name(), "Video");
    }

    #[test]
    fn test_field_names_are_case_insensitive() {
        let entry = Entry::new(EntryType::Article).with_field("Author", "Joe Doe");
        assert_eq!(entry.field("author"), Some("Joe Doe"));
        assert_eq!(entry.field("AUTHOR"), Some("Joe Doe"));
        assert!(entry.has_field("aUtHoR"));
    }

    #[test]
    fn test_absent_field_differs_from_empty() {
        let entry = Entry::new(EntryType::Misc).with_field("note", "");
        assert_eq!(entry.field("note"), Some(""));
        assert_eq!(entry.field("year"), None);
    }

    #[test]
    fn test_set_and_clear_field() {
        let mut entry = Entry::new(EntryType::Book);
        assert_eq!(entry.set_field("year", "2001"), None);
        assert_eq!(entry.set_field("year", "2002"), Some("2001".to_string()));
        assert_eq!(entry.clear_field("YEAR"), Some("2002".to_string()));
        assert!(!entry.has_field("year"));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Entry::new(EntryType::Misc);
        let b = Entry::new(EntryType::Misc);
        assert_ne!(a.id(), b.id());
        // Content equality ignores identity
        assert_eq!(a, b);
    }

    #[test]
    fn test_list_from_json() {
        let entries = Entry::list_from_json(
            r#"[
                {"type": "article", "key": "doe2020", "fields": {"Author": "Joe Doe", "year": "2020"}},
                {"type": "video"}
            ]"#,
        )
        .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].entry_type(), &EntryType::Article);
        assert_eq!(entries[0].citation_key(), Some("doe2020"));
        assert_eq!(entries[0].field("author"), Some("Joe Doe"));
        assert_eq!(entries[1].entry_type().display_name(), "Unknown");
        assert_eq!(entries[1].fields().count(), 0);
    }

    #[test]
    fn test_list_from_json_rejects_garbage() {
        let err = Entry::list_from_json("{not json").unwrap_err();
        assert!(matches!(err, ModelError::InvalidEntry { .. }));
    }
}
