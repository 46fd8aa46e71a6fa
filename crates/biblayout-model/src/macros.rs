/*
 * macros.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Macro tables and `#name#` resolution.
//!
//! Field values may reference named text fragments with `#name#`. A
//! [`MacroTable`] stores those fragments and expands references inside a
//! string. Macro values may reference other macros; expansion follows them
//! recursively.
//!
//! Resolution always terminates. The names currently being expanded are
//! tracked on the active path; a reference back to one of them is replaced
//! by the bare name instead of being expanded again. With `A = #B#` and
//! `B = #A#`, resolving `#A#` yields `A`.
//!
//! References that cannot be resolved are left alone: unknown names, empty
//! names (`##`) and a trailing unmatched `#` are copied verbatim.

use crate::entry::Entry;
use crate::error::{ModelError, ModelResult};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Character that opens and closes a macro reference.
pub const MACRO_DELIMITER: char = '#';

/// Full month names for the standard three-letter month macros.
const MONTHS: &[(&str, &str)] = &[
    ("jan", "January"),
    ("feb", "February"),
    ("mar", "March"),
    ("apr", "April"),
    ("may", "May"),
    ("jun", "June"),
    ("jul", "July"),
    ("aug", "August"),
    ("sep", "September"),
    ("oct", "October"),
    ("nov", "November"),
    ("dec", "December"),
];

/// A named text fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macro {
    name: String,
    value: String,
}

impl Macro {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// The name as it was defined (original case).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw value, possibly containing further references.
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// A set of macros keyed by case-insensitive name.
#[derive(Debug, Clone, Default)]
pub struct MacroTable {
    /// Keys are lowercase macro names.
    macros: BTreeMap<String, Macro>,
}

impl MacroTable {
    pub const fn new() -> Self {
        Self {
            macros: BTreeMap::new(),
        }
    }

    /// Define a new macro.
    ///
    /// Fails with [`ModelError::MacroCollision`] when a macro with the same
    /// name (ignoring case) already exists.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) -> ModelResult<()> {
        let name = name.into();
        let key = name.to_lowercase();
        if self.macros.contains_key(&key) {
            return Err(ModelError::MacroCollision { name });
        }
        self.macros.insert(key, Macro::new(name, value));
        Ok(())
    }

    /// Define or redefine a macro. Returns the previous definition.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<Macro> {
        let name = name.into();
        self.macros.insert(name.to_lowercase(), Macro::new(name, value))
    }

    pub fn remove(&mut self, name: &str) -> Option<Macro> {
        self.macros.remove(&name.to_lowercase())
    }

    pub fn get(&self, name: &str) -> Option<&Macro> {
        self.macros.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.macros.contains_key(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    /// Iterate over all macros, ordered by lowercase name.
    pub fn iter(&self) -> impl Iterator<Item = &Macro> {
        self.macros.values()
    }

    /// Expand every `#name#` reference in `text`.
    ///
    /// Text without a delimiter is returned borrowed and unchanged.
    pub fn resolve<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if !text.contains(MACRO_DELIMITER) {
            return Cow::Borrowed(text);
        }
        Cow::Owned(Resolution::new(self).run(None, text))
    }

    /// Fully expand a single macro by name.
    ///
    /// Returns `None` when the name is neither defined nor a standard month.
    /// When the macro sits on a cycle, the cycle is cut where it returns to
    /// `name`, so the result is `name` itself for a pure cycle.
    pub fn resolve_name(&self, name: &str) -> Option<String> {
        let mut resolution = Resolution::new(self);
        match resolution.step(name) {
            Step::Verbatim => None,
            Step::Done(value) => Some(value),
            Step::Enter(key, value) => Some(resolution.run(Some(key), value)),
        }
    }

    /// Macros referenced by the fields of `entries`, directly or through
    /// other macros, in name order.
    pub fn used_macros<'e>(&self, entries: impl IntoIterator<Item = &'e Entry>) -> Vec<&Macro> {
        let mut pending: Vec<String> = Vec::new();
        for entry in entries {
            for (_, value) in entry.fields() {
                pending.extend(references(value).map(str::to_lowercase));
            }
        }

        let mut used = BTreeSet::new();
        while let Some(key) = pending.pop() {
            if used.contains(&key) {
                continue;
            }
            if let Some(found) = self.macros.get(&key) {
                pending.extend(references(&found.value).map(str::to_lowercase));
                used.insert(key);
            }
        }

        used.iter().filter_map(|key| self.macros.get(key)).collect()
    }
}

/// Look up a standard month abbreviation.
fn month_name(label: &str) -> Option<&'static str> {
    MONTHS
        .iter()
        .find(|(short, _)| short.eq_ignore_ascii_case(label))
        .map(|(_, full)| *full)
}

/// A piece of text split at macro delimiters.
#[derive(Debug, PartialEq)]
enum Segment<'a> {
    /// Plain text between references.
    Text(&'a str),
    /// The label between a pair of delimiters (may be empty).
    Reference(&'a str),
    /// A delimiter with no closing partner, and everything after it.
    Unterminated(&'a str),
}

struct Segments<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Segment<'a>> {
        if self.rest.is_empty() {
            return None;
        }
        let Some(open) = self.rest.find(MACRO_DELIMITER) else {
            let text = self.rest;
            self.rest = "";
            return Some(Segment::Text(text));
        };
        if open > 0 {
            let text = &self.rest[..open];
            self.rest = &self.rest[open..];
            return Some(Segment::Text(text));
        }
        let after = &self.rest[MACRO_DELIMITER.len_utf8()..];
        match after.find(MACRO_DELIMITER) {
            Some(close) => {
                let label = &after[..close];
                self.rest = &after[close + MACRO_DELIMITER.len_utf8()..];
                Some(Segment::Reference(label))
            }
            None => {
                let text = self.rest;
                self.rest = "";
                Some(Segment::Unterminated(text))
            }
        }
    }
}

fn segments(text: &str) -> Segments<'_> {
    Segments { rest: text }
}

/// Non-empty labels referenced in `text`.
fn references(text: &str) -> impl Iterator<Item = &str> {
    segments(text).filter_map(|segment| match segment {
        Segment::Reference(label) if !label.is_empty() => Some(label),
        _ => None,
    })
}

/// Outcome of looking up one reference.
enum Step<'s> {
    /// Copy the reference through unchanged.
    Verbatim,
    /// Final text for the reference.
    Done(String),
    /// Expand the macro stored under `key`, whose raw value is given.
    Enter(&'s str, &'s str),
}

/// A macro value (or the top-level text) being expanded.
struct Frame<'s> {
    /// Lowercase name of the macro; `None` for the top-level text.
    key: Option<&'s str>,
    segments: Segments<'s>,
    out: String,
    /// Cut flag of the enclosing expansion, restored when this frame ends.
    outer_cut: bool,
}

/// State of one top-level resolve call.
///
/// Expansion runs on an explicit stack of frames, so nesting depth is
/// bounded by the table size rather than by the thread's stack.
struct Resolution<'s> {
    table: &'s MacroTable,
    /// Lowercase names currently being expanded.
    active: HashSet<&'s str>,
    /// Expansions that never hit a cycle cut; valid for the whole call.
    resolved: HashMap<&'s str, String>,
    /// Set when a cycle was cut somewhere below the current expansion.
    cut: bool,
}

impl<'s> Resolution<'s> {
    fn new(table: &'s MacroTable) -> Self {
        Self {
            table,
            active: HashSet::new(),
            resolved: HashMap::new(),
            cut: false,
        }
    }

    fn step(&mut self, label: &'s str) -> Step<'s> {
        if label.is_empty() {
            return Step::Verbatim;
        }
        let table = self.table;
        let Some((key, found)) = table.macros.get_key_value(&label.to_lowercase()) else {
            return match month_name(label) {
                Some(month) => Step::Done(month.to_string()),
                None => Step::Verbatim,
            };
        };
        let key = key.as_str();

        if self.active.contains(key) {
            tracing::debug!(label, "Stopped at circular macro reference");
            self.cut = true;
            return Step::Done(label.to_string());
        }
        match self.resolved.get(key) {
            Some(done) => Step::Done(done.clone()),
            None => Step::Enter(key, &found.value),
        }
    }

    fn enter(&mut self, key: Option<&'s str>, text: &'s str) -> Frame<'s> {
        if let Some(key) = key {
            self.active.insert(key);
        }
        Frame {
            key,
            segments: segments(text),
            out: String::with_capacity(text.len()),
            outer_cut: std::mem::replace(&mut self.cut, false),
        }
    }

    /// Expand `text`, which is the value of macro `key` when given.
    fn run(&mut self, key: Option<&'s str>, text: &'s str) -> String {
        let root = self.enter(key, text);
        let mut stack = vec![root];

        while let Some(frame) = stack.last_mut() {
            match frame.segments.next() {
                Some(Segment::Text(piece) | Segment::Unterminated(piece)) => {
                    frame.out.push_str(piece);
                }
                Some(Segment::Reference(label)) => match self.step(label) {
                    Step::Verbatim => {
                        frame.out.push(MACRO_DELIMITER);
                        frame.out.push_str(label);
                        frame.out.push(MACRO_DELIMITER);
                    }
                    Step::Done(value) => frame.out.push_str(&value),
                    Step::Enter(key, value) => {
                        let child = self.enter(Some(key), value);
                        stack.push(child);
                    }
                },
                None => {
                    let Some(done) = stack.pop() else { break };
                    if let Some(key) = done.key {
                        self.active.remove(key);
                        if !self.cut {
                            self.resolved.insert(key, done.out.clone());
                        }
                    }
                    self.cut |= done.outer_cut;
                    match stack.last_mut() {
                        Some(parent) => parent.out.push_str(&done.out),
                        None => return done.out,
                    }
                }
            }
        }
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryType;
    use pretty_assertions::assert_eq;

    fn table(definitions: &[(&str, &str)]) -> MacroTable {
        let mut table = MacroTable::new();
        for (name, value) in definitions {
            table.add(*name, *value).unwrap();
        }
        table
    }

    #[test]
    fn test_text_without_delimiter_is_borrowed() {
        let table = table(&[("AAA", "aaa")]);
        let resolved = table.resolve("no macros here");
        assert!(matches!(resolved, Cow::Borrowed(_)));
        assert_eq!(resolved, "no macros here");
    }

    #[test]
    fn test_surrounding_content() {
        let table = table(&[("AAA", "aaa")]);
        assert_eq!(table.resolve("aa#AAA#AAA"), "aaaaaAAA");
    }

    #[test]
    fn test_odd_delimiter_at_end() {
        let table = table(&[("AAA", "aaa")]);
        assert_eq!(table.resolve("AAA#AAA#AAA#"), "AAAaaaAAA#");
    }

    #[test]
    fn test_unknown_name_is_verbatim() {
        let table = table(&[("AAA", "aaa")]);
        assert_eq!(table.resolve("x #BBB# y"), "x #BBB# y");
        // Scanning resumes after the closing delimiter of the unknown name
        assert_eq!(table.resolve("#BBB#AAA#"), "#BBB#AAA#");
    }

    #[test]
    fn test_empty_name_is_verbatim() {
        let table = table(&[("AAA", "aaa")]);
        assert_eq!(table.resolve("a##b"), "a##b");
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let table = table(&[("DSP", "Digital Signal Processing")]);
        assert_eq!(table.resolve("#dsp#"), "Digital Signal Processing");
        assert!(table.contains("Dsp"));
    }

    #[test]
    fn test_nested_macros() {
        let table = table(&[("IEEE", "Institute of #EE#"), ("EE", "Electrical Engineers")]);
        assert_eq!(
            table.resolve("Proc. #IEEE#"),
            "Proc. Institute of Electrical Engineers"
        );
    }

    #[test]
    fn test_two_cycle() {
        let table = table(&[("AAA", "#BBB#"), ("BBB", "#AAA#")]);
        assert_eq!(table.resolve("#AAA#"), "AAA");
        assert_eq!(table.resolve("#BBB#"), "BBB");
    }

    #[test]
    fn test_four_cycle() {
        let table = table(&[
            ("AAA", "#BBB#"),
            ("BBB", "#CCC#"),
            ("CCC", "#DDD#"),
            ("DDD", "#AAA#"),
        ]);
        for name in ["AAA", "BBB", "CCC", "DDD"] {
            assert_eq!(table.resolve(&format!("#{}#", name)), name);
        }
    }

    #[test]
    fn test_self_reference() {
        let table = table(&[("SELF", "x#SELF#y")]);
        assert_eq!(table.resolve("#SELF#"), "xSELFy");
    }

    #[test]
    fn test_cycle_does_not_stop_rest_of_string() {
        let table = table(&[("AAA", "#BBB#"), ("BBB", "#AAA#"), ("CCC", "ccc")]);
        assert_eq!(table.resolve("#AAA# and #CCC#"), "AAA and ccc");
    }

    #[test]
    fn test_cycle_result_depends_on_entry_point() {
        // The memo must not leak a path-dependent expansion between references
        let table = table(&[("AAA", "a#BBB#"), ("BBB", "b#AAA#")]);
        assert_eq!(table.resolve("#AAA#|#BBB#"), "abAAA|baBBB");
    }

    #[test]
    fn test_shared_submacros() {
        // Each level references the next one twice; resolution stays linear
        let mut table = MacroTable::new();
        for level in 0..40 {
            table
                .add(format!("M{}", level), format!("#M{}##M{}#", level + 1, level + 1))
                .unwrap();
        }
        table.add("M40", "x").unwrap();
        assert_eq!(table.resolve_name("M38").unwrap(), "xxxx");
    }

    #[test]
    fn test_long_chain_resolves_without_overflow() {
        const LENGTH: usize = 10_000;
        let mut table = MacroTable::new();
        for i in 0..LENGTH {
            table.add(format!("m{}", i), format!("#m{}#", i + 1)).unwrap();
        }
        table.add(format!("m{}", LENGTH), "end").unwrap();

        assert_eq!(table.resolve("<#m0#>"), "<end>");
        assert_eq!(table.resolve_name("m5000").as_deref(), Some("end"));
    }

    #[test]
    fn test_long_cycle_resolves_without_overflow() {
        const LENGTH: usize = 10_000;
        let mut table = MacroTable::new();
        for i in 0..LENGTH {
            table
                .add(format!("m{}", i), format!("#m{}#", (i + 1) % LENGTH))
                .unwrap();
        }

        assert_eq!(table.resolve("#m0#"), "m0");
    }

    #[test]
    fn test_month_defaults() {
        let empty = MacroTable::new();
        assert_eq!(empty.resolve("#jan#"), "January");
        assert_eq!(empty.resolve("#DEC# 2020"), "December 2020");

        let shadowed = table(&[("jan", "Jan.")]);
        assert_eq!(shadowed.resolve("#jan#"), "Jan.");
    }

    #[test]
    fn test_resolve_name() {
        let table = table(&[("AAA", "#BBB#"), ("BBB", "#AAA#"), ("CCC", "c#DDD#"), ("DDD", "d")]);
        assert_eq!(table.resolve_name("AAA"), Some("AAA".to_string()));
        assert_eq!(table.resolve_name("CCC"), Some("cd".to_string()));
        assert_eq!(table.resolve_name("nope"), None);
    }

    #[test]
    fn test_resolve_is_idempotent_without_cycles() {
        let table = table(&[("A", "x #B# y"), ("B", "z")]);
        let once = table.resolve("#A# and #A#").into_owned();
        assert_eq!(table.resolve(&once), once);
    }

    #[test]
    fn test_add_collision() {
        let mut table = table(&[("DSP", "Digital Signal Processing")]);
        let err = table.add("dsp", "Digital Signal Processor").unwrap_err();
        assert_eq!(
            err,
            ModelError::MacroCollision {
                name: "dsp".to_string()
            }
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_set_and_remove() {
        let mut table = MacroTable::new();
        assert!(table.is_empty());
        assert_eq!(table.set("VLSI", "Very Large"), None);
        let previous = table.set("vlsi", "Very Large Scale Integration").unwrap();
        assert_eq!(previous.value(), "Very Large");
        assert_eq!(table.get("VLSI").unwrap().name(), "vlsi");
        assert!(table.remove("VLSI").is_some());
        assert!(table.is_empty());
    }

    #[test]
    fn test_used_macros_follow_references() {
        let table = table(&[
            ("AAA", "Some other #BBB#"),
            ("BBB", "Some more text"),
            ("CCC", "Even more text"),
        ]);
        let entry = Entry::new(EntryType::Article).with_field("author", "#AAA#");

        let used: Vec<&str> = table
            .used_macros([&entry])
            .into_iter()
            .map(Macro::name)
            .collect();
        assert_eq!(used, vec!["AAA", "BBB"]);
    }

    #[test]
    fn test_used_macros_none() {
        let table = table(&[("AAA", "Some other text")]);
        let entry = Entry::new(EntryType::Article).with_field("author", "Oscar Gustafsson");
        assert!(table.used_macros([&entry]).is_empty());
    }

    #[test]
    fn test_used_macros_with_cycle() {
        let table = table(&[("AAA", "#BBB#"), ("BBB", "#AAA#")]);
        let entry = Entry::new(EntryType::Misc).with_field("note", "#aaa#");
        assert_eq!(table.used_macros([&entry]).len(), 2);
    }

    #[test]
    fn test_segments() {
        let parts: Vec<Segment> = segments("a#b#c#").collect();
        assert_eq!(
            parts,
            vec![
                Segment::Text("a"),
                Segment::Reference("b"),
                Segment::Text("c"),
                Segment::Unterminated("#"),
            ]
        );
    }
}
