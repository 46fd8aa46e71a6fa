/*
 * formatters/names.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! `NameFormatter`: reformat an author or editor list.
//!
//! The formatter is driven by a name-format specification made of cases
//! separated by `@@`. Each case reads
//!
//! ```text
//! count@range@pattern[@range@pattern...]
//! ```
//!
//! The first case whose `count` (`*` or a number) matches the number of
//! names is used. Within it, each name is rendered with the pattern of the
//! first `range` (`*`, `n` or `a..b`, negative values counting from the end)
//! that contains the name's 1-based position.
//!
//! Patterns follow BibTeX's `format.name$`: text outside braces is copied;
//! a brace group such as `{ff }` or `{, jj}` renders one name part (`f`
//! first, `v` von, `l` last, `j` jr), in full when the letter is doubled and
//! as initials otherwise, surrounded by the group's text. A nested brace
//! (`{ff{-}}`) overrides the separator between tokens. Groups whose part is
//! empty render nothing.

use super::LayoutFormatter;
use crate::context::RenderContext;
use crate::error::FormatError;

/// Specification used when neither the formatter nor the call supplies one.
pub const DEFAULT_NAME_FORMAT: &str =
    "1@*@{ff }{vv }{ll}{, jj}@@*@1@{ff }{vv }{ll}{, jj}@*@, {ff }{vv }{ll}{, jj}";

/// Name-list formatter.
///
/// The specification is taken from the call argument if present, else from
/// the formatter's own format, else [`DEFAULT_NAME_FORMAT`].
#[derive(Debug, Clone, Default)]
pub struct NameFormatter {
    format: Option<String>,
}

impl NameFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Formatter bound to a fixed specification.
    pub fn with_format(format: impl Into<String>) -> Self {
        Self {
            format: Some(format.into()),
        }
    }

    pub fn format_spec(&self) -> &str {
        self.format.as_deref().unwrap_or(DEFAULT_NAME_FORMAT)
    }
}

impl LayoutFormatter for NameFormatter {
    fn format(
        &self,
        input: &str,
        argument: Option<&str>,
        _context: &RenderContext<'_>,
    ) -> Result<String, FormatError> {
        let spec = NameFormatSpec::parse(argument.unwrap_or_else(|| self.format_spec()))?;
        Ok(spec.apply(input))
    }
}

/// A parsed name-format specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameFormatSpec {
    cases: Vec<Case>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Case {
    count: Count,
    rules: Vec<(NameRange, Pattern)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Count {
    Any,
    Exactly(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameRange {
    All,
    /// Inclusive bounds, 1-based; negative values count from the end.
    Span(i64, i64),
}

impl NameRange {
    fn contains(self, position: usize, total: usize) -> bool {
        match self {
            NameRange::All => true,
            NameRange::Span(a, b) => {
                let resolve = |v: i64| if v < 0 { total as i64 + 1 + v } else { v };
                let (a, b) = (resolve(a), resolve(b));
                let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                (lo..=hi).contains(&(position as i64))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Pattern {
    pieces: Vec<Piece>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Group(Group),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Group {
    part: Part,
    full: bool,
    pre: String,
    post: String,
    separator: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    First,
    Von,
    Last,
    Jr,
}

impl Part {
    fn from_letter(c: char) -> Option<Self> {
        match c {
            'f' => Some(Part::First),
            'v' => Some(Part::Von),
            'l' => Some(Part::Last),
            'j' => Some(Part::Jr),
            _ => None,
        }
    }
}

impl NameFormatSpec {
    pub fn parse(spec: &str) -> Result<Self, FormatError> {
        let cases = spec
            .split("@@")
            .map(parse_case)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { cases })
    }

    /// Reformat the name list `names`.
    ///
    /// The input is returned unchanged when no case matches its name count.
    pub fn apply(&self, input: &str) -> String {
        let names = split_names(input);
        if names.is_empty() {
            return String::new();
        }

        let Some(case) = self.cases.iter().find(|case| match case.count {
            Count::Any => true,
            Count::Exactly(n) => n == names.len(),
        }) else {
            return input.to_string();
        };

        let mut out = String::new();
        for (index, name) in names.iter().enumerate() {
            let person = PersonName::parse(name);
            if let Some((_, pattern)) = case
                .rules
                .iter()
                .find(|(range, _)| range.contains(index + 1, names.len()))
            {
                pattern.render(&person, &mut out);
            }
        }
        out
    }
}

fn parse_case(case: &str) -> Result<Case, FormatError> {
    let pieces: Vec<&str> = case.split('@').collect();
    if pieces.len() < 3 || pieces.len() % 2 == 0 {
        return Err(FormatError::new(format!(
            "name format case '{}' must read count@range@pattern",
            case
        )));
    }

    let count = match pieces[0].trim() {
        "*" => Count::Any,
        n => match n.parse::<usize>() {
            Ok(n) if n > 0 => Count::Exactly(n),
            _ => {
                return Err(FormatError::new(format!("invalid name count '{}'", n)));
            }
        },
    };

    let rules = pieces[1..]
        .chunks(2)
        .map(|pair| Ok((parse_range(pair[0])?, parse_pattern(pair[1])?)))
        .collect::<Result<Vec<_>, FormatError>>()?;

    Ok(Case { count, rules })
}

fn parse_range(range: &str) -> Result<NameRange, FormatError> {
    let range = range.trim();
    if range == "*" {
        return Ok(NameRange::All);
    }
    let bound = |text: &str| match text.trim().parse::<i64>() {
        Ok(v) if v != 0 => Ok(v),
        _ => Err(FormatError::new(format!("invalid name range '{}'", range))),
    };
    match range.split_once("..") {
        Some((a, b)) => Ok(NameRange::Span(bound(a)?, bound(b)?)),
        None => {
            let v = bound(range)?;
            Ok(NameRange::Span(v, v))
        }
    }
}

fn parse_pattern(pattern: &str) -> Result<Pattern, FormatError> {
    let mut pieces = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.char_indices();

    while let Some((start, c)) = chars.next() {
        match c {
            '{' => {
                let mut depth = 0usize;
                let mut end = None;
                for (i, c) in chars.by_ref() {
                    match c {
                        '{' => depth += 1,
                        '}' if depth == 0 => {
                            end = Some(i);
                            break;
                        }
                        '}' => depth -= 1,
                        _ => {}
                    }
                }
                let end = end.ok_or_else(|| {
                    FormatError::new(format!("unbalanced braces in name pattern '{}'", pattern))
                })?;
                if !literal.is_empty() {
                    pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                }
                pieces.push(Piece::Group(parse_group(&pattern[start + 1..end], pattern)?));
            }
            '}' => {
                return Err(FormatError::new(format!(
                    "unbalanced braces in name pattern '{}'",
                    pattern
                )));
            }
            _ => literal.push(c),
        }
    }
    if !literal.is_empty() {
        pieces.push(Piece::Literal(literal));
    }
    Ok(Pattern { pieces })
}

/// Parse the inside of a `{...}` group: `pre` text, part letters, an
/// optional `{separator}`, then `post` text.
fn parse_group(group: &str, pattern: &str) -> Result<Group, FormatError> {
    let letter_at = group
        .find(|c: char| c.is_alphabetic())
        .ok_or_else(|| FormatError::new(format!("group '{{{}}}' has no name part", group)))?;
    let (pre, rest) = group.split_at(letter_at);
    if pre.contains(['{', '}']) {
        return Err(FormatError::new(format!(
            "unexpected brace in name pattern '{}'",
            pattern
        )));
    }

    let mut chars = rest.chars();
    let letter = chars.next().unwrap_or_default();
    let part = Part::from_letter(letter).ok_or_else(|| {
        FormatError::new(format!("unknown name part '{}' in '{}'", letter, pattern))
    })?;
    let mut rest = chars.as_str();
    let full = rest.starts_with(letter);
    if full {
        rest = &rest[letter.len_utf8()..];
    }

    let mut separator = None;
    if let Some(inner) = rest.strip_prefix('{') {
        let close = inner.find('}').ok_or_else(|| {
            FormatError::new(format!("unbalanced braces in name pattern '{}'", pattern))
        })?;
        separator = Some(inner[..close].to_string());
        rest = &inner[close + 1..];
    }
    if rest.contains(['{', '}']) {
        return Err(FormatError::new(format!(
            "unexpected brace in name pattern '{}'",
            pattern
        )));
    }

    Ok(Group {
        part,
        full,
        pre: pre.to_string(),
        post: rest.to_string(),
        separator,
    })
}

impl Pattern {
    fn render(&self, name: &PersonName, out: &mut String) {
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Group(group) => {
                    let tokens = name.part(group.part);
                    if tokens.is_empty() {
                        continue;
                    }
                    let rendered: Vec<String> = if group.full {
                        tokens.iter().map(|t| strip_braces(t)).collect()
                    } else {
                        tokens
                            .iter()
                            .filter_map(|t| strip_braces(t).chars().find(|c| c.is_alphabetic()))
                            .map(String::from)
                            .collect()
                    };
                    let separator = group
                        .separator
                        .as_deref()
                        .unwrap_or(if group.full { " " } else { ". " });
                    out.push_str(&group.pre);
                    out.push_str(&rendered.join(separator));
                    out.push_str(&group.post);
                }
            }
        }
    }
}

/// A personal name split into its BibTeX parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PersonName {
    first: Vec<String>,
    von: Vec<String>,
    last: Vec<String>,
    jr: Vec<String>,
}

impl PersonName {
    fn parse(name: &str) -> Self {
        let parts = split_top_level(name, |c| c == ',');
        let parts: Vec<Vec<String>> = parts.iter().map(|p| words(p)).collect();

        match parts.as_slice() {
            [] => Self::default(),
            [single] => Self::parse_first_von_last(single),
            [von_last, first] => Self {
                first: first.clone(),
                ..Self::parse_von_last(von_last)
            },
            [von_last, jr, first, ..] => Self {
                first: first.clone(),
                jr: jr.clone(),
                ..Self::parse_von_last(von_last)
            },
        }
    }

    /// `First von Last`
    fn parse_first_von_last(words: &[String]) -> Self {
        let Some((last_word, rest)) = words.split_last() else {
            return Self::default();
        };
        match rest.iter().position(|w| is_von_word(w)) {
            Some(von_start) => {
                let von_end = rest.iter().rposition(|w| is_von_word(w)).unwrap_or(von_start) + 1;
                let mut last = rest[von_end..].to_vec();
                last.push(last_word.clone());
                Self {
                    first: rest[..von_start].to_vec(),
                    von: rest[von_start..von_end].to_vec(),
                    last,
                    jr: Vec::new(),
                }
            }
            None => Self {
                first: rest.to_vec(),
                last: vec![last_word.clone()],
                ..Self::default()
            },
        }
    }

    /// `von Last`, the part before the first comma.
    fn parse_von_last(words: &[String]) -> Self {
        let keep = words.len().saturating_sub(1);
        let von_len = words[..keep]
            .iter()
            .rposition(|w| is_von_word(w))
            .map_or(0, |i| i + 1);
        Self {
            von: words[..von_len].to_vec(),
            last: words[von_len..].to_vec(),
            ..Self::default()
        }
    }

    fn part(&self, part: Part) -> &[String] {
        match part {
            Part::First => &self.first,
            Part::Von => &self.von,
            Part::Last => &self.last,
            Part::Jr => &self.jr,
        }
    }
}

fn is_von_word(word: &str) -> bool {
    word.chars().next().is_some_and(|c| c.is_lowercase())
}

fn strip_braces(token: &str) -> String {
    token.chars().filter(|c| !matches!(c, '{' | '}')).collect()
}

/// Split a name list on `and` (any case) outside braces.
fn split_names(list: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut current: Vec<String> = Vec::new();
    for word in words(list) {
        if word.eq_ignore_ascii_case("and") {
            if !current.is_empty() {
                names.push(current.join(" "));
            }
            current.clear();
        } else {
            current.push(word);
        }
    }
    if !current.is_empty() {
        names.push(current.join(" "));
    }
    names
}

/// Whitespace-separated words, keeping brace groups intact.
fn words(text: &str) -> Vec<String> {
    split_top_level(text, char::is_whitespace)
        .into_iter()
        .filter(|w| !w.is_empty())
        .collect()
}

/// Split `text` at characters matching `is_separator` outside braces,
/// trimming each piece.
fn split_top_level(text: &str, is_separator: impl Fn(char) -> bool) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            c if depth == 0 && is_separator(c) => {
                pieces.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    let last = current.trim();
    if !last.is_empty() || !pieces.is_empty() {
        pieces.push(last.to_string());
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn apply(spec: &str, names: &str) -> String {
        NameFormatSpec::parse(spec).unwrap().apply(names)
    }

    fn default_format(names: &str) -> String {
        NameFormatter::new()
            .format(names, None, &RenderContext::default())
            .unwrap()
    }

    #[test]
    fn test_default_format() {
        assert_eq!(default_format("Joe Doe and Jane, Moon"), "Joe Doe, Moon Jane");
        assert_eq!(default_format("Donald E. Knuth"), "Donald E. Knuth");
        assert_eq!(default_format("A B and C D and E F"), "A B, C D, E F");
    }

    #[test]
    fn test_von_and_jr_parts() {
        assert_eq!(default_format("Ludwig van Beethoven"), "Ludwig van Beethoven");
        assert_eq!(default_format("van Beethoven, Ludwig"), "Ludwig van Beethoven");
        assert_eq!(default_format("Ford, Jr., Henry"), "Henry Ford, Jr.");
    }

    #[test]
    fn test_count_specific_cases() {
        let spec = "1@*@{ll}@@2@1..1@{ff}{ll}@2..2@ and {ff}{l}@@*@*@more";
        assert_eq!(apply(spec, "Joe Doe and Mary Jane"), "JoeDoe and MaryJ");
        assert_eq!(apply(spec, "Joe Doe"), "Doe");
        assert_eq!(apply(spec, "A B and C D and E F"), "moremoremore");
    }

    #[test]
    fn test_initials_and_separators() {
        assert_eq!(apply("*@*@{f. }{ll}", "Donald Ervin Knuth"), "D. E. Knuth");
        assert_eq!(apply("*@*@{ff{-}} {ll}", "Jean Paul Sartre"), "Jean-Paul Sartre");
        assert_eq!(apply("*@*@{l{}}", "Jean Paul Sartre"), "S");
    }

    #[test]
    fn test_negative_ranges() {
        assert_eq!(apply("*@-1@{ll}", "A B and C D and E F"), "F");
        assert_eq!(apply("*@1..-2@{ll};", "A B and C D and E F"), "B;D;");
        assert_eq!(apply("*@-1..1@{ll};", "A B and C D"), "B;D;");
    }

    #[test]
    fn test_no_matching_case_passes_through() {
        assert_eq!(apply("1@*@{ll}", "Joe Doe and Mary Jane"), "Joe Doe and Mary Jane");
    }

    #[test]
    fn test_and_is_case_insensitive_and_brace_aware() {
        assert_eq!(apply("*@*@{ll};", "Joe Doe AND Mary Jane"), "Doe;Jane;");
        assert_eq!(
            apply("*@*@{ll};", "{Barnes and Noble} and Jane Roe"),
            "Barnes and Noble;Roe;"
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(default_format(""), "");
        assert_eq!(default_format("   "), "");
    }

    #[test]
    fn test_argument_overrides_default() {
        let formatted = NameFormatter::new()
            .format("Joe Doe", Some("*@*@{ll}, {f.}"), &RenderContext::default())
            .unwrap();
        assert_eq!(formatted, "Doe, J.");
    }

    #[test]
    fn test_malformed_specs() {
        for spec in [
            "1@*",
            "1@*@{ll}@2",
            "x@*@{ll}",
            "0@*@{ll}",
            "1@0@{ll}",
            "1@a..b@{ll}",
            "1@*@{q}",
            "1@*@{ll",
            "1@*@ll}",
            "1@*@{, }",
        ] {
            assert!(NameFormatSpec::parse(spec).is_err(), "{} should be rejected", spec);
        }
    }
}
