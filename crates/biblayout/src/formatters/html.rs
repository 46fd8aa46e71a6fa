/*
 * formatters/html.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! `HTMLChars`: LaTeX-flavoured field text to HTML.

use super::LayoutFormatter;
use crate::context::RenderContext;
use crate::error::FormatError;

/// Converts LaTeX markup and line structure to HTML.
///
/// - `&`, `<`, `>` and `"` are escaped
/// - a single newline becomes `<br>`, a run of two or more becomes `<p>`
/// - accents (`\'e`, `\~{n}`, `\c{c}`, ...) and special letters (`\ss`,
///   `\o`, `\i`, ...) become named entities
/// - `\emph{..}` and `\textit{..}` become `<em>`, `\textbf{..}` becomes `<b>`
/// - grouping braces are dropped
///
/// Unknown commands lose their backslash and keep their name.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlChars;

impl LayoutFormatter for HtmlChars {
    fn format(
        &self,
        input: &str,
        _argument: Option<&str>,
        _context: &RenderContext<'_>,
    ) -> Result<String, FormatError> {
        let normalized = input.replace("\r\n", "\n");
        let chars: Vec<char> = normalized.chars().collect();
        let mut out = String::with_capacity(normalized.len());
        Converter {
            chars: &chars,
            pos: 0,
        }
        .convert(&mut out);
        Ok(out)
    }
}

/// Accent introduced by a single symbol: `\'`, `` \` ``, `\^`, ...
fn symbol_accent(c: char) -> Option<Accent> {
    Some(match c {
        '\'' => Accent::Acute,
        '`' => Accent::Grave,
        '^' => Accent::Circumflex,
        '"' => Accent::Umlaut,
        '~' => Accent::Tilde,
        '=' => Accent::Macron,
        '.' => Accent::Dot,
        _ => return None,
    })
}

/// Accent introduced by a letter command: `\c{c}`, `\r{a}`, ...
fn letter_accent(name: &str) -> Option<Accent> {
    Some(match name {
        "c" => Accent::Cedilla,
        "r" => Accent::Ring,
        "v" => Accent::Caron,
        "u" => Accent::Breve,
        "H" => Accent::DoubleAcute,
        _ => return None,
    })
}

#[derive(Debug, Clone, Copy)]
enum Accent {
    Acute,
    Grave,
    Circumflex,
    Umlaut,
    Tilde,
    Macron,
    Dot,
    Cedilla,
    Ring,
    Caron,
    Breve,
    DoubleAcute,
}

impl Accent {
    /// Entity suffix and the base letters it has an entity for.
    fn entity(self) -> (&'static str, &'static str) {
        match self {
            Accent::Acute => ("acute", "aeiouyAEIOUYcnszCNSZ"),
            Accent::Grave => ("grave", "aeiouAEIOU"),
            Accent::Circumflex => ("circ", "aeiouAEIOUcghjswyCGHJSWY"),
            Accent::Umlaut => ("uml", "aeiouyAEIOUY"),
            Accent::Tilde => ("tilde", "anoiuANOIU"),
            Accent::Macron => ("macr", "aeiouAEIOU"),
            Accent::Dot => ("dot", "cegzCEGIZ"),
            Accent::Cedilla => ("cedil", "cgklnrstCGKLNRST"),
            Accent::Ring => ("ring", "auAU"),
            Accent::Caron => ("caron", "cdenrstzCDENRSTZ"),
            Accent::Breve => ("breve", "aguAGU"),
            Accent::DoubleAcute => ("dblac", "ouOU"),
        }
    }

    fn apply(self, base: &str) -> String {
        let (suffix, letters) = self.entity();
        let mut chars = base.chars();
        match (chars.next(), chars.next()) {
            (Some(letter), None) if letters.contains(letter) => format!("&{letter}{suffix};"),
            _ => base.to_string(),
        }
    }
}

fn special_letter(name: &str) -> Option<&'static str> {
    Some(match name {
        "i" => "&imath;",
        "j" => "&jmath;",
        "ss" => "&szlig;",
        "o" => "&oslash;",
        "O" => "&Oslash;",
        "aa" => "&aring;",
        "AA" => "&Aring;",
        "ae" => "&aelig;",
        "AE" => "&AElig;",
        "oe" => "&oelig;",
        "OE" => "&OElig;",
        "l" => "&lstrok;",
        "L" => "&Lstrok;",
        _ => return None,
    })
}

struct Converter<'c> {
    chars: &'c [char],
    pos: usize,
}

impl Converter<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn convert(&mut self, out: &mut String) {
        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                '\n' => {
                    let mut run = 1;
                    while self.peek() == Some('\n') {
                        self.pos += 1;
                        run += 1;
                    }
                    out.push_str(if run == 1 { "<br>" } else { "<p>" });
                }
                '\\' => self.command(out),
                '{' | '}' => {}
                _ => push_escaped(out, c),
            }
        }
    }

    /// Handle the text after a backslash.
    fn command(&mut self, out: &mut String) {
        let Some(c) = self.peek() else {
            out.push('\\');
            return;
        };

        if c == '\\' {
            self.pos += 1;
            out.push_str("<br>");
            return;
        }
        if matches!(c, '&' | '%' | '$' | '#' | '_' | '{' | '}') {
            self.pos += 1;
            push_escaped(out, c);
            return;
        }
        if let Some(accent) = symbol_accent(c) {
            self.pos += 1;
            match self.accent_base() {
                Some(base) => out.push_str(&accent.apply(&base)),
                None => push_escaped(out, c),
            }
            return;
        }
        if !c.is_ascii_alphabetic() {
            push_escaped(out, c);
            self.pos += 1;
            return;
        }

        let name = self.command_name();
        if let Some(accent) = letter_accent(&name)
            && self.peek() == Some('{')
            && let Some(base) = self.accent_base()
        {
            out.push_str(&accent.apply(&base));
            return;
        }
        if let Some(entity) = special_letter(&name) {
            out.push_str(entity);
            return;
        }
        let tag = match name.as_str() {
            "emph" | "textit" => Some("em"),
            "textbf" => Some("b"),
            _ => None,
        };
        if let Some(tag) = tag
            && self.peek() == Some('{')
        {
            let inner = self.group();
            out.push_str(&format!("<{tag}>"));
            Converter {
                chars: &inner,
                pos: 0,
            }
            .convert(out);
            out.push_str(&format!("</{tag}>"));
            return;
        }
        out.push_str(&name);
    }

    fn command_name(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    /// Contents of the brace group starting at the current position, which
    /// must be `{`. An unclosed group runs to the end of the input.
    fn group(&mut self) -> Vec<char> {
        self.pos += 1;
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            match c {
                '{' => depth += 1,
                '}' if depth == 0 => {
                    let inner = self.chars[start..self.pos].to_vec();
                    self.pos += 1;
                    return inner;
                }
                '}' => depth -= 1,
                _ => {}
            }
            self.pos += 1;
        }
        self.chars[start..].to_vec()
    }

    /// The letter an accent applies to: `{n}`, `{\i}`, `\i` or a bare
    /// character.
    fn accent_base(&mut self) -> Option<String> {
        match self.peek()? {
            '{' => {
                let inner: String = self.group().into_iter().collect();
                let inner = inner.trim();
                Some(dotless_base(inner).unwrap_or(inner).to_string())
            }
            '\\' => {
                self.pos += 1;
                let name = self.command_name();
                Some(dotless_base(&format!("\\{name}")).map_or(name, str::to_string))
            }
            c => {
                self.pos += 1;
                Some(c.to_string())
            }
        }
    }
}

fn dotless_base(text: &str) -> Option<&'static str> {
    match text {
        "\\i" => Some("i"),
        "\\j" => Some("j"),
        _ => None,
    }
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        _ => out.push(c),
    }
}
