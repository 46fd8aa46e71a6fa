/*
 * parser.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Layout parser.
//!
//! Converts layout source text into the layout AST. The grammar is small
//! enough for a hand-written recursive descent parser:
//!
//! ```text
//! layout     := (literal | '\\' escape)*
//! escape     := '\\'                              -- literal backslash
//!             | 'begin{' condition '}' layout '\end{' condition '}'
//!             | 'format[' chain ']{' body '}'
//!             | identifier ['{}']                  -- field reference
//! chain      := formatter (',' formatter)*
//! formatter  := name ['(' argument ')']
//! ```
//!
//! Formatter names are resolved against a [`FormatterRegistry`] while
//! parsing, so a compiled [`Layout`] never fails on an unknown formatter.

use crate::ast::{Conditional, FieldRef, FormatCall, FormatterCall, LayoutNode, Literal};
use crate::condition::{Condition, is_field_char};
use crate::error::{LayoutError, LayoutResult, Location};
use crate::formatters::FormatterRegistry;
use std::path::Path;

/// A compiled layout ready for rendering.
#[derive(Debug, Clone)]
pub struct Layout {
    pub(crate) nodes: Vec<LayoutNode>,

    /// Original source (for error reporting).
    pub(crate) source: String,
}

impl Layout {
    /// Compile layout source text.
    ///
    /// # Errors
    ///
    /// Any syntax problem, unknown formatter, mismatched or unterminated
    /// block fails the whole compilation.
    pub fn compile(source: &str, registry: &FormatterRegistry) -> LayoutResult<Self> {
        let mut parser = Parser {
            source,
            pos: 0,
            depth: 0,
            registry,
        };
        let (nodes, _) = parser.parse_sequence(Scope::TopLevel)?;
        tracing::debug!(nodes = nodes.len(), "Compiled layout");
        Ok(Self {
            nodes,
            source: source.to_string(),
        })
    }

    /// Read and compile a layout file.
    pub fn compile_from_file(
        path: impl AsRef<Path>,
        registry: &FormatterRegistry,
    ) -> LayoutResult<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::compile(&source, registry)
    }

    pub fn nodes(&self) -> &[LayoutNode] {
        &self.nodes
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Lower-cased names of all fields the layout reads.
    pub fn referenced_fields(&self) -> Vec<String> {
        crate::ast::referenced_fields(&self.nodes)
    }
}

/// Where a sequence of nodes is being parsed. Determines what ends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    TopLevel,
    FormatBody,
    Conditional,
}

/// Why a sequence ended.
#[derive(Debug)]
enum Stop {
    Eof,
    CloseBrace,
    End {
        expression: String,
        location: Location,
    },
}

/// Deepest allowed nesting of `\begin` and `\format` blocks.
const MAX_NESTING: usize = 100;

struct Parser<'s, 'r> {
    source: &'s str,
    pos: usize,
    /// Blocks currently open around `pos`.
    depth: usize,
    registry: &'r FormatterRegistry,
}

/// Literal text accumulated between constructs.
struct Pending {
    text: String,
    start: usize,
}

impl<'s> Parser<'s, '_> {
    fn location(&self, offset: usize) -> Location {
        Location::at(self.source, offset)
    }

    fn rest(&self) -> &'s str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn parse_sequence(&mut self, scope: Scope) -> LayoutResult<(Vec<LayoutNode>, Stop)> {
        let mut nodes = Vec::new();
        let mut pending = Pending {
            text: String::new(),
            start: self.pos,
        };
        let mut depth = 0usize;

        loop {
            let start = self.pos;
            let Some(c) = self.bump() else {
                self.flush_before(&mut pending, &mut nodes, start);
                return Ok((nodes, Stop::Eof));
            };

            match c {
                '\\' => match self.peek() {
                    Some('\\') => {
                        self.bump();
                        pending.text.push('\\');
                    }
                    Some(next) if is_field_char(next) => {
                        let name = self.identifier();
                        match name {
                            "begin" => {
                                self.flush_before(&mut pending, &mut nodes, start);
                                let node = self.parse_conditional(start)?;
                                push_node(&mut nodes, node);
                                pending.start = self.pos;
                            }
                            "end" => {
                                if scope != Scope::Conditional {
                                    return Err(LayoutError::Syntax {
                                        message: "\\end without matching \\begin".to_string(),
                                        location: self.location(start),
                                    });
                                }
                                self.flush_before(&mut pending, &mut nodes, start);
                                let expression = self.braced("\\end condition", start)?;
                                return Ok((
                                    nodes,
                                    Stop::End {
                                        expression: expression.to_string(),
                                        location: self.location(start),
                                    },
                                ));
                            }
                            "format" => {
                                self.flush_before(&mut pending, &mut nodes, start);
                                let node = self.parse_format(start)?;
                                push_node(&mut nodes, node);
                                pending.start = self.pos;
                            }
                            _ => {
                                self.flush_before(&mut pending, &mut nodes, start);
                                if self.rest().starts_with("{}") {
                                    self.pos += 2;
                                }
                                let field = FieldRef {
                                    name: name.to_string(),
                                    location: self.location(start),
                                };
                                push_node(&mut nodes, LayoutNode::Field(field));
                                pending.start = self.pos;
                            }
                        }
                    }
                    Some(other) => {
                        self.bump();
                        pending.text.push('\\');
                        pending.text.push(other);
                    }
                    None => pending.text.push('\\'),
                },
                '{' if scope == Scope::FormatBody => {
                    depth += 1;
                    pending.text.push('{');
                }
                '}' if scope == Scope::FormatBody => {
                    if depth == 0 {
                        self.flush_before(&mut pending, &mut nodes, start);
                        return Ok((nodes, Stop::CloseBrace));
                    }
                    depth -= 1;
                    pending.text.push('}');
                }
                _ => pending.text.push(c),
            }
        }
    }

    /// Flush pending text whose last character precedes `offset`.
    fn flush_before(&self, pending: &mut Pending, nodes: &mut Vec<LayoutNode>, offset: usize) {
        if !pending.text.is_empty() {
            let literal = Literal {
                text: std::mem::take(&mut pending.text),
                location: self.location(pending.start),
            };
            push_node(nodes, LayoutNode::Literal(literal));
        }
        pending.start = offset;
    }

    fn identifier(&mut self) -> &'s str {
        let rest = self.rest();
        let len = rest
            .find(|c: char| !is_field_char(c))
            .unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    /// Parse the body of a block opened at `start`.
    fn parse_block(
        &mut self,
        scope: Scope,
        start: usize,
    ) -> LayoutResult<(Vec<LayoutNode>, Stop)> {
        if self.depth >= MAX_NESTING {
            tracing::debug!(depth = self.depth, "Layout nested too deeply");
            return Err(LayoutError::Syntax {
                message: format!("blocks nested more than {} deep", MAX_NESTING),
                location: self.location(start),
            });
        }
        self.depth += 1;
        let result = self.parse_sequence(scope);
        self.depth -= 1;
        result
    }

    /// Read `{...}` (no nesting) directly at the current position.
    fn braced(&mut self, construct: &'static str, start: usize) -> LayoutResult<&'s str> {
        if self.peek() != Some('{') {
            return Err(LayoutError::Syntax {
                message: format!("expected '{{' to open {}", construct),
                location: self.location(self.pos),
            });
        }
        let rest = &self.rest()[1..];
        let Some(close) = rest.find('}') else {
            return Err(LayoutError::Unterminated {
                construct,
                location: self.location(start),
            });
        };
        self.pos += close + 2;
        Ok(&rest[..close])
    }

    /// Parse `{condition}body\end{condition}` after `\begin`.
    fn parse_conditional(&mut self, start: usize) -> LayoutResult<LayoutNode> {
        let expression_offset = self.pos + 1;
        let expression = self.braced("\\begin condition", start)?;
        let condition = Condition::parse(expression, self.location(expression_offset))?;

        let (body, stop) = self.parse_block(Scope::Conditional, start)?;
        match stop {
            Stop::End {
                expression: found,
                location,
            } => {
                if found != expression {
                    return Err(LayoutError::MismatchedEnd {
                        expected: expression.to_string(),
                        found,
                        location,
                    });
                }
            }
            Stop::Eof | Stop::CloseBrace => {
                return Err(LayoutError::Unterminated {
                    construct: "\\begin block",
                    location: self.location(start),
                });
            }
        }

        Ok(LayoutNode::Conditional(Conditional {
            expression: expression.to_string(),
            condition,
            body,
            location: self.location(start),
        }))
    }

    /// Parse `[chain]{body}` after `\format`.
    fn parse_format(&mut self, start: usize) -> LayoutResult<LayoutNode> {
        if self.peek() != Some('[') {
            return Err(LayoutError::Syntax {
                message: "expected '[' after \\format".to_string(),
                location: self.location(self.pos),
            });
        }
        let chain_offset = self.pos + 1;
        let chain_text = &self.rest()[1..];
        let Some(close) = find_at_paren_depth_zero(chain_text, ']') else {
            return Err(LayoutError::Unterminated {
                construct: "formatter list",
                location: self.location(start),
            });
        };
        let chain_text = &chain_text[..close];
        self.pos = chain_offset + close + 1;

        let chain = self.parse_chain(chain_text, chain_offset)?;

        if self.peek() != Some('{') {
            return Err(LayoutError::Syntax {
                message: "expected '{' after \\format[...]".to_string(),
                location: self.location(self.pos),
            });
        }
        self.bump();
        let (body, stop) = self.parse_block(Scope::FormatBody, start)?;
        if !matches!(stop, Stop::CloseBrace) {
            return Err(LayoutError::Unterminated {
                construct: "\\format body",
                location: self.location(start),
            });
        }

        Ok(LayoutNode::Format(FormatCall {
            chain,
            body,
            location: self.location(start),
        }))
    }

    fn parse_chain(&self, text: &str, offset: usize) -> LayoutResult<Vec<FormatterCall>> {
        if text.trim().is_empty() {
            return Err(LayoutError::Syntax {
                message: "empty formatter list".to_string(),
                location: self.location(offset),
            });
        }

        split_at_paren_depth_zero(text, ',')
            .into_iter()
            .map(|(item_offset, item)| self.parse_formatter(item, offset + item_offset))
            .collect()
    }

    fn parse_formatter(&self, item: &str, offset: usize) -> LayoutResult<FormatterCall> {
        let leading = item.len() - item.trim_start().len();
        let location = self.location(offset + leading);
        let item = item.trim();

        let (name, argument) = match item.find('(') {
            Some(open) => {
                let Some(inner) = item[open + 1..].strip_suffix(')') else {
                    return Err(LayoutError::Syntax {
                        message: format!("unclosed argument in formatter '{}'", item),
                        location,
                    });
                };
                (item[..open].trim(), Some(inner.to_string()))
            }
            None => (item, None),
        };

        if name.is_empty() {
            return Err(LayoutError::Syntax {
                message: "empty formatter name".to_string(),
                location,
            });
        }
        let Some(formatter) = self.registry.get(name) else {
            return Err(LayoutError::UnknownFormatter {
                name: name.to_string(),
                location,
            });
        };

        Ok(FormatterCall {
            name: name.to_string(),
            argument,
            formatter,
        })
    }
}

fn push_node(nodes: &mut Vec<LayoutNode>, node: LayoutNode) {
    tracing::trace!(?node, "Compiled layout node");
    nodes.push(node);
}

fn find_at_paren_depth_zero(text: &str, target: char) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c == target && depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Split `text` at `separator` outside parentheses, keeping each piece's
/// byte offset.
fn split_at_paren_depth_zero(text: &str, separator: char) -> Vec<(usize, &str)> {
    let mut pieces = Vec::new();
    let mut start = 0;
    while let Some(i) = find_at_paren_depth_zero(&text[start..], separator) {
        pieces.push((start, &text[start..start + i]));
        start += i + separator.len_utf8();
    }
    pieces.push((start, &text[start..]));
    pieces
}
