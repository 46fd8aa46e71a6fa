/*
 * ast.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Layout AST types.
//!
//! A compiled layout is a sequence of [`LayoutNode`]s. Nodes carry the
//! location of their first source character for error reporting.
//! Formatter references are resolved during compilation, so every
//! [`FormatterCall`] holds the formatter it will invoke.

use crate::condition::Condition;
use crate::error::Location;
use crate::formatters::LayoutFormatter;
use std::fmt;
use std::sync::Arc;

/// A node in the layout AST.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutNode {
    /// Literal text to be output as-is.
    Literal(Literal),

    /// Field reference: `\author`
    Field(FieldRef),

    /// Formatter chain applied to a body: `\format[HTMLChars,ToUpperCase]{...}`
    Format(FormatCall),

    /// Conditional block: `\begin{editor||author}...\end{editor||author}`
    Conditional(Conditional),
}

/// Literal text node.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub text: String,
    pub location: Location,
}

/// Reference to an entry field or pseudo-field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRef {
    /// Field name as written in the layout.
    pub name: String,
    pub location: Location,
}

/// Formatters applied, left to right, to the rendered body.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatCall {
    pub chain: Vec<FormatterCall>,
    pub body: Vec<LayoutNode>,
    pub location: Location,
}

/// One formatter invocation inside a `\format[...]` list.
#[derive(Clone)]
pub struct FormatterCall {
    pub name: String,
    /// Text between the parentheses of `Name(arg)`, if any.
    pub argument: Option<String>,
    pub(crate) formatter: Arc<dyn LayoutFormatter>,
}

impl FormatterCall {
    pub fn formatter(&self) -> &dyn LayoutFormatter {
        self.formatter.as_ref()
    }
}

impl fmt::Debug for FormatterCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatterCall")
            .field("name", &self.name)
            .field("argument", &self.argument)
            .finish_non_exhaustive()
    }
}

/// Calls are equal when they name the same formatter with the same argument.
impl PartialEq for FormatterCall {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.argument == other.argument
    }
}

/// Conditional block rendered only when its condition holds.
#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    /// Expression text exactly as written inside `\begin{...}`.
    pub expression: String,
    pub condition: Condition,
    pub body: Vec<LayoutNode>,
    pub location: Location,
}

impl LayoutNode {
    pub fn location(&self) -> Location {
        match self {
            LayoutNode::Literal(Literal { location, .. })
            | LayoutNode::Field(FieldRef { location, .. })
            | LayoutNode::Format(FormatCall { location, .. })
            | LayoutNode::Conditional(Conditional { location, .. }) => *location,
        }
    }
}

/// Names of all fields referenced by `nodes`, including those tested by
/// conditions, in order of first appearance.
pub fn referenced_fields(nodes: &[LayoutNode]) -> Vec<String> {
    fn visit(nodes: &[LayoutNode], out: &mut Vec<String>) {
        for node in nodes {
            match node {
                LayoutNode::Literal(_) => {}
                LayoutNode::Field(field) => push_unique(out, &field.name),
                LayoutNode::Format(call) => visit(&call.body, out),
                LayoutNode::Conditional(cond) => {
                    for predicate in cond.condition.predicates() {
                        push_unique(out, &predicate.field);
                    }
                    visit(&cond.body, out);
                }
            }
        }
    }

    fn push_unique(out: &mut Vec<String>, name: &str) {
        let name = name.to_ascii_lowercase();
        if !out.contains(&name) {
            out.push(name);
        }
    }

    let mut out = Vec::new();
    visit(nodes, &mut out);
    out
}
