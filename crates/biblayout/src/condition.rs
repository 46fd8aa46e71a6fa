/*
 * condition.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Field-presence conditions for `\begin{...}` blocks.
//!
//! A condition is a chain of predicates joined by a single operator kind:
//!
//! - `author` holds when the field is present
//! - `!year` holds when the field is absent
//! - `editor||author`, `!editor&&author` combine predicates left to right
//!
//! Mixing `&&` and `||` in one condition is rejected; there is no
//! precedence between them and no parentheses.

use crate::error::{LayoutError, LayoutResult, Location};

/// Operator joining the predicates of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
}

impl Operator {
    fn token(self) -> &'static str {
        match self {
            Operator::And => "&&",
            Operator::Or => "||",
        }
    }
}

/// A single field-presence test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub field: String,
    pub negated: bool,
}

/// A parsed condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    predicates: Vec<Predicate>,
    /// `None` for a single predicate.
    operator: Option<Operator>,
}

impl Condition {
    /// Parse a condition expression.
    ///
    /// `location` is where the expression starts in the layout source and is
    /// only used for error reporting.
    pub fn parse(expression: &str, location: Location) -> LayoutResult<Self> {
        let has_and = expression.contains(Operator::And.token());
        let has_or = expression.contains(Operator::Or.token());
        let operator = match (has_and, has_or) {
            (true, true) => {
                return Err(LayoutError::MixedOperators {
                    expression: expression.to_string(),
                    location,
                });
            }
            (true, false) => Some(Operator::And),
            (false, true) => Some(Operator::Or),
            (false, false) => None,
        };

        let pieces: Vec<&str> = match operator {
            Some(op) => expression.split(op.token()).collect(),
            None => vec![expression],
        };

        let predicates = pieces
            .into_iter()
            .map(|piece| parse_predicate(piece, expression, location))
            .collect::<LayoutResult<Vec<_>>>()?;

        Ok(Self {
            predicates,
            operator,
        })
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn operator(&self) -> Option<Operator> {
        self.operator
    }

    /// Evaluate the condition, left to right, with `is_present` answering
    /// whether a field exists on the current entry.
    pub fn evaluate(&self, is_present: impl Fn(&str) -> bool) -> bool {
        let test = |p: &Predicate| is_present(&p.field) != p.negated;
        match self.operator {
            Some(Operator::Or) => self.predicates.iter().any(test),
            Some(Operator::And) | None => self.predicates.iter().all(test),
        }
    }
}

fn parse_predicate(piece: &str, expression: &str, location: Location) -> LayoutResult<Predicate> {
    let piece = piece.trim();
    let (negated, name) = match piece.strip_prefix('!') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, piece),
    };

    if name.is_empty() {
        return Err(LayoutError::Syntax {
            message: format!("empty field name in condition '{}'", expression),
            location,
        });
    }
    if !name.chars().all(is_field_char) {
        return Err(LayoutError::Syntax {
            message: format!("invalid field name '{}' in condition '{}'", name, expression),
            location,
        });
    }

    Ok(Predicate {
        field: name.to_string(),
        negated,
    })
}

/// Characters allowed in field names, in conditions and `\field` references.
pub(crate) fn is_field_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '+'
}
