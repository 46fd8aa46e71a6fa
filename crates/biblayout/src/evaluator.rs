/*
 * evaluator.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Layout evaluation engine.
//!
//! Renders a compiled layout against one entry. Rendering only reads the
//! layout, the entry and the context, so a layout can be rendered from
//! several threads at once.

use crate::ast::{Conditional, FieldRef, FormatCall, LayoutNode, Literal};
use crate::context::RenderContext;
use crate::error::{LayoutError, LayoutResult};
use crate::field::{is_field_present, resolve_field};
use crate::parser::Layout;
use biblayout_model::Entry;

impl Layout {
    /// Render this layout for `entry`.
    ///
    /// # Arguments
    /// * `entry` - The entry whose fields are substituted
    /// * `context` - Macros, file directories and path locator
    ///
    /// # Returns
    /// The rendered text, or the first formatter error.
    pub fn render(&self, entry: &Entry, context: &RenderContext<'_>) -> LayoutResult<String> {
        let mut out = String::new();
        evaluate(&self.nodes, entry, context, &mut out)?;
        Ok(out)
    }

    /// Render this layout for each of `entries` and concatenate the results.
    pub fn render_all<'e>(
        &self,
        entries: impl IntoIterator<Item = &'e Entry>,
        context: &RenderContext<'_>,
    ) -> LayoutResult<String> {
        let mut out = String::new();
        for entry in entries {
            evaluate(&self.nodes, entry, context, &mut out)?;
        }
        Ok(out)
    }
}

/// Evaluate a list of layout nodes, appending to `out`.
pub fn evaluate(
    nodes: &[LayoutNode],
    entry: &Entry,
    context: &RenderContext<'_>,
    out: &mut String,
) -> LayoutResult<()> {
    for node in nodes {
        evaluate_node(node, entry, context, out)?;
    }
    Ok(())
}

fn evaluate_node(
    node: &LayoutNode,
    entry: &Entry,
    context: &RenderContext<'_>,
    out: &mut String,
) -> LayoutResult<()> {
    match node {
        LayoutNode::Literal(Literal { text, .. }) => out.push_str(text),

        LayoutNode::Field(FieldRef { name, .. }) => {
            if let Some(value) = resolve_field(entry, name, context.macros) {
                out.push_str(&value);
            }
        }

        LayoutNode::Conditional(Conditional {
            condition, body, ..
        }) => {
            if condition.evaluate(|field| is_field_present(entry, field)) {
                evaluate(body, entry, context, out)?;
            }
        }

        LayoutNode::Format(call) => out.push_str(&evaluate_format(call, entry, context)?),
    }
    Ok(())
}

/// Render the body, then thread it through the formatter chain left to
/// right.
fn evaluate_format(
    call: &FormatCall,
    entry: &Entry,
    context: &RenderContext<'_>,
) -> LayoutResult<String> {
    let mut text = String::new();
    evaluate(&call.body, entry, context, &mut text)?;

    for formatter in &call.chain {
        text = formatter
            .formatter()
            .format(&text, formatter.argument.as_deref(), context)
            .map_err(|source| {
                tracing::warn!(
                    formatter = %formatter.name,
                    entry = %entry.id(),
                    error = %source,
                    "Formatter failed"
                );
                LayoutError::Format {
                    formatter: formatter.name.clone(),
                    source,
                }
            })?;
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormatError;
    use crate::formatters::{FormatterRegistry, LayoutFormatter};
    use biblayout_model::{EntryType, MacroTable};
    use pretty_assertions::assert_eq;

    fn render(source: &str, entry: &Entry) -> String {
        Layout::compile(source, &FormatterRegistry::with_builtins())
            .unwrap()
            .render(entry, &RenderContext::default())
            .unwrap()
    }

    #[test]
    fn test_missing_field_renders_empty() {
        let entry = Entry::new(EntryType::Article).with_field("title", "T");
        assert_eq!(render("[\\title|\\year]", &entry), "[T|]");
    }

    #[test]
    fn test_conditional_with_empty_field() {
        let entry = Entry::new(EntryType::Article).with_field("note", "");
        assert_eq!(render("\\begin{note}present\\end{note}", &entry), "present");
    }

    #[test]
    fn test_macros_expand_in_fields() {
        let mut macros = MacroTable::new();
        macros.add("acm", "Association for Computing Machinery").unwrap();
        let entry = Entry::new(EntryType::Book).with_field("publisher", "#acm# Press");
        let layout =
            Layout::compile("\\publisher", &FormatterRegistry::with_builtins()).unwrap();

        let rendered = layout.render(&entry, &RenderContext::new(&macros)).unwrap();
        assert_eq!(rendered, "Association for Computing Machinery Press");
    }

    #[test]
    fn test_format_chain_order() {
        let entry = Entry::new(EntryType::Article).with_field("title", "A & B");
        assert_eq!(
            render("\\format[HTMLChars,ToLowerCase]{\\title}", &entry),
            "a &amp; b"
        );
        assert_eq!(
            render("\\format[ToUpperCase,Default(none)]{\\year}", &entry),
            "none"
        );
    }

    #[test]
    fn test_render_all_concatenates() {
        let layout = Layout::compile("\\bibtexkey;", &FormatterRegistry::new()).unwrap();
        let entries = vec![
            Entry::new(EntryType::Misc).with_citation_key("a"),
            Entry::new(EntryType::Misc),
            Entry::new(EntryType::Misc).with_citation_key("c"),
        ];
        let rendered = layout
            .render_all(&entries, &RenderContext::default())
            .unwrap();
        assert_eq!(rendered, "a;;c;");
    }

    struct Failing;

    impl LayoutFormatter for Failing {
        fn format(
            &self,
            _input: &str,
            _argument: Option<&str>,
            _context: &RenderContext<'_>,
        ) -> Result<String, FormatError> {
            Err(FormatError::new("always fails"))
        }
    }

    #[test]
    fn test_formatter_error_names_formatter() {
        let mut registry = FormatterRegistry::with_builtins();
        registry.register("Failing", Failing);
        let layout = Layout::compile("ok \\format[Failing]{x}", &registry).unwrap();

        let err = layout
            .render(&Entry::new(EntryType::Misc), &RenderContext::default())
            .unwrap_err();
        match err {
            LayoutError::Format { formatter, source } => {
                assert_eq!(formatter, "Failing");
                assert_eq!(source.message(), "always fails");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_bad_name_spec_fails_at_render() {
        let entry = Entry::new(EntryType::Article).with_field("author", "Joe Doe");
        let layout = Layout::compile(
            "\\format[NameFormatter(1@*)]{\\author}",
            &FormatterRegistry::with_builtins(),
        )
        .unwrap();
        let err = layout.render(&entry, &RenderContext::default()).unwrap_err();
        assert!(matches!(err, LayoutError::Format { .. }));
    }
}
