/*
 * diagnostics.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Source-annotated error reports for layout compilation failures.

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use biblayout::LayoutError;

/// Render `error` against the layout `source` named `path`.
///
/// Errors without a source location are rendered as their message.
pub fn render_layout_error(path: &str, source: &str, error: &LayoutError, color: bool) -> String {
    let Some(location) = error.location() else {
        return format!("{}: {}", path, error);
    };

    // ariadne spans count characters, not bytes
    let start = source[..location.offset.min(source.len())].chars().count();
    let end = (start + 1).min(source.chars().count().max(start));

    let label = match error {
        LayoutError::UnknownFormatter { .. } => "not a registered formatter",
        LayoutError::MismatchedEnd { .. } => "does not match its \\begin",
        LayoutError::Unterminated { .. } => "opened here and never closed",
        LayoutError::MixedOperators { .. } => "mixes && and ||",
        _ => "here",
    };

    let path = path.to_string();
    let report = Report::build(ReportKind::Error, path.clone(), start)
        .with_config(Config::default().with_color(color))
        .with_message(error.to_string())
        .with_label(
            Label::new((path.clone(), start..end))
                .with_message(label)
                .with_color(Color::Red),
        )
        .finish();

    let mut output = Vec::new();
    if report
        .write((path.clone(), Source::from(source)), &mut output)
        .is_err()
    {
        return format!("{}: {}", path, error);
    }
    String::from_utf8_lossy(&output).into_owned()
}
