/*
 * fixture_tests.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Rendering tests driven by the layout, config and entry files under
 * test-fixtures/.
 */

use biblayout::{Layout, LayoutConfig, RenderContext};
use biblayout_model::Entry;
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};

/// Helper to get the path to test fixtures
fn fixture_path(name: &str) -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    Path::new(manifest_dir).join("test-fixtures").join(name)
}

fn load_config() -> LayoutConfig {
    LayoutConfig::from_file(fixture_path("config.yaml")).expect("Failed to load config")
}

fn load_entries() -> Vec<Entry> {
    let source = std::fs::read_to_string(fixture_path("entries.json")).unwrap();
    Entry::list_from_json(&source).unwrap()
}

fn load_layout(name: &str, config: &LayoutConfig) -> Layout {
    Layout::compile_from_file(fixture_path(name), &config.formatter_registry())
        .unwrap_or_else(|e| panic!("Failed to load layout {}: {}", name, e))
}

#[test]
fn test_reference_layout() {
    let config = load_config();
    let macros = config.macro_table().unwrap();
    let layout = load_layout("reference.layout", &config);
    let entries = load_entries();
    let ctx = RenderContext::new(&macros);

    assert_eq!(
        layout.render(&entries[0], &ctx).unwrap(),
        "Joe Doe, Jane M&uuml;ller. Layouts &amp; Templates. \
         IEEE Transactions on Signal Processing (2020)\n"
    );
    assert_eq!(layout.render(&entries[1], &ctx).unwrap(), "Untitled\n");
}

#[test]
fn test_configured_name_formatter() {
    let config = load_config();
    let macros = config.macro_table().unwrap();
    let layout = load_layout("short.layout", &config);
    let entries = load_entries();

    let rendered = layout
        .render_all(&entries, &RenderContext::new(&macros))
        .unwrap();
    assert_eq!(rendered, "doe2020: Doe and M&uuml;lleranon: Anonymous");
}

#[test]
fn test_configured_file_directories() {
    let config = load_config();
    let dirs: Vec<PathBuf> = config
        .file_directories
        .iter()
        .map(|dir| fixture_path("").join(dir))
        .collect();
    let layout = Layout::compile(
        "\\format[WrapFileLinks(\\d=\\x)]{\\file}",
        &config.formatter_registry(),
    )
    .unwrap();
    let entry = Entry::list_from_json(
        r#"[{"type": "article", "fields": {"file": "Paper:encrypted.pdf:PDF"}}]"#,
    )
    .unwrap()
    .remove(0);

    let macros = config.macro_table().unwrap();
    let ctx = RenderContext::new(&macros).with_file_directories(&dirs);
    assert_eq!(layout.render(&entry, &ctx).unwrap(), "Paper=pdf");

    let path_layout = Layout::compile("\\format[WrapFileLinks]{\\file}", &config.formatter_registry()).unwrap();
    let expected = std::fs::canonicalize(fixture_path("pdfs/encrypted.pdf")).unwrap();
    assert_eq!(
        path_layout.render(&entry, &ctx).unwrap(),
        expected.to_string_lossy()
    );
}

#[test]
fn test_referenced_fields() {
    let config = load_config();
    let layout = load_layout("reference.layout", &config);
    assert_eq!(
        layout.referenced_fields(),
        vec!["author", "title", "journal", "year"]
    );
}
