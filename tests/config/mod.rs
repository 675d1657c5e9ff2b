// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use std::path::Path;

use anyhow::Result;
use typekit::*;

#[test]
fn json_document() -> Result<()> {
    let tools = load_tools(Path::new("tests/fixtures/foo/autogens.json"))?;
    let view = &tools["view"];
    assert_eq!(view.ignore_names(), ["basic", "struct_array*", "map&"]);
    assert_eq!(
        view.ignore_rules(),
        [
            IgnoreRule::Basic,
            IgnoreRule::Collection {
                category: Category::Array,
                elem: ElementKind::Struct,
                indirection: Indirection::Pointer,
            },
            IgnoreRule::Collection {
                category: Category::Map,
                elem: ElementKind::Any,
                indirection: Indirection::Value,
            },
        ]
    );
    // Nothing is expanded or ignored before the package is known.
    assert_eq!(view.types["Bob"], Value::from("&crud"));
    assert!(view.ignored.is_empty());
    assert_eq!(tools["mgr"].ignore_names(), ["struct"]);
    Ok(())
}

#[cfg(feature = "yaml")]
#[test]
fn yaml_document() -> Result<()> {
    let tools = load_tools(Path::new("tests/fixtures/single/autogens.yaml"))?;
    let docs = &tools["docs"];
    assert_eq!(docs.command, "docgen");
    assert_eq!(docs.presets["full"]["depth"], Value::from(2));
    assert_eq!(docs.types.keys().collect::<Vec<_>>(), ["Node", "Index"]);
    Ok(())
}

#[test]
fn malformed_documents() {
    let err = load_tools(Path::new("tests/fixtures/malformed/autogens.json")).unwrap_err();
    assert!(matches!(err, BuildError::ToolOptions { ref tool, .. } if tool == "gen"));

    let err = load_tools(Path::new("tests/fixtures/malformed/list.json")).unwrap_err();
    assert!(matches!(err, BuildError::ConfigUnreadable { .. }));

    let err = load_tools(Path::new("tests/fixtures/malformed/absent.json")).unwrap_err();
    assert!(matches!(err, BuildError::ConfigUnreadable { .. }));
}

#[test]
fn malformed_document_next_to_sources() {
    let source = SourcePackage::new("empty");
    let err = Package::build(&source, &["tests/fixtures/malformed"]).unwrap_err();
    assert!(err.to_string().contains("gen"));
}

#[test]
fn json5_document() -> Result<()> {
    let tools = load_tools(Path::new("tests/fixtures/json5/autogens.json5"))?;
    let lint = &tools["lint"];
    assert_eq!(lint.command, "lintgen -strict");
    assert_eq!(lint.ignore_names(), ["map*"]);
    assert_eq!(lint.types["Count"]["strict"], Value::from(true));
    Ok(())
}

#[test]
fn json5_document_is_found_first() -> Result<()> {
    let mut source = SourcePackage::new("five");
    let int = source.types.basic("int");
    let count = source.types.named("Count", int);
    source.declare(Declaration::new("Count", count));

    let pkg = Package::build(&source, &["tests/fixtures/json5"])?;
    assert!(pkg.tool("stale").is_none());
    assert_eq!(pkg.tool("lint").map(|t| t.types.len()), Some(1));
    Ok(())
}
