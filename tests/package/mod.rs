// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use std::path::Path;

use anyhow::Result;
use typekit::*;

const FOO_FILES: [&str; 2] = ["tests/fixtures/foo/foo.json", "tests/fixtures/foo/bar.json"];

fn names(fields: &[std::rc::Rc<Field>]) -> Vec<&str> {
    fields.iter().map(|f| f.name.as_str()).collect()
}

fn keys<V>(map: &std::collections::BTreeMap<String, V>) -> Vec<&str> {
    map.keys().map(String::as_str).collect()
}

fn no_config() -> BuildOptions {
    BuildOptions {
        config_required: false,
        ..BuildOptions::default()
    }
}

#[test]
fn fixture_package() -> Result<()> {
    let pkg = Package::build(&ManifestSource::new(), &FOO_FILES)?;
    assert_eq!(pkg.dir(), Path::new("."));
    assert_eq!(pkg.name(), "foo");
    assert_eq!(pkg.dst(), Path::new("tests/fixtures/foo"));

    let bob = pkg.struct_type("Bob").expect("Bob is a struct");
    assert_eq!(bob.name, "Bob");
    assert_eq!(bob.doc.trim(), "bob, doc");
    assert_eq!(bob.fields.len(), 3);
    assert_eq!(bob.intuitive_fields.len(), 5);
    assert_eq!(
        names(&bob.intuitive_fields),
        ["Name", "Bar", "CreatedAt", "UpdatedAt", "DeletedAt"]
    );
    assert!(bob.intuitive_field_map.get("ID").is_none());

    let name = &bob.field_map["Name"];
    assert_eq!(name.tag, r#"MGR:";lmax(16)""#);

    let bar = &bob.intuitive_field_map["Bar"];
    assert_eq!(bar.tag, r#"VIEW:";lmax(16)""#);
    assert_eq!(bar.type_string, "string");

    let foo = &bob.field_map["Foo"];
    assert_eq!(foo.type_string, "*Foo");
    assert!(foo.embedded && foo.is_ptr && foo.exported);

    let deleted = &bob.intuitive_field_map["DeletedAt"];
    assert_eq!(deleted.type_string, "*time.Time");
    assert_eq!(deleted.tag.get("sql"), "index");

    let alice = pkg.struct_type("Alice").expect("Alice is a struct");
    let expected = vec![
        TagPath::new(&["Name"], ";lmin(16)"),
        TagPath::new(&["Foo", "Bar"], ";lmax(16)"),
    ];
    assert_eq!(alice.compute_tag_paths(&pkg, "VIEW"), expected);
    assert_eq!(pkg.compute_tag_paths("Alice", "VIEW"), Some(expected));
    assert_eq!(pkg.compute_tag_paths("Alice", "MGR"), Some(vec![]));
    assert_eq!(pkg.compute_tag_paths("Boys", "VIEW"), None);
    Ok(())
}

#[test]
fn fixture_registries() -> Result<()> {
    let pkg = Package::build(&ManifestSource::new(), &FOO_FILES)?;

    assert_eq!(keys(pkg.basic_types()), ["Int"]);
    assert_eq!(pkg.basic_types()["Int"].kind, "int");
    assert_eq!(keys(pkg.struct_types()), ["Alice", "Bar", "Bob", "Foo"]);
    assert_eq!(keys(pkg.array_types()), ["Boys", "Boyss", "Ints"]);
    assert_eq!(keys(pkg.map_types()), ["BobMap", "BobsMap"]);

    for unsupported in ["IntMap", "IBar", "Sbar"] {
        assert!(!pkg.supported(unsupported), "{unsupported}");
    }

    let boyss = &pkg.array_types()["Boyss"];
    assert_eq!(boyss.elem.name, "Bob");
    assert!(boyss.elem.is_struct && boyss.elem.is_ptr);

    let ints = &pkg.array_types()["Ints"];
    assert_eq!(ints.elem.name, "int");
    assert!(!ints.elem.is_struct && !ints.elem.is_ptr);

    let bobs = &pkg.map_types()["BobsMap"];
    assert_eq!(bobs.key, "int");
    assert!(bobs.elem.is_struct && bobs.elem.is_ptr);

    let bar = pkg.struct_type("Bar").expect("Bar is a struct");
    assert_eq!(names(&bar.fields), ["Model", "Name"]);
    assert_eq!(
        names(&bar.intuitive_fields),
        ["Name", "ID", "CreatedAt", "UpdatedAt", "DeletedAt"]
    );
    assert_eq!(bar.intuitive_field_map["Name"].tag.lookup("multi"), None);

    let foo = pkg.struct_type("Foo").expect("Foo is a struct");
    let by_shape = pkg.struct_by_shape(foo.shape()).expect("registered shape");
    assert_eq!(by_shape.name, "Foo");
    Ok(())
}

#[test]
fn fixture_tools() -> Result<()> {
    let pkg = Package::build(&ManifestSource::new(), &FOO_FILES)?;
    assert_eq!(pkg.tools().keys().collect::<Vec<_>>(), ["view", "mgr"]);

    let view = pkg.tool("view").expect("view options");
    assert_eq!(view.command, "viewgen -type={{.Name}}");
    assert_eq!(
        view.types.keys().collect::<Vec<_>>(),
        ["Bob", "Alice", "Boys", "BobsMap"]
    );
    assert_eq!(view.types["Bob"]["list"], Value::from(true));
    assert_eq!(view.types["Bob"]["edit"], Value::from(true));
    assert_eq!(view.types["Boys"], Value::from(false));
    assert_eq!(view.types["BobsMap"], Value::from(true));
    assert_eq!(
        view.ignored.keys().collect::<Vec<_>>(),
        ["Boyss", "Int", "BobMap"]
    );
    assert_eq!(view.ignored["BobMap"], Value::from("plain"));
    assert_eq!(view.data["author"], Value::from("foo"));

    let mgr = pkg.tool("mgr").expect("mgr options");
    assert_eq!(mgr.command, "mgrgen");
    assert_eq!(mgr.types.keys().collect::<Vec<_>>(), ["Ints"]);
    assert_eq!(mgr.ignored.keys().collect::<Vec<_>>(), ["Bar"]);
    Ok(())
}

#[cfg(feature = "yaml")]
#[test]
fn directory_package() -> Result<()> {
    let pkg = Package::build(&ManifestSource::new(), &["tests/fixtures/single"])?;
    assert_eq!(pkg.dir(), Path::new("tests/fixtures/single"));
    assert_eq!(pkg.dst(), Path::new("tests/fixtures/single"));
    assert_eq!(pkg.name(), "single");

    let node = pkg.struct_type("Node").expect("Node is a struct");
    assert_eq!(node.doc, "Node links to the next one.");
    assert_eq!(
        node.compute_tag_paths(&pkg, "VIEW"),
        [TagPath::new(&["Name"], "name")]
    );

    let index = &pkg.map_types()["Index"];
    assert_eq!(index.key, "string");
    assert_eq!(index.elem.name, "Node");
    assert!(index.elem.is_ptr);

    let docs = pkg.tool("docs").expect("docs options");
    assert_eq!(docs.types["Node"]["depth"], Value::from(2));
    assert_eq!(docs.ignored.keys().collect::<Vec<_>>(), ["Index"]);
    Ok(())
}

// Outer embeds Left and Right, which both declare X and embed nothing else.
fn conflicting() -> SourcePackage {
    let mut pkg = SourcePackage::new("conflict");
    let t = &mut pkg.types;
    let int = t.basic("int");
    let left_shape = t.structure(vec![
        FieldDecl::new("X", int).with_tag(r#"VIEW:"left""#),
        FieldDecl::new("L", int).with_tag(r#"VIEW:"l""#),
    ]);
    let left = t.named("Left", left_shape);
    let right_shape = t.structure(vec![FieldDecl::new("X", int), FieldDecl::new("R", int)]);
    let right = t.named("Right", right_shape);
    let outer_shape = t.structure(vec![
        FieldDecl::embedded("Left", left),
        FieldDecl::embedded("Right", right),
        FieldDecl::new("own", int),
    ]);
    let outer = t.named("Outer", outer_shape);

    pkg.declare(Declaration::new("Left", left))
        .declare(Declaration::new("Right", right))
        .declare(Declaration::new("Outer", outer));
    pkg
}

#[test]
fn same_depth_conflicts_hide_the_name() -> Result<()> {
    let source = conflicting();
    let pkg = PackageBuilder::new(&source).options(no_config()).build(&["."])?;
    assert!(pkg.tools().is_empty());

    let outer = pkg.struct_type("Outer").expect("Outer is a struct");
    assert_eq!(names(&outer.fields), ["Left", "Right", "own"]);
    assert_eq!(names(&outer.intuitive_fields), ["own", "L", "R"]);
    assert!(!outer.intuitive_field_map["own"].exported);
    assert!(outer.intuitive_field_map.get("X").is_none());

    assert_eq!(
        pkg.compute_tag_paths("Outer", "VIEW"),
        Some(vec![TagPath::new(&["L"], "l")])
    );
    Ok(())
}

#[test]
fn tools_document_overrides_discovery() -> Result<()> {
    let source = conflicting();
    let document = Value::from_json_str(
        r#"{"gen": {"presets": {"p": [1, 2]}, "ignore": "struct", "types": {"Outer": "&p"}}}"#,
    )?;
    let pkg = PackageBuilder::new(&source)
        .with_tools_document(document)
        .build(&["."])?;

    let gen = pkg.tool("gen").expect("gen options");
    assert!(gen.types.is_empty());
    assert_eq!(
        gen.ignored["Outer"],
        Value::from(vec![Value::from(1), Value::from(2)])
    );
    Ok(())
}

#[test]
fn unknown_type_aborts_the_build() -> Result<()> {
    let source = conflicting();
    let document = Value::from_json_str(r#"{"gen": {"types": {"Missing": {}}}}"#)?;
    let err = PackageBuilder::new(&source)
        .with_tools_document(document)
        .build(&["."])
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::UnsupportedType { ty, .. }) if ty == "Missing"
    ));
    Ok(())
}

#[test]
fn unresolved_preset_aborts_the_build() -> Result<()> {
    let source = conflicting();
    let document = Value::from_json_str(r#"{"gen": {"types": {"Left": "&a.b"}}}"#)?;
    let err = PackageBuilder::new(&source)
        .with_tools_document(document)
        .build(&["."])
        .unwrap_err();
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::PresetNotFound { ty, preset, .. }) => {
            assert_eq!(ty, "Left");
            assert_eq!(preset, "&a.b");
        }
        other => panic!("unexpected error {other:?}"),
    }
    Ok(())
}

#[test]
fn missing_configuration() -> Result<()> {
    let source = conflicting();
    let err = Package::build(&source, &["."]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::ConfigNotFound { .. })
    ));

    let pkg = PackageBuilder::new(&source)
        .options(no_config())
        .build::<&str>(&[])?;
    assert_eq!(pkg.dir(), Path::new("."));
    assert_eq!(pkg.name(), "conflict");
    Ok(())
}

#[test]
fn unreadable_locations() -> Result<()> {
    let source = conflicting();
    let err = Package::build(&source, &["tests/fixtures/nowhere"]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::SourceLocation { .. })
    ));

    let err = PackageBuilder::new(&ManifestSource::new())
        .options(no_config())
        .build(&["tests/fixtures"])
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::Declarations { .. })
    ));
    Ok(())
}

#[test]
fn malformed_graphs_are_rejected() {
    let mut source = SourcePackage::new("broken");
    let dangling = source.types.pointer(TypeId(42));
    source.declare(Declaration::new("P", dangling));
    let result = PackageBuilder::new(&source).options(no_config()).build(&["."]);
    assert!(result.is_err());

    let mut source = SourcePackage::new("broken");
    source.declare(Declaration::new("Q", TypeId(42)));
    let err = PackageBuilder::new(&source)
        .options(no_config())
        .build(&["."])
        .unwrap_err();
    assert!(format!("{err:#}").contains("declaration Q"));
}

#[test]
fn split_package_shares_one_type_graph() -> Result<()> {
    let files = ["tests/fixtures/split/a.json", "tests/fixtures/split/b.json"];
    let pkg = PackageBuilder::new(&ManifestSource::new())
        .options(no_config())
        .build(&files)?;
    assert_eq!(pkg.name(), "split");
    assert_eq!(keys(pkg.struct_types()), ["Bob", "Club"]);

    let team = &pkg.array_types()["Team"];
    assert_eq!(team.elem.name, "Bob");
    assert!(team.elem.is_struct && !team.elem.is_ptr);

    assert_eq!(
        pkg.compute_tag_paths("Club", "VIEW"),
        Some(vec![TagPath::new(&["Lead", "N"], "n")])
    );
    Ok(())
}

#[test]
fn tagged_struct_fields_end_the_descent() -> Result<()> {
    let mut source = SourcePackage::new("stop");
    let t = &mut source.types;
    let string = t.basic("string");
    let inner_shape = t.structure(vec![FieldDecl::new("Bar", string).with_tag(r#"VIEW:"bar""#)]);
    let inner = t.named("Inner", inner_shape);
    let inner_ptr = t.pointer(inner);
    let outer_shape = t.structure(vec![
        FieldDecl::new("Tagged", inner_ptr).with_tag(r#"VIEW:"x""#),
        FieldDecl::new("Plain", inner),
    ]);
    let outer = t.named("Outer", outer_shape);
    source
        .declare(Declaration::new("Inner", inner))
        .declare(Declaration::new("Outer", outer));

    let pkg = PackageBuilder::new(&source).options(no_config()).build(&["."])?;
    assert_eq!(
        pkg.compute_tag_paths("Outer", "VIEW"),
        Some(vec![
            TagPath::new(&["Tagged"], "x"),
            TagPath::new(&["Plain", "Bar"], "bar"),
        ])
    );
    Ok(())
}
