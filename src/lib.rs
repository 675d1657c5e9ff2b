// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

mod classifier;
mod config;
mod error;
mod fields;
mod model;
mod number;
mod package;
pub mod path;
mod source;
mod tag;
mod tag_path;
mod value;

pub use config::{
    load_tools, Category, ElementKind, IgnoreRule, Indirection, JsonOptions, Tools,
};
pub use error::{BuildError, PathError};
pub use model::{Array, Basic, Element, Field, Map, Struct, TagPath};
pub use number::Number;
pub use package::{BuildOptions, Package, PackageBuilder, Registries};
pub use source::{
    is_exported, Declaration, DeclarationSource, FieldDecl, ManifestSource, SourcePackage,
    SourceSet, TypeId, TypeKind, TypeTable,
};
pub use tag::StructTag;
pub use value::Value;
