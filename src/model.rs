// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::source::{is_exported, FieldDecl, TypeId, TypeKind, TypeTable};
use crate::tag::StructTag;

use std::collections::BTreeMap;
use std::rc::Rc;

use serde::Serialize;

/// Named scalar type, e.g. `type Int int`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Basic {
    pub name: String,
    /// Name of the underlying scalar kind.
    pub kind: String,
    pub doc: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    pub embedded: bool,
    pub exported: bool,
    pub type_string: String,
    pub is_ptr: bool,
    pub tag: StructTag,
    #[serde(skip)]
    underlying: TypeId,
}

impl Field {
    pub(crate) fn new(types: &TypeTable, decl: &FieldDecl) -> Self {
        let mut underlying = types.underlying(decl.ty);
        let mut is_ptr = false;
        if let TypeKind::Pointer(elem) = types.kind(underlying) {
            is_ptr = true;
            underlying = types.underlying(*elem);
        }
        Self {
            name: decl.name.clone(),
            embedded: decl.embedded,
            exported: is_exported(&decl.name),
            type_string: types.display(decl.ty),
            is_ptr,
            tag: StructTag::new(decl.tag.as_str()),
            underlying,
        }
    }

    /// Structural type of the field with names resolved and one pointer
    /// level removed.
    pub fn underlying_type(&self) -> TypeId {
        self.underlying
    }
}

/// Composite record with both its literal and its promoted field sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Struct {
    pub name: String,
    pub doc: String,

    /// Fields as written in the declaration, embedded members included.
    pub fields: Vec<Rc<Field>>,
    pub field_map: BTreeMap<String, Rc<Field>>,

    /// Fields reachable by selector after promotion. Embedded struct members
    /// are replaced by what they promote; other embedded members stay.
    pub intuitive_fields: Vec<Rc<Field>>,
    pub intuitive_field_map: BTreeMap<String, Rc<Field>>,

    #[serde(skip)]
    pub(crate) shape: TypeId,
}

impl Struct {
    pub(crate) fn new(name: &str, doc: &str, shape: TypeId) -> Self {
        Self {
            name: name.to_string(),
            doc: doc.to_string(),
            fields: vec![],
            field_map: BTreeMap::new(),
            intuitive_fields: vec![],
            intuitive_field_map: BTreeMap::new(),
            shape,
        }
    }

    /// Identity of the struct type this declaration names.
    pub fn shape(&self) -> TypeId {
        self.shape
    }
}

/// How a sequence or map element is represented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    /// Scalar kind, or the name of a struct declared in the package.
    pub name: String,
    pub is_struct: bool,
    pub is_ptr: bool,
}

/// Named slice or array type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Array {
    pub name: String,
    pub elem: Element,
    pub doc: String,
}

/// Named map type with a scalar key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Map {
    pub name: String,
    pub key: String,
    pub elem: Element,
    pub doc: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagPath {
    pub path: Vec<String>,
    pub value: String,
}

impl TagPath {
    pub fn new<S: AsRef<str>>(path: &[S], value: &str) -> Self {
        Self {
            path: path.iter().map(|s| s.as_ref().to_string()).collect(),
            value: value.to_string(),
        }
    }
}
