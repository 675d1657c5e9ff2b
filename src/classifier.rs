// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::model::{Array, Basic, Element, Map};
use crate::source::{Declaration, TypeId, TypeKind, TypeTable};

use std::collections::BTreeMap;

/// Outcome of classifying one package-scope declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Classified {
    Basic(Basic),
    /// A record; carries its struct shape. Fields are resolved separately.
    Struct(TypeId),
    Array(Array),
    Map(Map),
    /// Nothing to model. Carries the display form of the offending type.
    Unsupported(String),
}

/// Index from struct shape to the name of the first declaration with it.
pub(crate) type ShapeIndex = BTreeMap<TypeId, String>;

pub(crate) struct Classifier<'a> {
    types: &'a TypeTable,
    shapes: &'a ShapeIndex,
}

impl<'a> Classifier<'a> {
    pub(crate) fn new(types: &'a TypeTable, shapes: &'a ShapeIndex) -> Self {
        Self { types, shapes }
    }

    /// Register every struct declaration by shape. When two declarations
    /// share a shape the first one in `declarations` order keeps it.
    pub(crate) fn index_shapes(types: &TypeTable, declarations: &[Declaration]) -> ShapeIndex {
        let mut shapes = ShapeIndex::new();
        for decl in declarations {
            let shape = types.underlying(decl.ty);
            if matches!(types.kind(shape), TypeKind::Struct { .. }) {
                shapes.entry(shape).or_insert_with(|| decl.name.clone());
            }
        }
        shapes
    }

    pub(crate) fn classify(&self, decl: &Declaration) -> Classified {
        let shape = self.types.underlying(decl.ty);
        match self.types.kind(shape) {
            TypeKind::Basic(kind) => Classified::Basic(Basic {
                name: decl.name.clone(),
                kind: kind.clone(),
                doc: decl.doc.clone(),
            }),
            TypeKind::Struct { .. } => Classified::Struct(shape),
            TypeKind::Pointer(pointee) => {
                let pointee = self.types.underlying(*pointee);
                match self.types.kind(pointee) {
                    TypeKind::Slice(_) | TypeKind::Array { .. } | TypeKind::Map { .. } => {
                        self.collection(decl, pointee)
                    }
                    _ => Classified::Unsupported(self.types.display(shape)),
                }
            }
            TypeKind::Slice(_) | TypeKind::Array { .. } | TypeKind::Map { .. } => {
                self.collection(decl, shape)
            }
            TypeKind::Named { .. } | TypeKind::Opaque(_) => {
                Classified::Unsupported(self.types.display(shape))
            }
        }
    }

    fn collection(&self, decl: &Declaration, shape: TypeId) -> Classified {
        match self.types.kind(shape) {
            TypeKind::Slice(elem) | TypeKind::Array { elem, .. } => match self.element(*elem) {
                Some(elem) => Classified::Array(Array {
                    name: decl.name.clone(),
                    elem,
                    doc: decl.doc.clone(),
                }),
                None => Classified::Unsupported(self.types.display(*elem)),
            },
            TypeKind::Map { key, value } => {
                let Some(key) = self.scalar(*key) else {
                    return Classified::Unsupported(self.types.display(*key));
                };
                match self.element(*value) {
                    Some(elem) => Classified::Map(Map {
                        name: decl.name.clone(),
                        key,
                        elem,
                        doc: decl.doc.clone(),
                    }),
                    None => Classified::Unsupported(self.types.display(*value)),
                }
            }
            _ => Classified::Unsupported(self.types.display(shape)),
        }
    }

    /// Representation of a sequence or map element; `None` when the element
    /// is neither a scalar nor a struct declared in this package.
    pub(crate) fn element(&self, ty: TypeId) -> Option<Element> {
        let shape = self.types.underlying(ty);
        match self.types.kind(shape) {
            TypeKind::Basic(kind) => Some(Element {
                name: kind.clone(),
                is_struct: false,
                is_ptr: false,
            }),
            TypeKind::Struct { .. } => self.shapes.get(&shape).map(|name| Element {
                name: name.clone(),
                is_struct: true,
                is_ptr: false,
            }),
            TypeKind::Pointer(pointee) => self.element(*pointee).map(|elem| Element {
                is_ptr: true,
                ..elem
            }),
            _ => None,
        }
    }

    /// Map keys must be predeclared scalars; named scalar types do not qualify.
    fn scalar(&self, ty: TypeId) -> Option<String> {
        match self.types.kind(ty) {
            TypeKind::Basic(kind) => Some(kind.clone()),
            _ => None,
        }
    }
}
