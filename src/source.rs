// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.
#![allow(clippy::indexing_slicing)] // ids are checked by TypeTable::validate

//! Declarations handed over by the external type checker.
//!
//! The type checker itself is out of reach of this crate: it is modelled as a
//! [`DeclarationSource`] that yields a [`SourcePackage`], i.e. the package name,
//! an arena of resolved types and the package-scope named declarations.
//! Type identity is arena identity: two shapes are the same type iff their
//! [`TypeId`]s are equal.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use log::debug;
use serde::{Deserialize, Serialize};

/// Handle of a type in a [`TypeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(pub usize);

/// A struct member as declared in source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(default)]
    pub embedded: bool,
    #[serde(rename = "type")]
    pub ty: TypeId,
    #[serde(default)]
    pub tag: String,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            embedded: false,
            ty,
            tag: String::new(),
        }
    }

    /// An anonymous member; `name` is the name of its type.
    pub fn embedded(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            embedded: true,
            ..Self::new(name, ty)
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// Predeclared scalar such as `int` or `string`.
    Basic(String),
    /// Named type. `package` is `None` for the package under build.
    Named {
        name: String,
        #[serde(default)]
        package: Option<String>,
        underlying: TypeId,
    },
    Struct {
        #[serde(default)]
        fields: Vec<FieldDecl>,
    },
    Pointer(TypeId),
    Slice(TypeId),
    Array { len: u64, elem: TypeId },
    Map { key: TypeId, value: TypeId },
    /// Interfaces, functions, channels and anything else without a model.
    Opaque(String),
}

impl TypeKind {
    fn retarget(&mut self, mut f: impl FnMut(&mut TypeId)) {
        match self {
            TypeKind::Named { underlying, .. } => f(underlying),
            TypeKind::Struct { fields } => fields.iter_mut().for_each(|field| f(&mut field.ty)),
            TypeKind::Pointer(elem) | TypeKind::Slice(elem) | TypeKind::Array { elem, .. } => {
                f(elem)
            }
            TypeKind::Map { key, value } => {
                f(key);
                f(value);
            }
            TypeKind::Basic(_) | TypeKind::Opaque(_) => (),
        }
    }

    fn references(&self) -> Vec<TypeId> {
        match self {
            TypeKind::Named { underlying, .. } => vec![*underlying],
            TypeKind::Struct { fields } => fields.iter().map(|f| f.ty).collect(),
            TypeKind::Pointer(elem) | TypeKind::Slice(elem) | TypeKind::Array { elem, .. } => {
                vec![*elem]
            }
            TypeKind::Map { key, value } => vec![*key, *value],
            TypeKind::Basic(_) | TypeKind::Opaque(_) => vec![],
        }
    }
}

/// Arena of resolved types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeTable {
    kinds: Vec<TypeKind>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn push(&mut self, kind: TypeKind) -> TypeId {
        self.kinds.push(kind);
        TypeId(self.kinds.len() - 1)
    }

    pub fn basic(&mut self, name: &str) -> TypeId {
        self.push(TypeKind::Basic(name.to_string()))
    }

    pub fn structure(&mut self, fields: Vec<FieldDecl>) -> TypeId {
        self.push(TypeKind::Struct { fields })
    }

    /// Named type of the package under build.
    pub fn named(&mut self, name: &str, underlying: TypeId) -> TypeId {
        self.push(TypeKind::Named {
            name: name.to_string(),
            package: None,
            underlying,
        })
    }

    /// Named type imported from another package.
    pub fn foreign(&mut self, package: &str, name: &str, underlying: TypeId) -> TypeId {
        self.push(TypeKind::Named {
            name: name.to_string(),
            package: Some(package.to_string()),
            underlying,
        })
    }

    /// Reserve a named type whose underlying type is supplied later with
    /// [`TypeTable::define`]. Needed for self-referential declarations.
    pub fn declare(&mut self, name: &str) -> TypeId {
        let id = TypeId(self.kinds.len());
        self.named(name, id)
    }

    pub fn define(&mut self, named: TypeId, definition: TypeId) -> Result<()> {
        match self.kinds.get_mut(named.0) {
            Some(TypeKind::Named { underlying, .. }) => {
                *underlying = definition;
                Ok(())
            }
            _ => bail!("type {} is not a named type", named.0),
        }
    }

    pub fn pointer(&mut self, elem: TypeId) -> TypeId {
        self.push(TypeKind::Pointer(elem))
    }

    pub fn slice(&mut self, elem: TypeId) -> TypeId {
        self.push(TypeKind::Slice(elem))
    }

    pub fn array(&mut self, len: u64, elem: TypeId) -> TypeId {
        self.push(TypeKind::Array { len, elem })
    }

    pub fn map(&mut self, key: TypeId, value: TypeId) -> TypeId {
        self.push(TypeKind::Map { key, value })
    }

    pub fn opaque(&mut self, display: &str) -> TypeId {
        self.push(TypeKind::Opaque(display.to_string()))
    }

    pub fn get(&self, id: TypeId) -> Option<&TypeKind> {
        self.kinds.get(id.0)
    }

    pub(crate) fn kind(&self, id: TypeId) -> &TypeKind {
        &self.kinds[id.0]
    }

    /// Check that every reference is in range and that no named type is
    /// defined in terms of itself.
    pub fn validate(&self) -> Result<()> {
        for (idx, kind) in self.kinds.iter().enumerate() {
            for r in kind.references() {
                if r.0 >= self.kinds.len() {
                    bail!("type {idx} references undefined type {}", r.0);
                }
            }
        }
        for idx in 0..self.kinds.len() {
            let mut id = TypeId(idx);
            let mut hops = 0;
            while let TypeKind::Named { name, underlying, .. } = self.kind(id) {
                hops += 1;
                if hops > self.kinds.len() {
                    bail!("named type {name} has no underlying definition");
                }
                id = *underlying;
            }
        }
        Ok(())
    }

    /// Follow named types down to the structural type they stand for.
    pub fn underlying(&self, mut id: TypeId) -> TypeId {
        while let TypeKind::Named { underlying, .. } = self.kind(id) {
            id = *underlying;
        }
        id
    }

    pub fn is_struct(&self, id: TypeId) -> bool {
        matches!(self.kind(self.underlying(id)), TypeKind::Struct { .. })
    }

    /// Members of the struct `id` resolves to; empty for anything else.
    pub fn struct_fields(&self, id: TypeId) -> &[FieldDecl] {
        match self.kind(self.underlying(id)) {
            TypeKind::Struct { fields } => fields,
            _ => &[],
        }
    }

    /// Render a type the way it is spelled in source, with types of the
    /// package under build left unqualified.
    pub fn display(&self, id: TypeId) -> String {
        match self.kind(id) {
            TypeKind::Basic(name) => name.clone(),
            TypeKind::Named {
                name,
                package: Some(package),
                ..
            } => format!("{package}.{name}"),
            TypeKind::Named { name, .. } => name.clone(),
            TypeKind::Struct { fields } => {
                let members: Vec<String> = fields
                    .iter()
                    .map(|f| {
                        let mut member = match f.embedded {
                            true => self.display(f.ty),
                            false => format!("{} {}", f.name, self.display(f.ty)),
                        };
                        if !f.tag.is_empty() {
                            member.push_str(&format!(" {:?}", f.tag));
                        }
                        member
                    })
                    .collect();
                format!("struct{{{}}}", members.join("; "))
            }
            TypeKind::Pointer(elem) => format!("*{}", self.display(*elem)),
            TypeKind::Slice(elem) => format!("[]{}", self.display(*elem)),
            TypeKind::Array { len, elem } => format!("[{len}]{}", self.display(*elem)),
            TypeKind::Map { key, value } => {
                format!("map[{}]{}", self.display(*key), self.display(*value))
            }
            TypeKind::Opaque(display) => display.clone(),
        }
    }

    /// Move every type of `other` into this table and return the id offset
    /// that was applied to them.
    fn append(&mut self, other: TypeTable) -> usize {
        let offset = self.kinds.len();
        self.kinds.extend(other.kinds.into_iter().map(|mut k| {
            k.retarget(|id| id.0 += offset);
            k
        }));
        offset
    }

    /// Point every named type at or after `from` that repeats an earlier one
    /// (same name and package) to the earlier entry. Returns the redirections.
    fn unify_named(&mut self, from: usize) -> BTreeMap<TypeId, TypeId> {
        let mut seen: BTreeMap<(Option<String>, String), TypeId> = BTreeMap::new();
        let mut redirect = BTreeMap::new();
        for (idx, kind) in self.kinds.iter().enumerate() {
            let TypeKind::Named { name, package, .. } = kind else {
                continue;
            };
            let key = (package.clone(), name.clone());
            match seen.get(&key) {
                Some(first) if idx >= from => {
                    redirect.insert(TypeId(idx), *first);
                }
                Some(_) => (),
                None => {
                    seen.insert(key, TypeId(idx));
                }
            }
        }
        for kind in self.kinds.iter_mut().skip(from) {
            kind.retarget(|id| {
                if let Some(first) = redirect.get(id) {
                    *id = *first;
                }
            });
        }
        redirect
    }
}

/// Go's exported-identifier rule.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// A package-scope named type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeId,
    #[serde(default)]
    pub doc: String,
}

impl Declaration {
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
            doc: String::new(),
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }
}

/// Everything the type checker reports about one package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePackage {
    pub name: String,
    #[serde(default)]
    pub types: TypeTable,
    #[serde(default)]
    pub declarations: Vec<Declaration>,
}

impl SourcePackage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn declare(&mut self, declaration: Declaration) -> &mut Self {
        self.declarations.push(declaration);
        self
    }

    /// Merge another part of the same package into this one.
    ///
    /// Named types already known here, by package and name, keep their
    /// existing id so that both parts share one type graph. A declaration
    /// repeated by `other` is dropped.
    pub fn merge(&mut self, other: SourcePackage) -> Result<()> {
        if self.name != other.name {
            bail!("found packages {} and {}", self.name, other.name);
        }
        let offset = self.types.append(other.types);
        let redirect = self.types.unify_named(offset);
        for mut decl in other.declarations {
            decl.ty.0 += offset;
            if let Some(first) = redirect.get(&decl.ty) {
                decl.ty = *first;
            }
            if self.declarations.iter().any(|d| d.name == decl.name) {
                debug!("{} is declared more than once", decl.name);
                continue;
            }
            self.declarations.push(decl);
        }
        Ok(())
    }

    /// Check the type graph and that every declaration names a known type.
    pub fn validate(&self) -> Result<()> {
        for decl in &self.declarations {
            if decl.ty.0 >= self.types.len() {
                bail!("declaration {} references undefined type {}", decl.name, decl.ty.0);
            }
        }
        self.types.validate()
    }
}

/// The sources a package is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSet {
    /// Every compilable file of one directory.
    Directory(PathBuf),
    /// An explicit list of files.
    Files(Vec<PathBuf>),
}

impl SourceSet {
    /// Directory that holds the sources and the generator configuration.
    pub fn base_dir(&self) -> PathBuf {
        match self {
            SourceSet::Directory(dir) => dir.clone(),
            SourceSet::Files(files) => files
                .first()
                .and_then(|f| f.parent())
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            SourceSet::Directory(dir) => dir.display().to_string(),
            SourceSet::Files(files) => files
                .iter()
                .map(|f| f.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// The type-checking front end.
///
/// Implementations parse and type check the given sources and report the
/// package-scope named declarations with fully resolved types. Any failure is
/// fatal for the build.
pub trait DeclarationSource {
    fn resolve_declarations(&self, sources: &SourceSet) -> Result<SourcePackage>;
}

/// An already resolved package serves itself regardless of location.
impl DeclarationSource for SourcePackage {
    fn resolve_declarations(&self, _sources: &SourceSet) -> Result<SourcePackage> {
        Ok(self.clone())
    }
}

/// Reads pre-resolved declaration graphs from JSON or YAML manifests.
///
/// In directory mode the first existing manifest among `file_names` is used.
/// In file mode every listed `.json`/`.yaml`/`.yml` file is loaded and merged;
/// other files are skipped. Each manifest is a complete type graph on its
/// own; named types repeated across manifests are matched by package and name.
#[derive(Debug, Clone)]
pub struct ManifestSource {
    file_names: Vec<String>,
}

impl Default for ManifestSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestSource {
    pub fn new() -> Self {
        Self {
            file_names: vec![
                "declarations.json".to_string(),
                "declarations.yaml".to_string(),
                "declarations.yml".to_string(),
            ],
        }
    }

    pub fn with_file_names(file_names: Vec<String>) -> Self {
        Self { file_names }
    }

    fn load(path: &Path) -> Result<Option<SourcePackage>> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        let parse: fn(&str) -> Result<SourcePackage> = match ext {
            "json" => |text: &str| -> Result<SourcePackage> { Ok(serde_json::from_str(text)?) },
            #[cfg(feature = "yaml")]
            "yaml" | "yml" => |text: &str| -> Result<SourcePackage> { Ok(serde_yaml::from_str(text)?) },
            _ => return Ok(None),
        };
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => bail!("Failed to read {}. {e}", path.display()),
        };
        match parse(&text) {
            Ok(package) => Ok(Some(package)),
            Err(e) => bail!("parsing manifest {}: {e}", path.display()),
        }
    }
}

impl DeclarationSource for ManifestSource {
    fn resolve_declarations(&self, sources: &SourceSet) -> Result<SourcePackage> {
        let files: Vec<PathBuf> = match sources {
            SourceSet::Directory(dir) => {
                match self.file_names.iter().map(|n| dir.join(n)).find(|p| p.is_file()) {
                    Some(path) => vec![path],
                    None => bail!("{}: no declaration manifest", dir.display()),
                }
            }
            SourceSet::Files(files) => files.clone(),
        };

        let mut package: Option<SourcePackage> = None;
        for file in &files {
            let Some(part) = Self::load(file)? else {
                debug!("skipping {}", file.display());
                continue;
            };
            match package.as_mut() {
                Some(p) => p.merge(part)?,
                None => package = Some(part),
            }
        }

        match package {
            Some(p) => Ok(p),
            None => bail!("{}: no declaration manifests", sources.describe()),
        }
    }
}
