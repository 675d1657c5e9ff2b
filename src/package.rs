// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::classifier::{Classified, Classifier};
use crate::config::{self, JsonOptions, Tools};
use crate::error::BuildError;
use crate::fields::resolve_fields;
use crate::model::{Array, Basic, Map, Struct, TagPath};
use crate::source::{DeclarationSource, SourceSet, TypeId, TypeTable};
use crate::value::Value;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::Result;
use log::{debug, info};

/// Knobs for [`PackageBuilder`].
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Fail when no configuration document is found next to the sources.
    pub config_required: bool,
    /// Configuration file names tried in order.
    pub config_file_names: Vec<String>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            config_required: true,
            config_file_names: vec![
                "autogens.json5".to_string(),
                "autogens.json".to_string(),
                "autogens.yaml".to_string(),
                "autogens.yml".to_string(),
            ],
        }
    }
}

/// Declarations of a package by category, keyed by declared name.
#[derive(Debug, Clone, Default)]
pub struct Registries {
    pub basic_types: BTreeMap<String, Basic>,
    pub struct_types: BTreeMap<String, Rc<Struct>>,
    pub array_types: BTreeMap<String, Array>,
    pub map_types: BTreeMap<String, Map>,
}

impl Registries {
    /// Whether `name` was registered in any category.
    pub fn supported(&self, name: &str) -> bool {
        self.basic_types.contains_key(name)
            || self.struct_types.contains_key(name)
            || self.array_types.contains_key(name)
            || self.map_types.contains_key(name)
    }
}

/// Assembles a [`Package`] from a declaration source and a configuration
/// document.
pub struct PackageBuilder<'a> {
    source: &'a dyn DeclarationSource,
    options: BuildOptions,
    tools_document: Option<Value>,
}

impl<'a> PackageBuilder<'a> {
    pub fn new(source: &'a dyn DeclarationSource) -> Self {
        Self {
            source,
            options: BuildOptions::default(),
            tools_document: None,
        }
    }

    pub fn options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Use `document` as the configuration instead of looking for a file.
    pub fn with_tools_document(mut self, document: Value) -> Self {
        self.tools_document = Some(document);
        self
    }

    /// Build the package found at `locations`: nothing means the current
    /// directory, a single directory means the whole package in it, anything
    /// else is a list of files.
    pub fn build<P: AsRef<Path>>(self, locations: &[P]) -> Result<Package> {
        let mut locations: Vec<PathBuf> =
            locations.iter().map(|p| p.as_ref().to_path_buf()).collect();
        let first = match locations.first() {
            Some(first) => first.clone(),
            None => {
                locations.push(PathBuf::from("."));
                PathBuf::from(".")
            }
        };

        let metadata = std::fs::metadata(&first).map_err(|source| BuildError::SourceLocation {
            path: first.clone(),
            source,
        })?;
        let (dir, dst, sources) = if locations.len() == 1 && metadata.is_dir() {
            (first.clone(), first.clone(), SourceSet::Directory(first))
        } else {
            let sources = SourceSet::Files(locations);
            (PathBuf::from("."), sources.base_dir(), sources)
        };

        let mut tools = self.load_tools(&sources.base_dir())?;

        let resolved = self
            .source
            .resolve_declarations(&sources)
            .map_err(|e| BuildError::Declarations {
                location: sources.describe(),
                cause: format!("{e:#}"),
            })?;
        resolved.validate()?;

        let mut declarations = resolved.declarations;
        declarations.sort_by(|a, b| a.name.cmp(&b.name));

        let types = resolved.types;
        let shapes = Classifier::index_shapes(&types, &declarations);
        let classifier = Classifier::new(&types, &shapes);

        let mut registries = Registries::default();
        for decl in &declarations {
            match classifier.classify(decl) {
                Classified::Basic(basic) => {
                    registries.basic_types.insert(decl.name.clone(), basic);
                }
                Classified::Struct(shape) => {
                    let mut s = Struct::new(&decl.name, &decl.doc, shape);
                    resolve_fields(&types, &mut s);
                    registries.struct_types.insert(decl.name.clone(), Rc::new(s));
                }
                Classified::Array(array) => {
                    registries.array_types.insert(decl.name.clone(), array);
                }
                Classified::Map(map) => {
                    registries.map_types.insert(decl.name.clone(), map);
                }
                Classified::Unsupported(ty) => {
                    info!("{}: skipping unsupported type {ty}", decl.name);
                }
            }
        }

        for (tool, options) in tools.iter_mut() {
            options.process(tool, &registries)?;
        }

        let struct_by_shape = shapes
            .into_iter()
            .filter_map(|(shape, name)| {
                registries
                    .struct_types
                    .get(&name)
                    .map(|s| (shape, s.clone()))
            })
            .collect();

        Ok(Package {
            dir,
            name: resolved.name,
            dst,
            types,
            registries,
            struct_by_shape,
            tools,
        })
    }

    fn load_tools(&self, base_dir: &Path) -> Result<Tools> {
        if let Some(document) = &self.tools_document {
            let serde_json::Value::Object(document) = serde_json::to_value(document)? else {
                return Err(BuildError::ToolOptions {
                    tool: String::new(),
                    cause: format!("expected an object of generator options, found {document}"),
                }
                .into());
            };
            return Ok(config::decode_tools(document)?);
        }

        match config::find_config(base_dir, &self.options.config_file_names) {
            Some(path) => Ok(config::load_tools(&path)?),
            None if self.options.config_required => Err(BuildError::ConfigNotFound {
                dir: base_dir.to_path_buf(),
            }
            .into()),
            None => {
                debug!("building without generator options");
                Ok(Tools::new())
            }
        }
    }
}

/// Metadata of one package, ready for generators. Read only.
#[derive(Debug, Clone)]
pub struct Package {
    dir: PathBuf,
    name: String,
    dst: PathBuf,
    types: TypeTable,
    registries: Registries,
    struct_by_shape: BTreeMap<TypeId, Rc<Struct>>,
    tools: Tools,
}

impl Package {
    /// Build with default options. See [`PackageBuilder::build`].
    pub fn build<P: AsRef<Path>>(source: &dyn DeclarationSource, locations: &[P]) -> Result<Self> {
        PackageBuilder::new(source).build(locations)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where generated files belong.
    pub fn dst(&self) -> &Path {
        &self.dst
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    pub fn basic_types(&self) -> &BTreeMap<String, Basic> {
        &self.registries.basic_types
    }

    pub fn struct_types(&self) -> &BTreeMap<String, Rc<Struct>> {
        &self.registries.struct_types
    }

    pub fn array_types(&self) -> &BTreeMap<String, Array> {
        &self.registries.array_types
    }

    pub fn map_types(&self) -> &BTreeMap<String, Map> {
        &self.registries.map_types
    }

    pub fn struct_type(&self, name: &str) -> Option<&Rc<Struct>> {
        self.registries.struct_types.get(name)
    }

    pub fn tools(&self) -> &Tools {
        &self.tools
    }

    pub fn tool(&self, name: &str) -> Option<&JsonOptions> {
        self.tools.get(name)
    }

    /// The struct declared with exactly this shape, if any.
    pub fn struct_by_shape(&self, shape: TypeId) -> Option<&Rc<Struct>> {
        self.struct_by_shape.get(&shape)
    }

    pub fn supported(&self, name: &str) -> bool {
        self.registries.supported(name)
    }

    pub fn compute_tag_paths(&self, struct_name: &str, key: &str) -> Option<Vec<TagPath>> {
        self.struct_type(struct_name)
            .map(|s| s.compute_tag_paths(self, key))
    }
}
