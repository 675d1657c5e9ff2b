// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::error::BuildError;
use crate::package::Registries;
use crate::path;
use crate::value::Value;

use core::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Deserializer, Serialize};

/// Generator name to its options, in document order.
pub type Tools = IndexMap<String, JsonOptions>;

/// Options of one generator.
///
/// Option names are matched without regard to case (`Command`, `TYPES`).
/// Keys inside `presets`, `types` and `data` are kept as written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonOptions {
    pub command: String,

    /// Shared option blocks that `types` entries refer to as `"&a.b"`.
    pub presets: Value,

    /// Ignore rule names as written; each entry may hold several rules
    /// separated by commas.
    #[serde(deserialize_with = "string_or_list")]
    pub ignore: Vec<String>,

    /// Per-type options that survived the ignore rules.
    pub types: IndexMap<String, Value>,

    /// Per-type options removed by an ignore rule.
    #[serde(skip_deserializing)]
    pub ignored: IndexMap<String, Value>,

    /// Passed through to the generator untouched.
    pub data: Value,
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Ignore {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<Ignore>::deserialize(deserializer)? {
        Some(Ignore::One(s)) => vec![s],
        Some(Ignore::Many(v)) => v,
        None => vec![],
    })
}

impl JsonOptions {
    /// Rule names after splitting on commas and trimming; empty names dropped.
    pub fn ignore_names(&self) -> Vec<String> {
        self.ignore
            .join(",")
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn ignore_rules(&self) -> Vec<IgnoreRule> {
        self.ignore_names()
            .iter()
            .map(|n| IgnoreRule::parse(n))
            .collect()
    }

    /// Check every type entry against the package, expand preset references
    /// and move ignored entries aside. Entry order is kept.
    pub(crate) fn process(&mut self, tool: &str, registries: &Registries) -> Result<(), BuildError> {
        let rules = self.ignore_rules();
        let entries = std::mem::take(&mut self.types);
        self.ignored = IndexMap::new();

        for (ty, mut value) in entries {
            if !registries.supported(&ty) {
                return Err(BuildError::UnsupportedType {
                    tool: tool.to_string(),
                    ty,
                });
            }

            let reference = match &value {
                Value::String(quote) if quote.starts_with('&') => Some(quote.to_string()),
                _ => None,
            };
            if let Some(quote) = reference {
                let preset = quote.strip_prefix('&').unwrap_or(&quote);
                value = path::resolve(&self.presets, preset).map_err(|source| {
                    BuildError::PresetNotFound {
                        tool: tool.to_string(),
                        ty: ty.clone(),
                        preset: quote.clone(),
                        source,
                    }
                })?;
            }

            if rules.iter().any(|r| r.matches(&ty, registries)) {
                debug!("{tool}: ignoring {ty}");
                self.ignored.insert(ty, value);
            } else {
                self.types.insert(ty, value);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Array,
    Map,
}

/// Which collection elements a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Any,
    Struct,
    Basic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indirection {
    Any,
    /// `*` suffix: elements held by pointer.
    Pointer,
    /// `&` suffix: elements held by value.
    Value,
}

/// A parsed ignore rule such as `struct_map*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreRule {
    Basic,
    Struct,
    Collection {
        category: Category,
        elem: ElementKind,
        indirection: Indirection,
    },
    /// Not part of the vocabulary; matches nothing.
    Unknown(String),
}

impl IgnoreRule {
    pub fn parse(name: &str) -> Self {
        match name {
            "basic" => return IgnoreRule::Basic,
            "struct" => return IgnoreRule::Struct,
            _ => (),
        }

        let (base, indirection) = if let Some(base) = name.strip_suffix('*') {
            (base, Indirection::Pointer)
        } else if let Some(base) = name.strip_suffix('&') {
            (base, Indirection::Value)
        } else {
            (name, Indirection::Any)
        };
        let (base, elem) = if let Some(base) = base.strip_prefix("struct_") {
            (base, ElementKind::Struct)
        } else if let Some(base) = base.strip_prefix("basic_") {
            (base, ElementKind::Basic)
        } else {
            (base, ElementKind::Any)
        };
        let category = match base {
            "array" => Category::Array,
            "map" => Category::Map,
            _ => return IgnoreRule::Unknown(name.to_string()),
        };

        IgnoreRule::Collection {
            category,
            elem,
            indirection,
        }
    }

    pub fn matches(&self, ty: &str, registries: &Registries) -> bool {
        match self {
            IgnoreRule::Basic => registries.basic_types.contains_key(ty),
            IgnoreRule::Struct => registries.struct_types.contains_key(ty),
            IgnoreRule::Collection {
                category,
                elem,
                indirection,
            } => {
                let element = match category {
                    Category::Array => registries.array_types.get(ty).map(|a| &a.elem),
                    Category::Map => registries.map_types.get(ty).map(|m| &m.elem),
                };
                let Some(element) = element else {
                    return false;
                };
                let kind = match elem {
                    ElementKind::Any => true,
                    ElementKind::Struct => element.is_struct,
                    ElementKind::Basic => !element.is_struct,
                };
                let held = match indirection {
                    Indirection::Any => true,
                    Indirection::Pointer => element.is_ptr,
                    Indirection::Value => !element.is_ptr,
                };
                kind && held
            }
            IgnoreRule::Unknown(_) => false,
        }
    }
}

impl fmt::Display for IgnoreRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreRule::Basic => f.write_str("basic"),
            IgnoreRule::Struct => f.write_str("struct"),
            IgnoreRule::Collection {
                category,
                elem,
                indirection,
            } => {
                let elem = match elem {
                    ElementKind::Any => "",
                    ElementKind::Struct => "struct_",
                    ElementKind::Basic => "basic_",
                };
                let category = match category {
                    Category::Array => "array",
                    Category::Map => "map",
                };
                let indirection = match indirection {
                    Indirection::Any => "",
                    Indirection::Pointer => "*",
                    Indirection::Value => "&",
                };
                write!(f, "{elem}{category}{indirection}")
            }
            IgnoreRule::Unknown(name) => f.write_str(name),
        }
    }
}

/// First of `file_names` present in `dir`.
pub(crate) fn find_config(dir: &Path, file_names: &[String]) -> Option<PathBuf> {
    let found = file_names.iter().map(|n| dir.join(n)).find(|p| p.is_file());
    match &found {
        Some(path) => debug!("using configuration {}", path.display()),
        None => debug!("no configuration in {}", dir.display()),
    }
    found
}

/// Read a configuration document. `.json5` files are read as JSON5 and
/// `.yaml`/`.yml` files as YAML; anything else must be plain JSON.
pub fn load_tools(path: &Path) -> Result<Tools, BuildError> {
    let unreadable = |cause: String| BuildError::ConfigUnreadable {
        path: path.to_path_buf(),
        cause,
    };
    let text = std::fs::read_to_string(path).map_err(|e| unreadable(e.to_string()))?;

    let document: serde_json::Value = match path.extension().and_then(|e| e.to_str()) {
        Some("json5") => json5::from_str(&text).map_err(|e| unreadable(e.to_string()))?,
        #[cfg(feature = "yaml")]
        Some("yaml" | "yml") => serde_yaml::from_str(&text).map_err(|e| unreadable(e.to_string()))?,
        _ => serde_json::from_str(&text).map_err(|e| unreadable(e.to_string()))?,
    };

    match document {
        serde_json::Value::Object(tools) => decode_tools(tools),
        other => Err(unreadable(format!(
            "expected an object of generator options, found {other}"
        ))),
    }
}

const OPTION_NAMES: [&str; 5] = ["command", "presets", "ignore", "types", "data"];

// Spell known option names in lower case; unknown keys are left alone.
fn normalize_option_names(options: serde_json::Value) -> serde_json::Value {
    match options {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.into_iter()
                .map(|(key, value)| {
                    let known = OPTION_NAMES.iter().find(|n| n.eq_ignore_ascii_case(&key));
                    (known.map_or(key, |n| n.to_string()), value)
                })
                .collect(),
        ),
        other => other,
    }
}

/// Decode each generator's options, naming the generator on failure.
pub(crate) fn decode_tools(
    document: serde_json::Map<String, serde_json::Value>,
) -> Result<Tools, BuildError> {
    document
        .into_iter()
        .map(|(tool, options)| {
            let options = normalize_option_names(options);
            match JsonOptions::deserialize(options) {
                Ok(options) => Ok((tool, options)),
                Err(e) => Err(BuildError::ToolOptions {
                    tool,
                    cause: e.to_string(),
                }),
            }
        })
        .collect()
}
