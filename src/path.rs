// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.
#![allow(clippy::expect_used)] // patterns are static

//! Path lookups into nested documents.
//!
//! ```text
//! resolve(&doc, "one.two.three[0]")
//! resolve_with(&doc, "one/two/three[0]", "/")
//! ```
//!
//! A boolean met anywhere along the path ends the walk and is returned as the
//! result, whatever segments remain. Configuration documents rely on this to
//! switch off a whole subtree with a single `false`.

use crate::error::PathError;
use crate::value::Value;

use anyhow::{bail, Result};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

pub const DEFAULT_SEPARATOR: &str = ".";

lazy_static! {
    static ref INDEXED_SEGMENT: Regex = Regex::new(r"\w+\[\d+\]").expect("valid pattern");
    static ref PROPERTY: Regex = Regex::new(r"\w+").expect("valid pattern");
    static ref INDEX: Regex = Regex::new(r"\[\d+\]").expect("valid pattern");
}

/// Resolve a `.`-separated path.
pub fn resolve(document: &Value, path: &str) -> Result<Value, PathError> {
    resolve_with(document, path, DEFAULT_SEPARATOR)
}

/// Resolve `path` using `separator` between segments; an empty separator
/// means [`DEFAULT_SEPARATOR`]. An empty path, or the separator alone,
/// addresses the whole document. The document is never modified.
pub fn resolve_with(document: &Value, path: &str, separator: &str) -> Result<Value, PathError> {
    let separator = if separator.is_empty() {
        DEFAULT_SEPARATOR
    } else {
        separator
    };
    let path = if path.is_empty() { separator } else { path };
    if path == separator {
        return Ok(document.clone());
    }

    let levels: Vec<&str> = path.split(separator).filter(|l| !l.is_empty()).collect();
    let (Some(first), Value::Object(data)) = (levels.first().copied(), document) else {
        return Err(PathError::DoesNotExist(path.to_string()));
    };
    let rest = &levels[1..];

    let mut property = first;
    let mut current = data.get(first).cloned();

    if INDEXED_SEGMENT.is_match(first) {
        property = PROPERTY.find(first).map_or(first, |m| m.as_str());
        let digits = INDEX
            .find(first)
            .map_or("", |m| m.as_str())
            .trim_matches(|c| c == '[' || c == ']');
        let Ok(index) = digits.parse::<usize>() else {
            return Err(PathError::InvalidIndex(first.to_string()));
        };

        current = match data.get(property) {
            Some(Value::Array(items)) => match items.get(index) {
                Some(item) => Some(item.clone()),
                None => {
                    return Err(PathError::IndexOutOfRange {
                        property: property.to_string(),
                        len: items.len(),
                        index,
                    })
                }
            },
            Some(Value::Bool(b)) => return Ok(Value::Bool(*b)),
            Some(_) => return Err(PathError::NotAnArray(property.to_string())),
            None => return Err(PathError::DoesNotExist(property.to_string())),
        };
    }

    if rest.is_empty() {
        return current.ok_or_else(|| PathError::DoesNotExist(path.to_string()));
    }

    match current {
        Some(v @ Value::Object(_)) => resolve_with(&v, &rest.join(separator), separator),
        Some(Value::Bool(b)) => Ok(Value::Bool(b)),
        Some(_) => Err(PathError::DoesNotExist(path.to_string())),
        None => Err(PathError::DoesNotExist(property.to_string())),
    }
}

/// Like [`resolve`], but a miss yields [`Value::Undefined`] and is only
/// logged.
pub fn try_lookup(document: &Value, path: &str) -> Value {
    match resolve(document, path) {
        Ok(v) => v,
        Err(e) => {
            debug!("{e}");
            Value::Undefined
        }
    }
}

/// Boolean at `path`, or `default` when nothing is there.
pub fn lookup_bool(document: &Value, path: &str, default: bool) -> Result<bool> {
    match try_lookup(document, path) {
        Value::Bool(b) => Ok(b),
        Value::Undefined | Value::Null => Ok(default),
        _ => bail!("{path} is not bool value"),
    }
}
