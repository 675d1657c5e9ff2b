// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::path::PathBuf;

use thiserror::Error;

/// Soft lookup failure reported by the path resolver.
///
/// Absence is never fatal at this level; callers decide how severe it is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("Property {0} does not exist")]
    DoesNotExist(String),

    #[error("{property}: Min index is 0, Max index is {len}. You passed index {index}")]
    IndexOutOfRange {
        property: String,
        len: usize,
        index: usize,
    },

    #[error("{0}: is not an array")]
    NotAnArray(String),

    #[error("{0} must be of type number")]
    InvalidIndex(String),
}

/// Conditions that abort a package build.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("cannot stat source location {}: {source}", path.display())]
    SourceLocation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("resolving declarations for {location}: {cause}")]
    Declarations { location: String, cause: String },

    #[error("no configuration document found in {}", dir.display())]
    ConfigNotFound { dir: PathBuf },

    #[error("reading configuration {}: {cause}", path.display())]
    ConfigUnreadable { path: PathBuf, cause: String },

    #[error("parse options for tool `{tool}` failed: {cause}")]
    ToolOptions { tool: String, cause: String },

    #[error("tool `{tool}`: `{ty}` is not a supported type")]
    UnsupportedType { tool: String, ty: String },

    #[error("tool `{tool}`: preset `{preset}` for type `{ty}` not found: {source}")]
    PresetNotFound {
        tool: String,
        ty: String,
        preset: String,
        #[source]
        source: PathError,
    },
}
