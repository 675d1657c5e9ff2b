// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::model::{Struct, TagPath};
use crate::package::Package;
use crate::source::TypeId;

impl Struct {
    /// Every place below this struct annotated with `key`.
    ///
    /// Fields are visited in intuitive order. A field carrying the key yields
    /// a path ending at it; otherwise, when the field's type is a struct of the
    /// same package, its own annotated fields are reported under the field's
    /// name. Structs already being descended are not entered again.
    pub fn compute_tag_paths(&self, package: &Package, key: &str) -> Vec<TagPath> {
        let mut paths = vec![];
        let mut prefix = vec![];
        let mut stack = vec![self.shape];
        collect(self, package, key, &mut prefix, &mut stack, &mut paths);
        paths
    }
}

fn collect(
    s: &Struct,
    package: &Package,
    key: &str,
    prefix: &mut Vec<String>,
    stack: &mut Vec<TypeId>,
    paths: &mut Vec<TagPath>,
) {
    for field in &s.intuitive_fields {
        prefix.push(field.name.clone());

        let value = field.tag.get(key);
        if !value.is_empty() {
            paths.push(TagPath::new(prefix.as_slice(), &value));
        } else if let Some(nested) = package.struct_by_shape(field.underlying_type()) {
            if !stack.contains(&nested.shape) {
                stack.push(nested.shape);
                collect(nested, package, key, prefix, stack, paths);
                stack.pop();
            }
        }

        prefix.pop();
    }
}
