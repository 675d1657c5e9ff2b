// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Field promotion.
//!
//! Fields are collected level by level, breadth first over embedded structs.
//! At each depth a name that is already settled by a shallower level is
//! shadowed, and a name seen twice within the depth is ambiguous: it is
//! dropped from that depth and from every deeper one. Blank `_` fields are
//! padding: they stay in the literal list and take no part in any of this.

use crate::model::{Field, Struct};
use crate::source::{TypeId, TypeTable};

use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use log::warn;

const BLANK: &str = "_";

struct Resolution<'a> {
    types: &'a TypeTable,
    settled: Vec<(usize, Rc<Field>)>,
    claimed: HashSet<String>,
    conflicts: HashSet<String>,
}

impl<'a> Resolution<'a> {
    fn new(types: &'a TypeTable) -> Self {
        Self {
            types,
            settled: vec![],
            claimed: HashSet::new(),
            conflicts: HashSet::new(),
        }
    }

    // Settle one depth and return the embedded structs feeding the next one.
    fn level(&mut self, depth: usize, sources: &[TypeId]) -> Vec<TypeId> {
        let types = self.types;
        let mut pool: Vec<Rc<Field>> = vec![];
        let mut seen: HashSet<&str> = HashSet::new();

        for source in sources {
            for decl in types.struct_fields(*source) {
                let name = decl.name.as_str();
                if name == BLANK {
                    if depth == 0 {
                        pool.push(Rc::new(Field::new(types, decl)));
                    }
                    continue;
                }
                if self.conflicts.contains(name) || self.claimed.contains(name) {
                    continue;
                }
                if !seen.insert(name) {
                    self.conflicts.insert(name.to_string());
                    continue;
                }
                pool.push(Rc::new(Field::new(types, decl)));
            }
        }

        let mut next = vec![];
        for field in pool {
            if field.name == BLANK {
                self.settled.push((depth, field));
                continue;
            }
            if self.conflicts.contains(&field.name) {
                continue;
            }
            if field.embedded && types.is_struct(field.underlying_type()) {
                next.push(field.underlying_type());
            }
            self.claimed.insert(field.name.clone());
            self.settled.push((depth, field));
        }
        next
    }
}

/// Fill `Fields` and `IntuitiveFields` of `s` from its struct shape.
pub(crate) fn resolve_fields(types: &TypeTable, s: &mut Struct) {
    let mut resolution = Resolution::new(types);
    let mut sources = vec![s.shape];
    let mut depth = 0;
    while !sources.is_empty() {
        sources = resolution.level(depth, &sources);
        depth += 1;
    }

    let declared = types.struct_fields(s.shape).len();
    let mut fields = vec![];
    let mut intuitive = vec![];
    for (depth, field) in resolution.settled {
        if depth == 0 {
            fields.push(field.clone());
        }
        if field.name == BLANK || (field.embedded && types.is_struct(field.underlying_type())) {
            continue;
        }
        intuitive.push(field);
    }

    if fields.len() != declared {
        warn!(
            "{}: {} of {declared} declared fields have duplicate names",
            s.name,
            declared - fields.len()
        );
    }

    s.field_map = index(&fields);
    s.fields = fields;
    s.intuitive_field_map = index(&intuitive);
    s.intuitive_fields = intuitive;
}

fn index(fields: &[Rc<Field>]) -> BTreeMap<String, Rc<Field>> {
    fields
        .iter()
        .filter(|f| f.name != BLANK)
        .map(|f| (f.name.clone(), f.clone()))
        .collect()
}
