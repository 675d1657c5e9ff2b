// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Raw field annotation in the conventional `key:"value" key2:"value2"` form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructTag(String);

impl StructTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value associated with `key`, or the empty string.
    pub fn get(&self, key: &str) -> String {
        self.lookup(key).unwrap_or_default()
    }

    /// Value associated with `key`. Distinguishes an absent key from an
    /// explicitly empty value. Parsing stops at the first malformed entry.
    pub fn lookup(&self, key: &str) -> Option<String> {
        let mut tag = self.0.as_bytes();
        while !tag.is_empty() {
            let skip = tag.iter().take_while(|b| **b == b' ').count();
            tag = &tag[skip..];
            if tag.is_empty() {
                break;
            }

            let name_len = tag
                .iter()
                .take_while(|b| **b > b' ' && **b != b':' && **b != b'"' && **b != 0x7f)
                .count();
            if name_len == 0
                || name_len + 1 >= tag.len()
                || tag[name_len] != b':'
                || tag[name_len + 1] != b'"'
            {
                break;
            }
            let name = &tag[..name_len];
            tag = &tag[name_len + 1..];

            // Scan the quoted value, honouring backslash escapes.
            let mut i = 1;
            while i < tag.len() && tag[i] != b'"' {
                if tag[i] == b'\\' {
                    i += 1;
                }
                i += 1;
            }
            if i >= tag.len() {
                break;
            }
            let quoted = &tag[..=i];
            tag = &tag[i + 1..];

            if name == key.as_bytes() {
                return core::str::from_utf8(quoted).ok().and_then(unquote);
            }
        }
        None
    }
}

impl fmt::Display for StructTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StructTag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl PartialEq<str> for StructTag {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for StructTag {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

// Interpret a double-quoted literal with the usual escapes.
fn unquote(quoted: &str) -> Option<String> {
    let inner = quoted.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            '"' => out.push('"'),
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\u{7}'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                out.push(char::from(u8::from_str_radix(&hex, 16).ok()?));
            }
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                out.push(char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?);
            }
            _ => return None,
        }
    }
    Some(out)
}
