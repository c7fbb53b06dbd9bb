//! Bracket-notation query string encoder.
//!
//! `{"a": {"b": "c", "d": [1, 2]}}` becomes `a%5Bb%5D=c&a%5Bd%5D%5B%5D=1&a%5Bd%5D%5B%5D=2`:
//! nested keys render as `a[b]`, sequence leaves get a trailing `[]` and repeat
//! the key once per element. Keys are emitted in ascending order at every level
//! so the output does not depend on how the tree was built.

use crate::error::{Error, Result};
use crate::query::tree::{ParamMap, ParamTree, Scalar};

/// Leaf value at the end of a flattened path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Leaf<'a> {
    Scalar(&'a Scalar),
    Sequence(&'a [ParamTree]),
}

/// One root-to-leaf path of a flattened tree.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatEntry<'a> {
    pub path: Vec<&'a str>,
    pub value: Leaf<'a>,
}

/// A rendered parameter name together with its value(s).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedParam {
    pub name: String,
    pub values: Vec<String>,
}

/// Reduces a mapping to its leaf paths in key order. Mappings that flatten to
/// nothing contribute nothing.
pub fn flatten(map: &ParamMap) -> Vec<FlatEntry<'_>> {
    let mut entries = Vec::new();
    flatten_into(map, &mut Vec::new(), &mut entries);
    entries
}

fn flatten_into<'a>(map: &'a ParamMap, prefix: &mut Vec<&'a str>, out: &mut Vec<FlatEntry<'a>>) {
    for (key, value) in map {
        prefix.push(key);
        match value {
            ParamTree::Mapping(nested) => flatten_into(nested, prefix, out),
            ParamTree::Sequence(items) => out.push(FlatEntry {
                path: prefix.clone(),
                value: Leaf::Sequence(items),
            }),
            ParamTree::Scalar(scalar) => out.push(FlatEntry {
                path: prefix.clone(),
                value: Leaf::Scalar(scalar),
            }),
        }
        prefix.pop();
    }
}

/// Builds the bracket-notation name for a path: `["a", "b", "c"]` -> `a[b][c]`.
pub fn parametrize(path: &[&str]) -> String {
    let mut name = String::new();
    for (i, segment) in path.iter().enumerate() {
        if i == 0 {
            name.push_str(segment);
        } else {
            name.push('[');
            name.push_str(segment);
            name.push(']');
        }
    }
    name
}

/// Renders flattened entries into names and textual values.
pub fn render(entries: &[FlatEntry<'_>]) -> Result<Vec<EncodedParam>> {
    entries
        .iter()
        .map(|entry| {
            let mut name = parametrize(&entry.path);
            let values = match entry.value {
                Leaf::Scalar(scalar) => vec![scalar.render()],
                Leaf::Sequence(items) => {
                    let values = items
                        .iter()
                        .map(|item| match item {
                            ParamTree::Scalar(scalar) => Ok(scalar.render()),
                            other => Err(Error::InvalidInput(format!(
                                "sequence under \"{}\" holds a {}",
                                name,
                                other.kind()
                            ))),
                        })
                        .collect::<Result<Vec<_>>>()?;
                    name.push_str("[]");
                    values
                }
            };
            Ok(EncodedParam { name, values })
        })
        .collect()
}

/// Form-urlencodes one component: spaces become `+`, everything outside the
/// unreserved set is percent-encoded.
pub fn form_encode(component: &str) -> String {
    urlencoding::encode(component).replace("%20", "+")
}

/// Encodes a nested mapping into a single query string.
pub fn encode(tree: &ParamTree) -> Result<String> {
    match tree {
        ParamTree::Mapping(map) => encode_map(map),
        other => Err(Error::InvalidInput(format!(
            "the root must be a mapping, got a {}",
            other.kind()
        ))),
    }
}

pub fn encode_map(map: &ParamMap) -> Result<String> {
    let params = render(&flatten(map))?;
    let mut pairs = Vec::new();
    for param in &params {
        let name = form_encode(&param.name);
        for value in &param.values {
            pairs.push(format!("{}={}", name, form_encode(value)));
        }
    }
    Ok(pairs.join("&"))
}
