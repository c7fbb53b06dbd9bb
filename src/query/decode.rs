//! Bracket-notation query string decoder, the inverse of the encoder for
//! mapping-only trees.
//!
//! Sequences are not reconstructed: an `a[]` key yields a child keyed by the
//! empty string, and a repeated key keeps only the last value.

use crate::error::{Error, Result};
use crate::query::tree::{ParamMap, ParamTree, Scalar};

/// Decodes `qs`, splitting segments on `&`.
pub fn decode(qs: &str) -> Result<ParamMap> {
    decode_with_separator(qs, "&")
}

pub fn decode_with_separator(qs: &str, separator: &str) -> Result<ParamMap> {
    let mut result = ParamMap::new();
    if qs.is_empty() {
        return Ok(result);
    }

    for segment in qs.split(separator) {
        let mut parts = segment.split('=');
        let (raw_key, raw_value) = match (parts.next(), parts.next(), parts.next()) {
            (Some(key), Some(value), None) => (key, value),
            _ => return Err(Error::MalformedQueryString(segment.to_string())),
        };
        let key = form_decode(raw_key)?;
        let value = form_decode(raw_value)?;
        let subkeys = parse_key(&key)?;
        assign(&mut result, &subkeys, value);
    }
    Ok(result)
}

/// Inverse of the encoder's component encoding: `+` is a space, `%XX` a byte.
pub fn form_decode(component: &str) -> Result<String> {
    let spaced = component.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| Error::MalformedQueryString(component.to_string()))
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Splits `a[b][c]` into `["a", "b", "c"]`. The first run of word characters
/// is the root key; every `[word*]` group after it adds one level.
pub fn parse_key(key: &str) -> Result<Vec<String>> {
    let start = key
        .find(is_word)
        .ok_or_else(|| Error::MalformedQueryString(key.to_string()))?;
    let rest = &key[start..];
    let end = rest.find(|c: char| !is_word(c)).unwrap_or(rest.len());

    let mut subkeys = vec![rest[..end].to_string()];
    let mut tail = &rest[end..];
    while let Some(open) = tail.find('[') {
        let inner = &tail[open + 1..];
        let len = inner.find(|c: char| !is_word(c)).unwrap_or(inner.len());
        if inner[len..].starts_with(']') {
            subkeys.push(inner[..len].to_string());
            tail = &inner[len + 1..];
        } else {
            tail = &inner[len..];
        }
    }
    Ok(subkeys)
}

fn assign(node: &mut ParamMap, subkeys: &[String], value: String) {
    match subkeys {
        [] => {}
        [last] => {
            node.insert(last.clone(), ParamTree::Scalar(Scalar::String(value)));
        }
        [head, rest @ ..] => {
            let slot = node.entry(head.clone()).or_insert_with(ParamTree::map);
            match slot {
                ParamTree::Mapping(child) => assign(child, rest, value),
                _ => {
                    // a scalar already sits here; the deeper path wins
                    let mut child = ParamMap::new();
                    assign(&mut child, rest, value);
                    *slot = ParamTree::Mapping(child);
                }
            }
        }
    }
}
