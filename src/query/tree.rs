//! The nested parameter structure accepted by the query encoder and produced by
//! the decoder.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// A mapping node. Keys are unique and iterate in ascending order, which is the
/// order the encoder emits them in.
pub type ParamMap = BTreeMap<String, ParamTree>;

/// A leaf value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    /// Integers above `i64::MAX`.
    UInt(u64),
    Float(f64),
    String(String),
}

impl Scalar {
    /// Text form used on the wire. Booleans follow the PHP convention of `1`
    /// and `0`; null renders as an empty value.
    pub fn render(&self) -> String {
        match self {
            Scalar::Null => String::new(),
            Scalar::Bool(true) => "1".to_string(),
            Scalar::Bool(false) => "0".to_string(),
            Scalar::Int(i) => i.to_string(),
            Scalar::UInt(u) => u.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::String(s) => s.clone(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Arbitrary nested request parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamTree {
    Scalar(Scalar),
    Sequence(Vec<ParamTree>),
    Mapping(ParamMap),
}

impl ParamTree {
    /// An empty mapping node.
    pub fn map() -> Self {
        ParamTree::Mapping(ParamMap::new())
    }

    /// Builder-style insert; turns a non-mapping node into a mapping first.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamTree>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamTree>) {
        if !matches!(self, ParamTree::Mapping(_)) {
            *self = ParamTree::map();
        }
        if let ParamTree::Mapping(map) = self {
            map.insert(key.into(), value.into());
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamTree> {
        match self {
            ParamTree::Mapping(map) => map.get(key),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamTree::Scalar(s) => s.as_str(),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&ParamMap> {
        match self {
            ParamTree::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Short name of the node kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ParamTree::Scalar(Scalar::String(_)) => "string",
            ParamTree::Scalar(_) => "scalar",
            ParamTree::Sequence(_) => "sequence",
            ParamTree::Mapping(_) => "mapping",
        }
    }
}

impl From<Scalar> for ParamTree {
    fn from(value: Scalar) -> Self {
        ParamTree::Scalar(value)
    }
}

impl From<&str> for ParamTree {
    fn from(value: &str) -> Self {
        ParamTree::Scalar(Scalar::String(value.to_string()))
    }
}

impl From<String> for ParamTree {
    fn from(value: String) -> Self {
        ParamTree::Scalar(Scalar::String(value))
    }
}

impl From<bool> for ParamTree {
    fn from(value: bool) -> Self {
        ParamTree::Scalar(Scalar::Bool(value))
    }
}

impl From<i64> for ParamTree {
    fn from(value: i64) -> Self {
        ParamTree::Scalar(Scalar::Int(value))
    }
}

impl From<i32> for ParamTree {
    fn from(value: i32) -> Self {
        ParamTree::Scalar(Scalar::Int(value.into()))
    }
}

impl From<u32> for ParamTree {
    fn from(value: u32) -> Self {
        ParamTree::Scalar(Scalar::Int(value.into()))
    }
}

impl From<u64> for ParamTree {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => ParamTree::Scalar(Scalar::Int(i)),
            Err(_) => ParamTree::Scalar(Scalar::UInt(value)),
        }
    }
}

impl From<f64> for ParamTree {
    fn from(value: f64) -> Self {
        ParamTree::Scalar(Scalar::Float(value))
    }
}

impl<T: Into<ParamTree>> From<Vec<T>> for ParamTree {
    fn from(values: Vec<T>) -> Self {
        ParamTree::Sequence(values.into_iter().map(Into::into).collect())
    }
}

impl From<ParamMap> for ParamTree {
    fn from(map: ParamMap) -> Self {
        ParamTree::Mapping(map)
    }
}

impl<K: Into<String>, V: Into<ParamTree>> FromIterator<(K, V)> for ParamTree {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        ParamTree::Mapping(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<Value> for ParamTree {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ParamTree::Scalar(Scalar::Null),
            Value::Bool(b) => ParamTree::Scalar(Scalar::Bool(b)),
            Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => ParamTree::Scalar(Scalar::Int(i)),
                (None, Some(u)) => ParamTree::Scalar(Scalar::UInt(u)),
                (None, None) => ParamTree::Scalar(Scalar::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            Value::String(s) => ParamTree::Scalar(Scalar::String(s)),
            Value::Array(items) => ParamTree::Sequence(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                ParamTree::Mapping(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}
