//! Batch command compiler.
//!
//! A batch bundles several sub-calls into one `batch` request. Each
//! sub-call is sent as a `"<method>?<query>"` string; later calls may refer to
//! earlier results with `$result[name][field]` macros, which the server expands.
//! Those macros are passed through as ordinary parameter values.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::query::{self, ParamTree};

const CALL_KINDS: &[&str] = &["string", "pair", "record"];

/// Most sub-calls the server runs from one `batch` request.
pub const MAX_BATCH_CALLS: usize = 50;

/// One sub-call of a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum CallSpec {
    /// A preformed `"method?query"` command, sent unchanged.
    Literal(String),
    /// `(method, params)`.
    Pair(String, ParamTree),
    /// `{"method": ..., "params": ...}`.
    Record { method: String, params: ParamTree },
}

impl CallSpec {
    pub fn pair(method: impl Into<String>, params: impl Into<ParamTree>) -> Self {
        CallSpec::Pair(method.into(), params.into())
    }

    /// Validates a loosely typed JSON call description.
    ///
    /// Strings are literal commands, two-element arrays are pairs and objects
    /// with exactly `method` and `params` are records.
    pub fn from_value(name: &str, value: &Value) -> Result<Self> {
        match value {
            Value::String(command) => Ok(CallSpec::Literal(command.clone())),
            Value::Array(items) => match items.as_slice() {
                [method, params] => Ok(CallSpec::Pair(
                    method_name(name, method)?,
                    ParamTree::from(params.clone()),
                )),
                _ => Err(Error::BatchArity(name.to_string())),
            },
            Value::Object(record) => match (record.get("method"), record.get("params")) {
                (Some(method), Some(params)) if record.len() == 2 => Ok(CallSpec::Record {
                    method: method_name(name, method)?,
                    params: ParamTree::from(params.clone()),
                }),
                _ => Err(Error::BatchKey(name.to_string())),
            },
            _ => Err(type_error(name)),
        }
    }

    /// Renders the wire command.
    pub fn command(&self) -> Result<String> {
        match self {
            CallSpec::Literal(command) => Ok(command.clone()),
            CallSpec::Pair(method, params) | CallSpec::Record { method, params } => {
                Ok(format!("{}?{}", method, query::encode(params)?))
            }
        }
    }
}

fn method_name(name: &str, method: &Value) -> Result<String> {
    method.as_str().map(str::to_string).ok_or_else(|| type_error(name))
}

fn type_error(name: &str) -> Error {
    Error::BatchType {
        name: name.to_string(),
        allowed: CALL_KINDS,
    }
}

/// Named sub-calls in the order they will run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    calls: Vec<(String, CallSpec)>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a call; reusing a name replaces that call in its original slot.
    pub fn push(&mut self, name: impl Into<String>, call: CallSpec) -> &mut Self {
        let name = name.into();
        match self.calls.iter().position(|(existing, _)| *existing == name) {
            Some(index) => self.calls[index].1 = call,
            None => self.calls.push((name, call)),
        }
        self
    }

    pub fn with(mut self, name: impl Into<String>, call: CallSpec) -> Self {
        self.push(name, call);
        self
    }

    /// Builds a batch from a JSON object of call descriptions, keeping key order.
    pub fn from_value(value: &Value) -> Result<Self> {
        let calls = value.as_object().ok_or_else(|| {
            Error::InvalidInput("batch calls must be given as a mapping".to_string())
        })?;
        let mut batch = Batch::new();
        for (name, call) in calls {
            batch.push(name.clone(), CallSpec::from_value(name, call)?);
        }
        Ok(batch)
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Whether the batch holds more calls than one request may carry.
    pub fn exceeds_limit(&self) -> bool {
        self.calls.len() > MAX_BATCH_CALLS
    }

    pub fn compile(&self) -> Result<CompiledBatch> {
        compile(self)
    }
}

/// Compiles every call into its command string. Fails as a whole on the first
/// bad call.
pub fn compile(batch: &Batch) -> Result<CompiledBatch> {
    let commands = batch
        .calls
        .iter()
        .map(|(name, call)| Ok((name.clone(), call.command()?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(CompiledBatch { commands })
}

/// Call name to command string, in batch order. Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledBatch {
    commands: Vec<(String, String)>,
}

impl CompiledBatch {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.commands
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, command)| command.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.commands.iter().map(|(n, c)| (n.as_str(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Serialize for CompiledBatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.commands.len()))?;
        for (name, command) in &self.commands {
            map.serialize_entry(name, command)?;
        }
        map.end()
    }
}

/// Body of a `batch` method call.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BatchRequest {
    pub cmd: CompiledBatch,
    pub halt: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn literal_passes_through() {
        let batch = Batch::new().with("x", CallSpec::Literal("raw.method".into()));
        assert_eq!(batch.compile().unwrap().get("x"), Some("raw.method"));
    }

    #[test]
    fn pair_is_encoded() {
        let batch = Batch::new().with("x", CallSpec::pair("m.get", ParamTree::map().with("ID", 1)));
        assert_eq!(batch.compile().unwrap().get("x"), Some("m.get?ID=1"));
    }

    #[test]
    fn record_is_encoded_like_a_pair() {
        let batch = Batch::from_value(&json!({
            "x": {"method": "m.get", "params": {"FILTER": {"ID": 2}}}
        }))
        .unwrap();
        assert_eq!(batch.compile().unwrap().get("x"), Some("m.get?FILTER%5BID%5D=2"));
    }

    #[test]
    fn record_missing_params_is_a_key_error() {
        let err = Batch::from_value(&json!({"x": {"method": "m.get"}})).unwrap_err();
        assert!(matches!(err, Error::BatchKey(name) if name == "x"));
    }

    #[test]
    fn record_with_extra_keys_is_a_key_error() {
        let err = Batch::from_value(&json!({
            "x": {"method": "m.get", "params": {}, "extra": 1}
        }))
        .unwrap_err();
        assert!(matches!(err, Error::BatchKey(_)));
    }

    #[test]
    fn short_pair_is_an_arity_error() {
        let err = Batch::from_value(&json!({"x": ["only_one"]})).unwrap_err();
        assert!(matches!(err, Error::BatchArity(name) if name == "x"));
    }

    #[test]
    fn long_pair_is_an_arity_error() {
        let err = Batch::from_value(&json!({"x": ["m", {}, 1]})).unwrap_err();
        assert!(matches!(err, Error::BatchArity(name) if name == "x"));
    }

    #[test]
    fn unsigned_ids_survive_compilation() {
        let batch = Batch::from_value(&json!({"x": ["crm.deal.get", {"ID": u64::MAX}]})).unwrap();
        assert_eq!(
            batch.compile().unwrap().get("x"),
            Some("crm.deal.get?ID=18446744073709551615")
        );
    }

    #[test]
    fn unsupported_shape_is_a_type_error() {
        let err = Batch::from_value(&json!({"x": 42})).unwrap_err();
        match err {
            Error::BatchType { name, allowed } => {
                assert_eq!(name, "x");
                assert_eq!(allowed, &["string", "pair", "record"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            Batch::from_value(&json!({"y": [1, {}]})),
            Err(Error::BatchType { .. })
        ));
    }

    #[test]
    fn non_mapping_params_fail_the_whole_batch() {
        let batch = Batch::new()
            .with("ok", CallSpec::Literal("user.current".into()))
            .with("bad", CallSpec::pair("m.get", vec![1, 2]));
        assert!(matches!(batch.compile(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn output_keeps_insertion_order_and_passes_macros_through() {
        let batch = Batch::from_value(&json!({
            "get_user": ["user.current", {}],
            "get_department": {
                "method": "department.get",
                "params": {"ID": "$result[get_user][UF_DEPARTMENT]"}
            },
            "a_last": "profile"
        }))
        .unwrap();
        let compiled = batch.compile().unwrap();
        let names: Vec<_> = compiled.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["get_user", "get_department", "a_last"]);
        assert_eq!(compiled.get("get_user"), Some("user.current?"));
        assert_eq!(
            compiled.get("get_department"),
            Some("department.get?ID=%24result%5Bget_user%5D%5BUF_DEPARTMENT%5D")
        );
        assert_eq!(
            serde_json::to_string(&BatchRequest { cmd: compiled, halt: true }).unwrap(),
            r#"{"cmd":{"get_user":"user.current?","get_department":"department.get?ID=%24result%5Bget_user%5D%5BUF_DEPARTMENT%5D","a_last":"profile"},"halt":true}"#
        );
    }

    #[test]
    fn limit_counts_distinct_names() {
        let mut batch = Batch::new();
        for i in 0..MAX_BATCH_CALLS {
            batch.push(format!("c{i}"), CallSpec::Literal("user.current".into()));
        }
        assert!(!batch.exceeds_limit());
        batch.push("c0", CallSpec::Literal("profile".into()));
        assert!(!batch.exceeds_limit());
        batch.push("extra", CallSpec::Literal("profile".into()));
        assert!(batch.exceeds_limit());
    }

    #[test]
    fn reusing_a_name_replaces_in_place() {
        let mut batch = Batch::new();
        batch
            .push("a", CallSpec::Literal("one".into()))
            .push("b", CallSpec::Literal("two".into()))
            .push("a", CallSpec::Literal("three".into()));
        let compiled = batch.compile().unwrap();
        let pairs: Vec<_> = compiled.iter().collect();
        assert_eq!(pairs, vec![("a", "three"), ("b", "two")]);
    }
}
