//! Error types for the Bitrix24 client.
//!
//! Codec and batch errors signal a malformed argument from the caller and are
//! returned immediately. Transport and serialization failures come from the
//! HTTP and JSON layers and are wrapped without reinterpretation.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The query encoder was handed a tree it cannot express, such as a
    /// non-mapping root.
    #[error("cannot encode as a query string: {0}")]
    InvalidInput(String),

    /// A query string segment did not split into exactly one key and one value.
    #[error("malformed query string segment: {0:?}")]
    MalformedQueryString(String),

    #[error("the \"{0}\" call must be a pair of values")]
    BatchArity(String),

    #[error("the \"{0}\" call must contain only \"method\" and \"params\" keys")]
    BatchKey(String),

    #[error("the \"{name}\" call must be of type: {kinds}", kinds = .allowed.join(", "))]
    BatchType {
        name: String,
        allowed: &'static [&'static str],
    },

    /// A credential or setting required for the requested operation is absent.
    #[error("missing required setting: {0}")]
    MissingSetting(&'static str),

    #[error("invalid value {value:?} for setting {name}")]
    InvalidSetting { name: &'static str, value: String },

    #[error("not authorized: no access token has been obtained yet")]
    NotAuthorized,

    /// The vendor answered with its error envelope.
    #[error("Bitrix24 API error {error}: {description}")]
    Api { error: String, description: String },

    #[error("invalid application token")]
    InvalidApplicationToken,

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("transport failed: {0}")]
    Transport(#[from] reqwest::Error),
}
