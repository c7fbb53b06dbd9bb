//! Outbound webhook payloads.
//!
//! When an event fires, Bitrix24 POSTs an `application/x-www-form-urlencoded`
//! body in bracket notation to the registered handler, for example
//! `event=ONCRMLEADADD&data[FIELDS][ID]=42&auth[application_token]=...`.
//! Handlers should reject payloads whose application token does not match the
//! one issued for the webhook.

use crate::error::{Error, Result};
use crate::query::{self, ParamMap, ParamTree};

#[derive(Debug, Clone, PartialEq)]
pub struct OutboundWebhook {
    fields: ParamMap,
}

impl OutboundWebhook {
    /// Decodes a raw form body.
    pub fn parse(body: &str) -> Result<Self> {
        let fields = query::decode(body.trim())?;
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &ParamMap {
        &self.fields
    }

    pub fn into_fields(self) -> ParamMap {
        self.fields
    }

    /// Event name, e.g. `ONCRMLEADADD`.
    pub fn event(&self) -> Option<&str> {
        self.fields.get("event").and_then(ParamTree::as_str)
    }

    /// The `data` subtree describing what changed.
    pub fn data(&self) -> Option<&ParamTree> {
        self.fields.get("data")
    }

    pub fn application_token(&self) -> Option<&str> {
        self.fields
            .get("auth")
            .and_then(|auth| auth.get("application_token"))
            .or_else(|| self.fields.get("application_token"))
            .and_then(ParamTree::as_str)
    }

    /// Fails unless the payload carries `expected` as its application token.
    pub fn verify(&self, expected: &str) -> Result<()> {
        match self.application_token() {
            Some(token) if token == expected => Ok(()),
            _ => {
                tracing::warn!(
                    "Rejected outbound webhook {} with an invalid application token",
                    self.event().unwrap_or("<unknown>")
                );
                Err(Error::InvalidApplicationToken)
            }
        }
    }
}
