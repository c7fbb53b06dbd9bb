//! # Bitrix24 REST Client
//!
//! This module provides the HTTP client for the Bitrix24 REST API, covering
//! inbound webhooks, OAuth2 applications, single calls, batches and event
//! binding.
//!
//! ## Modules
//!
//! - [`auth`] - OAuth2 authorization-code and refresh-token grants
//! - [`client`] - Main client implementation with all call methods
//! - [`transport`] - HTTP transport abstraction and its `reqwest` implementation
//! - [`types`] - Response envelopes
//! - [`url`] - Endpoint URL formatting
//!
//! ## Quick Start
//!
//! ```no_run
//! use bitrix24_client::client::Bitrix24Client;
//! use serde_json::json;
//!
//! # async fn example() -> bitrix24_client::Result<()> {
//! let client = Bitrix24Client::inbound_webhook(
//!     "b24-xxxx.bitrix24.com".to_string(),
//!     1,
//!     "webhook-code".to_string(),
//! );
//!
//! let users = client.call("user.get", &json!({"FILTER": {"ACTIVE": true}})).await?;
//! println!("Found {:?} users", users.total);
//! # Ok(())
//! # }
//! ```

pub mod auth;
#[allow(clippy::module_inception)]
pub mod client;
pub mod transport;
pub mod types;
pub mod url;

pub use auth::{OAuth2Client, TokenStore, Tokens};
pub use client::{Bitrix24Client, Credentials};
pub use transport::{HttpTransport, ReqwestTransport};
pub use types::*;
pub use url::UrlFormatter;
