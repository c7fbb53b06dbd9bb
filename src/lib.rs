//! # Bitrix24 Client Library
//!
//! A client for the Bitrix24 REST API. It has two layers:
//!
//! ## Query Module
//!
//! The [`query`] module converts nested parameters to and from the PHP bracket
//! notation (`a[b][c]=v`) that Bitrix24 uses in query strings, batch commands
//! and outbound webhook bodies. The [`batch`] module builds on it to compile
//! named sub-calls into `batch` commands.
//!
//! ## Client Module
//!
//! The [`client`] module talks to a portal over HTTP, either through an inbound
//! webhook or as an OAuth2 application. [`webhook`] parses the form bodies that
//! Bitrix24 sends to outbound webhook handlers.
//!
//! ## Quick Start
//!
//! ```no_run
//! use bitrix24_client::{Batch, Bitrix24Client, CallSpec, ParamTree};
//!
//! # async fn example() -> bitrix24_client::Result<()> {
//! let client = Bitrix24Client::inbound_webhook(
//!     "b24-xxxx.bitrix24.com".to_string(),
//!     1,
//!     "webhook-code".to_string(),
//! );
//!
//! let batch = Batch::new()
//!     .with("get_user", CallSpec::pair("user.current", ParamTree::map()))
//!     .with(
//!         "get_department",
//!         CallSpec::pair(
//!             "department.get",
//!             ParamTree::map().with("ID", "$result[get_user][UF_DEPARTMENT]"),
//!         ),
//!     );
//! let response = client.call_batch(&batch, true).await?;
//! println!("{:?}", response.result);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod client;
pub mod config;
pub mod error;
pub mod query;
pub mod webhook;

pub use batch::{Batch, CallSpec, CompiledBatch, MAX_BATCH_CALLS};
pub use client::Bitrix24Client;
pub use config::Config;
pub use error::{Error, Result};
pub use query::{ParamMap, ParamTree, Scalar};
pub use webhook::OutboundWebhook;
