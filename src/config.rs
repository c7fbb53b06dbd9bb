//! Client configuration read from the environment.
//!
//! | Variable | Meaning |
//! |---|---|
//! | `BITRIX24_HOSTNAME` | portal host, e.g. `b24-xxxx.bitrix24.com` (required) |
//! | `BITRIX24_AUTH_CODE` | inbound webhook secret |
//! | `BITRIX24_USER_ID` | user the webhook belongs to (default `1`) |
//! | `BITRIX24_CLIENT_ID` / `BITRIX24_CLIENT_SECRET` | OAuth2 application credentials |
//! | `BITRIX24_SCHEME` | URL scheme (default `https`) |

use std::env;

use crate::error::{Error, Result};

pub const HOSTNAME_VAR: &str = "BITRIX24_HOSTNAME";
pub const AUTH_CODE_VAR: &str = "BITRIX24_AUTH_CODE";
pub const USER_ID_VAR: &str = "BITRIX24_USER_ID";
pub const CLIENT_ID_VAR: &str = "BITRIX24_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "BITRIX24_CLIENT_SECRET";
pub const SCHEME_VAR: &str = "BITRIX24_SCHEME";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub hostname: String,
    pub scheme: String,
    pub user_id: u64,
    pub auth_code: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

/// Which kind of client a configuration describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode<'a> {
    Webhook { auth_code: &'a str },
    Application { client_id: &'a str, client_secret: &'a str },
}

impl Config {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            scheme: "https".to_string(),
            user_id: 1,
            auth_code: None,
            client_id: None,
            client_secret: None,
        }
    }

    pub fn from_env() -> Result<Self> {
        let hostname = non_empty(HOSTNAME_VAR).ok_or(Error::MissingSetting(HOSTNAME_VAR))?;
        let mut config = Config::new(hostname);

        if let Some(scheme) = non_empty(SCHEME_VAR) {
            config.scheme = scheme;
        }
        if let Some(user_id) = non_empty(USER_ID_VAR) {
            config.user_id = user_id.parse().map_err(|_| Error::InvalidSetting {
                name: USER_ID_VAR,
                value: user_id.clone(),
            })?;
        }
        config.auth_code = non_empty(AUTH_CODE_VAR);
        config.client_id = non_empty(CLIENT_ID_VAR);
        config.client_secret = non_empty(CLIENT_SECRET_VAR);

        tracing::debug!(
            "Loaded configuration for {} ({})",
            config.hostname,
            match config.mode() {
                Ok(Mode::Webhook { .. }) => "inbound webhook",
                Ok(Mode::Application { .. }) => "application",
                Err(_) => "no credentials",
            }
        );
        Ok(config)
    }

    /// Picks the credential mode. A webhook code takes precedence over
    /// application credentials.
    pub fn mode(&self) -> Result<Mode<'_>> {
        if let Some(auth_code) = self.auth_code.as_deref() {
            return Ok(Mode::Webhook { auth_code });
        }
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(client_id), Some(client_secret)) => Ok(Mode::Application {
                client_id,
                client_secret,
            }),
            (Some(_), None) => Err(Error::MissingSetting(CLIENT_SECRET_VAR)),
            (None, _) => Err(Error::MissingSetting(AUTH_CODE_VAR)),
        }
    }
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
