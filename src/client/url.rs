//! Endpoint URL construction.

use crate::error::Result;
use crate::query::{self, ParamMap};

/// Joins a host and path segments into an absolute URL, appending an encoded
/// query when one is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlFormatter {
    scheme: String,
}

impl Default for UrlFormatter {
    fn default() -> Self {
        Self::https()
    }
}

impl UrlFormatter {
    pub fn https() -> Self {
        Self::new("https")
    }

    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// `format("b24.example.com", &["rest", "profile.json"], None)` gives
    /// `https://b24.example.com/rest/profile.json`. A trailing empty segment
    /// yields a trailing slash.
    pub fn format<S: AsRef<str>>(
        &self,
        host: &str,
        path: &[S],
        query: Option<&ParamMap>,
    ) -> Result<String> {
        let path = path.iter().map(AsRef::as_ref).collect::<Vec<_>>().join("/");
        let mut url = format!("{}://{}/{}", self.scheme, host, path);
        if let Some(query) = query {
            let encoded = query::encode_map(query)?;
            if !encoded.is_empty() {
                url.push('?');
                url.push_str(&encoded);
            }
        }
        Ok(url)
    }
}
