//! Transfer tokens and login links.
//!
//! A [`TransferToken`] is what the logged-out device shows to the user. The
//! approving device receives it as a login link and recovers the raw value
//! with [`parse_login_link`].
//!
//! ## Link Format
//!
//! ```text
//! <scheme>://login?token=<base64url(value), no padding>
//! ```
//!
//! ## Example
//!
//! ```
//! use chrono::Utc;
//! use handoff_core::token::{parse_login_link, TransferToken};
//!
//! let token = TransferToken::new(vec![0xfa, 0xce], Utc::now());
//! let link = token.deep_link("tg");
//! assert_eq!(link, "tg://login?token=-s4");
//! assert_eq!(parse_login_link(&link, "tg").unwrap(), vec![0xfa, 0xce]);
//! ```

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::session::DatacenterId;

/// Link path that carries a login token
const LOGIN_PATH: &str = "login";

/// Query parameter that carries the encoded token value
const TOKEN_PARAM: &str = "token";

/// A short-lived token issued to a logged-out device.
///
/// `valid_until` is only a hint from the server. Expiry is enforced remotely
/// and never checked locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferToken {
    value: Vec<u8>,
    valid_until: DateTime<Utc>,
}

impl TransferToken {
    /// Wrap a token value issued by the server.
    #[must_use]
    pub fn new(value: Vec<u8>, valid_until: DateTime<Utc>) -> Self {
        Self { value, valid_until }
    }

    /// Raw token value.
    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Server-side expiry hint.
    #[must_use]
    pub fn valid_until(&self) -> DateTime<Utc> {
        self.valid_until
    }

    /// Encode the token as a login link for the approving device.
    #[must_use]
    pub fn deep_link(&self, scheme: &str) -> String {
        format!(
            "{scheme}://{LOGIN_PATH}?{TOKEN_PARAM}={}",
            URL_SAFE_NO_PAD.encode(&self.value)
        )
    }
}

/// Recover a token value from a scanned login link.
///
/// # Errors
///
/// Returns [`Error::InvalidLink`] if the scheme or path do not match, the
/// `token` parameter is missing, or it does not decode to a non-empty value.
pub fn parse_login_link(link: &str, scheme: &str) -> Result<Vec<u8>> {
    let link = link.trim();

    let (link_scheme, rest) = link
        .split_once("://")
        .ok_or_else(|| Error::InvalidLink("missing scheme".to_string()))?;

    if !link_scheme.eq_ignore_ascii_case(scheme) {
        return Err(Error::InvalidLink(format!(
            "expected scheme '{scheme}', got '{link_scheme}'"
        )));
    }

    let (path, query) = rest
        .split_once('?')
        .ok_or_else(|| Error::InvalidLink("missing query".to_string()))?;

    if path.trim_end_matches('/') != LOGIN_PATH {
        return Err(Error::InvalidLink(format!("unexpected path '{path}'")));
    }

    let encoded = query
        .split('&')
        .find_map(|pair| {
            pair.strip_prefix(TOKEN_PARAM)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .ok_or_else(|| Error::InvalidLink("missing token parameter".to_string()))?;

    let value = URL_SAFE_NO_PAD
        .decode(encoded.trim_end_matches('='))
        .map_err(|e| Error::InvalidLink(format!("token is not base64url: {e}")))?;

    if value.is_empty() {
        return Err(Error::InvalidLink("empty token".to_string()));
    }

    Ok(value)
}

/// Metadata about the device that requested a token.
///
/// Shown on the approving device so the user can confirm what they are about
/// to authorize. Carries no authority of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Datacenter the requesting session lives on
    pub datacenter_id: DatacenterId,
    /// Authorization key of the requesting session
    pub auth_key_id: i64,
    /// Device model
    pub device_model: String,
    /// Platform name
    pub platform: String,
    /// Operating system version
    pub system_version: String,
    /// Application id
    pub api_id: i32,
    /// Application name
    pub app_name: String,
    /// Application version
    pub app_version: String,
    /// IP address the request came from
    pub ip: String,
    /// Approximate region of that address
    pub region: String,
}
