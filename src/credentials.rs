//! # Credential Provider Glue
//!
//! One stateless HTTP GET against a central credential provider to retrieve
//! the vault password, instead of keeping it in a profile or environment
//! variable. The provider is addressed by URL; the query names the
//! application id and the account object; the response is a small JSON
//! document carrying the secret and optional error fields.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Credential provider response body.
#[derive(Debug, Deserialize)]
pub struct CredentialResponse {
    /// The retrieved secret.
    #[serde(rename = "Content", default)]
    pub content: Option<String>,
    /// Account user name, when the provider reports it.
    #[serde(rename = "UserName", default)]
    pub user_name: Option<String>,
    /// Provider error code; `"0"` or absent on success.
    #[serde(rename = "ErrorCode", default)]
    pub error_code: Option<String>,
    /// Provider error message accompanying a non-zero code.
    #[serde(rename = "ErrorMsg", default)]
    pub error_message: Option<String>,
}

impl CredentialResponse {
    /// Turn the provider response into the secret, surfacing provider-level
    /// errors that arrive with HTTP 200.
    fn into_secret(self, url: &str) -> Result<String> {
        if let Some(code) = self.error_code.filter(|c| !c.is_empty() && c != "0") {
            return Err(Error::Network {
                url: url.to_string(),
                message: format!(
                    "provider error {}: {}",
                    code,
                    self.error_message.unwrap_or_default()
                ),
            });
        }
        self.content
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| Error::Network {
                url: url.to_string(),
                message: "provider response carries no secret".to_string(),
            })
    }
}

/// Retrieve the vault password for `object` from the credential provider.
///
/// Performs a single blocking GET; there are no retries. A flaky provider
/// surfaces as `Error::Network` and the operation aborts before anything is
/// fetched from the vault.
pub fn fetch_secret(provider: &str, app_id: &str, object: &str) -> Result<String> {
    let mut url = Url::parse(provider)?;
    url.query_pairs_mut()
        .append_pair("appid", app_id)
        .append_pair("object", object);
    let display_url = redacted(&url);

    let network_error = |message: String| Error::Network {
        url: display_url.clone(),
        message,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| network_error(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .map_err(|e| network_error(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(network_error(format!("HTTP {}", status)));
    }

    let body: CredentialResponse = response
        .json()
        .map_err(|e| network_error(format!("invalid response body: {}", e)))?;
    body.into_secret(&display_url)
}

/// The provider URL without its query, for error messages and logs.
fn redacted(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> CredentialResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_response_success() {
        let body = parse(r#"{"Content": "s3cret", "UserName": "backup-operator"}"#);
        assert_eq!(body.into_secret("http://cp/").unwrap(), "s3cret");
    }

    #[test]
    fn test_response_explicit_zero_error_code() {
        let body = parse(r#"{"Content": "s3cret", "ErrorCode": "0"}"#);
        assert_eq!(body.into_secret("http://cp/").unwrap(), "s3cret");
    }

    #[test]
    fn test_response_provider_error() {
        let body = parse(r#"{"ErrorCode": "APPAP004E", "ErrorMsg": "app not permitted"}"#);
        match body.into_secret("http://cp/") {
            Err(Error::Network { message, .. }) => {
                assert!(message.contains("APPAP004E"));
                assert!(message.contains("app not permitted"));
            }
            other => panic!("expected network error, got {:?}", other),
        }
    }

    #[test]
    fn test_response_empty_secret_rejected() {
        let body = parse(r#"{"Content": ""}"#);
        assert!(matches!(
            body.into_secret("http://cp/"),
            Err(Error::Network { .. })
        ));
    }

    #[test]
    fn test_fetch_secret_rejects_bad_url() {
        assert!(matches!(
            fetch_secret("not a url", "backup", "vault-user"),
            Err(Error::UrlParse(_))
        ));
    }
}
