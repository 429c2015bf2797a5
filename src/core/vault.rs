//! Vault HTTP client.
//!
//! Only the two calls vaultmaps needs: a GitHub auth login that exchanges a
//! GitHub token for a Vault client token, and a read of one string field of
//! a KV secret.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};
use zeroize::Zeroizing;

use crate::error::VaultError;

/// Header marking requests as Vault API requests.
const REQUEST_HEADER: &str = "X-Vault-Request";

/// Header carrying the client token.
const TOKEN_HEADER: &str = "X-Vault-Token";

#[derive(Serialize)]
struct LoginRequest<'a> {
    token: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    auth: Option<LoginAuth>,
}

#[derive(Deserialize)]
struct LoginAuth {
    client_token: Option<String>,
    #[serde(default)]
    policies: Vec<String>,
}

#[derive(Deserialize, Default)]
struct ErrorResponse {
    #[serde(default)]
    errors: Vec<String>,
}

/// A Vault API client bound to one server address.
#[derive(Debug, Clone)]
pub struct VaultClient {
    http: Client,
    address: String,
}

impl VaultClient {
    /// Build a client for `address` (e.g. `https://vault.example.com:8200`).
    ///
    /// `skip_verify` disables TLS certificate verification.
    pub fn new(
        address: &str,
        skip_verify: bool,
        timeout: Option<Duration>,
    ) -> Result<Self, VaultError> {
        let mut builder = Client::builder()
            .use_rustls_tls()
            .danger_accept_invalid_certs(skip_verify);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(VaultError::Client)?;

        Ok(Self {
            http,
            address: address.trim_end_matches('/').to_string(),
        })
    }

    /// Server address without a trailing slash.
    pub fn address(&self) -> &str {
        &self.address
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.address, path.trim_start_matches('/'))
    }

    /// Log in through the GitHub auth method mounted at `mount`.
    ///
    /// Returns the Vault client token.
    pub async fn login_github(
        &self,
        mount: &str,
        github_token: &str,
    ) -> Result<Zeroizing<String>, VaultError> {
        let url = self.url(&format!("auth/{}/login", mount.trim_matches('/')));
        debug!(%url, "logging in to vault");

        let response = self
            .http
            .put(&url)
            .header(REQUEST_HEADER, "true")
            .json(&LoginRequest {
                token: github_token,
            })
            .send()
            .await
            .map_err(|source| VaultError::Request {
                url: url.clone(),
                source,
            })?;

        let body: LoginResponse = check(response, &url)
            .await?
            .json()
            .await
            .map_err(|source| VaultError::Request {
                url: url.clone(),
                source,
            })?;

        let auth = body.auth.ok_or(VaultError::MissingClientToken)?;
        trace!(policies = ?auth.policies, "vault login succeeded");
        auth.client_token
            .filter(|token| !token.is_empty())
            .map(Zeroizing::new)
            .ok_or(VaultError::MissingClientToken)
    }

    /// Read the string `field` of the secret at `path`.
    ///
    /// KV v2 responses nest the payload under `data.data`; KV v1 responses
    /// put it directly under `data`. Both are accepted.
    pub async fn read_field(
        &self,
        token: &str,
        path: &str,
        field: &str,
    ) -> Result<String, VaultError> {
        let url = self.url(path);
        debug!(%url, field, "reading secret");

        let response = self
            .http
            .get(&url)
            .header(TOKEN_HEADER, token)
            .header(REQUEST_HEADER, "true")
            .send()
            .await
            .map_err(|source| VaultError::Request {
                url: url.clone(),
                source,
            })?;

        let body: Value = check(response, &url)
            .await?
            .json()
            .await
            .map_err(|source| VaultError::Request {
                url: url.clone(),
                source,
            })?;

        extract_field(&body, path, field)
    }
}

async fn check(response: Response, url: &str) -> Result<Response, VaultError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let errors = response
        .json::<ErrorResponse>()
        .await
        .unwrap_or_default()
        .errors;

    Err(VaultError::Status {
        status: status.as_u16(),
        url: url.to_string(),
        errors,
    })
}

fn extract_field(body: &Value, path: &str, field: &str) -> Result<String, VaultError> {
    let data = body.get("data");
    let value = data
        .and_then(|d| d.get("data"))
        .and_then(|d| d.get(field))
        .or_else(|| data.and_then(|d| d.get(field)))
        .ok_or_else(|| VaultError::MissingField {
            path: path.to_string(),
            field: field.to_string(),
        })?;

    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| VaultError::FieldNotString {
            path: path.to_string(),
            field: field.to_string(),
        })
}
