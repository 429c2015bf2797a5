//! Fake Vault server helpers.

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Client token handed out by the fake GitHub login.
pub const CLIENT_TOKEN: &str = "s.test-client-token";

/// Start a fake Vault accepting GitHub logins and serving `blob` at
/// `secret_path` under the `helmSecretValues` field.
pub async fn fake_vault(secret_path: &str, blob: &str) -> MockServer {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_secret(&server, secret_path, blob).await;
    server
}

/// Accept `PUT /v1/auth/github/login`.
pub async fn mount_login(server: &MockServer) {
    Mock::given(method("PUT"))
        .and(path("/v1/auth/github/login"))
        .and(header("x-vault-request", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "auth": {"client_token": CLIENT_TOKEN, "policies": ["default"]}
        })))
        .mount(server)
        .await;
}

/// Serve a KV v2 secret requiring the test client token.
pub async fn mount_secret(server: &MockServer, secret_path: &str, blob: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/{}", secret_path)))
        .and(header("x-vault-token", CLIENT_TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "data": {"helmSecretValues": blob},
                "metadata": {"version": 1, "destroyed": false}
            }
        })))
        .mount(server)
        .await;
}
