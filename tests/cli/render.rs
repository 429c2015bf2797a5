//! Tests for `vaultmaps render` against a fake Vault.

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::*;

const SECRET_PATH: &str = "secret/data/team/service-Billing";
const BLOB: &str = "mysql.ro.password=ro-pw,mysql.rw.password=rw-pw,debug=true";

fn parse(yaml: &str) -> serde_yaml::Value {
    serde_yaml::from_str(yaml).expect("manifest is valid yaml")
}

#[tokio::test(flavor = "multi_thread")]
async fn test_render_writes_nested_config_map() {
    let server = fake_vault(SECRET_PATH, BLOB).await;
    let t = Test::new();

    let output = t.render(&server.uri(), SECRET_PATH, &["--no-encrypt"]);
    assert_success(&output);
    assert!(stdout(&output).contains("billing.yaml"));

    let manifest = parse(&t.read("out/billing.yaml"));
    assert_eq!(manifest["apiVersion"].as_str(), Some("v1"));
    assert_eq!(manifest["kind"].as_str(), Some("ConfigMap"));
    assert_eq!(manifest["metadata"]["name"].as_str(), Some("billing-secure"));
    assert_eq!(manifest["metadata"]["namespace"].as_str(), Some("billing"));

    let values = parse(manifest["data"]["values.yaml"].as_str().unwrap());
    assert_eq!(values["mysql"]["ro"]["password"].as_str(), Some("ro-pw"));
    assert_eq!(values["mysql"]["rw"]["password"].as_str(), Some("rw-pw"));
    assert_eq!(values["debug"].as_str(), Some("true"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_render_flat_layout() {
    let server = fake_vault(SECRET_PATH, BLOB).await;
    let t = Test::new();

    let output = t.render(
        &server.uri(),
        SECRET_PATH,
        &["--no-encrypt", "--layout", "flat", "--name", "creds"],
    );
    assert_success(&output);

    let manifest = parse(&t.read("out/billing.yaml"));
    assert_eq!(manifest["metadata"]["name"].as_str(), Some("creds"));
    assert_eq!(
        manifest["data"]["mysql.ro.password"].as_str(),
        Some("ro-pw")
    );
    assert_eq!(manifest["data"]["debug"].as_str(), Some("true"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_render_namespace_override_keeps_service_file_name() {
    let server = fake_vault(SECRET_PATH, BLOB).await;
    let t = Test::new();

    let output = t.render(
        &server.uri(),
        SECRET_PATH,
        &["--no-encrypt", "--namespace", "payments"],
    );
    assert_success(&output);
    assert!(!t.path("out/payments.yaml").exists());

    let manifest = parse(&t.read("out/billing.yaml"));
    assert_eq!(manifest["metadata"]["namespace"].as_str(), Some("payments"));
    assert_eq!(manifest["metadata"]["name"].as_str(), Some("billing-secure"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_render_accepts_numeric_skip_verify() {
    let server = fake_vault(SECRET_PATH, BLOB).await;
    let t = Test::new();
    let uri = server.uri();

    for value in ["1", "0", "true", "yes"] {
        let output = t
            .cmd()
            .args([
                "render",
                "--vault-address",
                uri.as_str(),
                "--github-token",
                "gh-token",
                "--secret-path",
                SECRET_PATH,
                "--output-path",
                "out",
                "--no-encrypt",
            ])
            .env("VAULT_SKIP_VERIFY", value)
            .output()
            .unwrap();
        assert_success(&output);
    }
    assert!(t.path("out/billing.yaml").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_render_with_vault_token_skips_login() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/auth/github/login"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    mount_secret(&server, SECRET_PATH, BLOB).await;
    let t = Test::new();
    let uri = server.uri();

    let output = t
        .cmd()
        .args([
            "render",
            "--vault-address",
            uri.as_str(),
            "--secret-path",
            SECRET_PATH,
            "--output-path",
            "out",
            "--no-encrypt",
        ])
        .env("VAULT_TOKEN", CLIENT_TOKEN)
        .output()
        .unwrap();
    assert_success(&output);
    assert!(t.path("out/billing.yaml").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_render_dry_run_prints_manifest() {
    let server = fake_vault(SECRET_PATH, BLOB).await;
    let t = Test::new();

    let output = t.render(&server.uri(), SECRET_PATH, &["--dry-run"]);
    assert_success(&output);

    let manifest = parse(&stdout(&output));
    assert_eq!(manifest["kind"].as_str(), Some("ConfigMap"));
    assert!(!t.path("out").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_render_missing_sops_only_warns() {
    let server = fake_vault(SECRET_PATH, BLOB).await;
    let t = Test::new();

    let output = t.render(
        &server.uri(),
        SECRET_PATH,
        &["--sops-bin", "vaultmaps-test-no-such-sops"],
    );
    assert_success(&output);
    assert_stderr_contains(&output, "manifest left unencrypted");
    assert!(t.read("out/billing.yaml").contains("ro-pw"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_render_conflicting_blob_fails() {
    let server = fake_vault(SECRET_PATH, "a=1,a.b=2").await;
    let t = Test::new();

    let output = t.render(&server.uri(), SECRET_PATH, &["--no-encrypt"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "--on-conflict overwrite");
    assert!(!t.path("out/billing.yaml").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_render_conflict_overwrite_from_config_file() {
    let server = fake_vault(SECRET_PATH, "a=1,a.b=2").await;
    let t = Test::new();
    t.write(
        "vaultmaps.toml",
        "[manifest]\non_conflict = \"overwrite\"\ndata_key = \"app.yaml\"\n",
    );

    let output = t.render(&server.uri(), SECRET_PATH, &["--no-encrypt"]);
    assert_success(&output);

    let manifest = parse(&t.read("out/billing.yaml"));
    let values = parse(manifest["data"]["app.yaml"].as_str().unwrap());
    assert_eq!(values["a"]["b"].as_str(), Some("2"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_render_permission_denied() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/{}", SECRET_PATH)))
        .and(header("x-vault-token", CLIENT_TOKEN))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"errors": ["permission denied"]})),
        )
        .mount(&server)
        .await;
    let t = Test::new();

    let output = t.render(&server.uri(), SECRET_PATH, &["--no-encrypt"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "403");
    assert_stderr_contains(&output, "permission denied");
}

#[test]
fn test_render_without_service_name_fails_before_network() {
    let t = Test::new();

    // Nothing listens here; the path check must fail first.
    let output = t.render("http://127.0.0.1:9", "secret/data/billing", &["--no-encrypt"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "no service name");
    assert_stderr_contains(&output, "--name");
}

#[test]
fn test_render_requires_secret_path() {
    let t = Test::new();

    let output = t
        .cmd()
        .args(["render", "--github-token", "gh"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "secret path");
}
