//! Settings file handling and resolution of effective render settings.
//!
//! Settings come from three places, highest precedence first: command-line
//! flags (and their environment variables), an optional `vaultmaps.toml`
//! file, and built-in defaults.
//!
//! ```toml
//! [vault]
//! address = "https://vault.example.com:8200"
//! auth_mount = "github"
//! secret_field = "helmSecretValues"
//! skip_verify = false
//! timeout_secs = 30
//!
//! [manifest]
//! output_path = "deploy/secrets"
//! layout = "nested"
//! data_key = "values.yaml"
//! name_suffix = "-secure"
//! on_conflict = "reject"
//!
//! [sops]
//! enabled = true
//! binary = "sops"
//! encrypted_regex = "^(data|binaryData)$"
//! ```

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use zeroize::Zeroizing;

use crate::core::constants;
use crate::core::expand::ConflictPolicy;
use crate::core::manifest::Layout;
use crate::error::{ConfigError, Result};

/// Contents of a `vaultmaps.toml` settings file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub vault: VaultSection,
    #[serde(default)]
    pub manifest: ManifestSection,
    #[serde(default)]
    pub sops: SopsSection,
}

/// `[vault]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VaultSection {
    pub address: Option<String>,
    pub auth_mount: Option<String>,
    pub secret_field: Option<String>,
    pub skip_verify: Option<bool>,
    pub timeout_secs: Option<u64>,
}

/// `[manifest]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestSection {
    pub output_path: Option<PathBuf>,
    pub layout: Option<Layout>,
    pub data_key: Option<String>,
    pub name_suffix: Option<String>,
    pub on_conflict: Option<ConflictPolicy>,
}

/// `[sops]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SopsSection {
    pub enabled: Option<bool>,
    pub binary: Option<String>,
    /// An empty string encrypts every value.
    pub encrypted_regex: Option<String>,
}

impl Config {
    /// Parse settings from TOML text. `origin` is used in error messages.
    pub fn parse(contents: &str, origin: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|source| {
            ConfigError::Parse {
                path: origin.to_string(),
                source,
            }
            .into()
        })
    }

    /// Load settings from a file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if the file doesn't exist, or
    /// `ConfigError::Parse` if the TOML is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        let display = path.display().to_string();
        debug!(path = %path.display(), "loading config");

        if !path.exists() {
            return Err(ConfigError::NotFound(display).into());
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: display.clone(),
            source,
        })?;

        Self::parse(&contents, &display)
    }

    /// Find and load the settings file.
    ///
    /// An explicit path must exist. Otherwise `./vaultmaps.toml` is tried,
    /// then `<config dir>/vaultmaps/config.toml`; with neither present the
    /// defaults are used.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let local = PathBuf::from(constants::CONFIG_FILE);
        if local.exists() {
            return Self::load(&local);
        }

        if let Some(user) = dirs::config_dir().map(|d| d.join(constants::USER_CONFIG_FILE)) {
            if user.exists() {
                return Self::load(&user);
            }
        }

        debug!("no config file found, using defaults");
        Ok(Self::default())
    }
}

/// Credentials used to reach Vault.
pub enum Credentials {
    /// A Vault token used as-is.
    VaultToken(Zeroizing<String>),
    /// A GitHub token exchanged for a Vault token.
    GithubToken(Zeroizing<String>),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::VaultToken(_) => f.write_str("VaultToken(<redacted>)"),
            Credentials::GithubToken(_) => f.write_str("GithubToken(<redacted>)"),
        }
    }
}

/// Values given on the command line, all optional.
#[derive(Default)]
pub struct Overrides {
    pub vault_address: Option<String>,
    pub github_token: Option<String>,
    pub vault_token: Option<String>,
    pub secret_path: Option<String>,
    pub secret_field: Option<String>,
    pub auth_mount: Option<String>,
    pub skip_verify: bool,
    pub timeout_secs: Option<u64>,
    pub output_path: Option<PathBuf>,
    pub layout: Option<Layout>,
    pub data_key: Option<String>,
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub on_conflict: Option<ConflictPolicy>,
    pub no_encrypt: bool,
    pub sops_binary: Option<String>,
    pub encrypted_regex: Option<String>,
    pub dry_run: bool,
}

fn redact(token: &Option<String>) -> Option<&'static str> {
    token.as_ref().map(|_| "<redacted>")
}

impl fmt::Debug for Overrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overrides")
            .field("vault_address", &self.vault_address)
            .field("github_token", &redact(&self.github_token))
            .field("vault_token", &redact(&self.vault_token))
            .field("secret_path", &self.secret_path)
            .field("secret_field", &self.secret_field)
            .field("auth_mount", &self.auth_mount)
            .field("skip_verify", &self.skip_verify)
            .field("timeout_secs", &self.timeout_secs)
            .field("output_path", &self.output_path)
            .field("layout", &self.layout)
            .field("data_key", &self.data_key)
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("on_conflict", &self.on_conflict)
            .field("no_encrypt", &self.no_encrypt)
            .field("sops_binary", &self.sops_binary)
            .field("encrypted_regex", &self.encrypted_regex)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

/// Effective settings for one `render` run.
#[derive(Debug)]
pub struct Settings {
    pub vault_address: String,
    pub credentials: Credentials,
    pub auth_mount: String,
    pub secret_path: String,
    pub secret_field: String,
    pub skip_verify: bool,
    pub timeout: Option<Duration>,
    pub output_path: PathBuf,
    pub layout: Layout,
    pub data_key: String,
    pub name_suffix: String,
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub on_conflict: ConflictPolicy,
    pub encrypt: bool,
    pub sops_binary: String,
    pub encrypted_regex: Option<String>,
    pub dry_run: bool,
}

impl Settings {
    /// Merge command-line overrides over the settings file and defaults.
    ///
    /// A Vault token takes precedence over a GitHub token.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` when no secret path or no credentials
    /// were given.
    pub fn resolve(overrides: Overrides, config: Config) -> Result<Self> {
        let Config {
            vault,
            manifest,
            sops,
        } = config;

        let secret_path = non_empty(overrides.secret_path)
            .ok_or(ConfigError::Missing("secret path (--secret-path)"))?;

        let credentials = match (
            non_empty(overrides.vault_token),
            non_empty(overrides.github_token),
        ) {
            (Some(token), _) => Credentials::VaultToken(Zeroizing::new(token)),
            (None, Some(token)) => Credentials::GithubToken(Zeroizing::new(token)),
            (None, None) => {
                return Err(ConfigError::Missing("credentials (--github-token or --vault-token)").into())
            }
        };

        let encrypted_regex = overrides
            .encrypted_regex
            .or(sops.encrypted_regex)
            .unwrap_or_else(|| constants::ENCRYPTED_REGEX.to_string());

        Ok(Self {
            vault_address: overrides
                .vault_address
                .or(vault.address)
                .unwrap_or_else(|| constants::VAULT_ADDRESS.to_string()),
            credentials,
            auth_mount: overrides
                .auth_mount
                .or(vault.auth_mount)
                .unwrap_or_else(|| constants::AUTH_MOUNT.to_string()),
            secret_path,
            secret_field: overrides
                .secret_field
                .or(vault.secret_field)
                .unwrap_or_else(|| constants::SECRET_FIELD.to_string()),
            skip_verify: overrides.skip_verify || vault.skip_verify.unwrap_or(false),
            timeout: overrides
                .timeout_secs
                .or(vault.timeout_secs)
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            output_path: overrides
                .output_path
                .or(manifest.output_path)
                .unwrap_or_else(|| PathBuf::from(constants::OUTPUT_PATH)),
            layout: overrides.layout.or(manifest.layout).unwrap_or_default(),
            data_key: overrides
                .data_key
                .or(manifest.data_key)
                .unwrap_or_else(|| constants::DATA_KEY.to_string()),
            name_suffix: manifest
                .name_suffix
                .unwrap_or_else(|| constants::NAME_SUFFIX.to_string()),
            name: non_empty(overrides.name),
            namespace: non_empty(overrides.namespace),
            on_conflict: overrides
                .on_conflict
                .or(manifest.on_conflict)
                .unwrap_or_default(),
            encrypt: !overrides.no_encrypt && sops.enabled.unwrap_or(true),
            sops_binary: overrides
                .sops_binary
                .or(sops.binary)
                .unwrap_or_else(|| constants::SOPS_BINARY.to_string()),
            encrypted_regex: Some(encrypted_regex).filter(|re| !re.is_empty()),
            dry_run: overrides.dry_run,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
