//! Constants used throughout vaultmaps.
//!
//! Centralizes defaults and well-known names.

/// Settings file looked up in the current directory.
pub const CONFIG_FILE: &str = "vaultmaps.toml";

/// Settings file relative to the user config directory.
pub const USER_CONFIG_FILE: &str = "vaultmaps/config.toml";

/// Vault's own default address.
pub const VAULT_ADDRESS: &str = "https://127.0.0.1:8200";

/// Mount path of the GitHub auth method.
pub const AUTH_MOUNT: &str = "github";

/// Secret field holding the flat `a.b=value,...` blob.
pub const SECRET_FIELD: &str = "helmSecretValues";

/// Suffix appended to the service name to form the ConfigMap name.
pub const NAME_SUFFIX: &str = "-secure";

/// Data key used by the nested layout.
pub const DATA_KEY: &str = "values.yaml";

/// Directory manifests are written to.
pub const OUTPUT_PATH: &str = ".";

/// Encryption tool.
pub const SOPS_BINARY: &str = "sops";

/// Fields sops encrypts in the manifest.
pub const ENCRYPTED_REGEX: &str = "^(data|binaryData)$";

/// Environment variable holding a tracing filter.
pub const LOG_ENV: &str = "VAULTMAPS_LOG";
