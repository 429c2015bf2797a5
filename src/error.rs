//! Error types for vaultmaps.
//!
//! Each concern has its own error enum; [`Error`] wraps them so commands can
//! propagate everything with `?`.

use thiserror::Error;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Expand(#[from] ExpandError),

    #[error(transparent)]
    Flatten(#[from] FlattenError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Encrypt(#[from] EncryptError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while expanding a flat `a.b=value,...` string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpandError {
    #[error("entry {position} is malformed: missing '=' in '{entry}'")]
    MissingSeparator { position: usize, entry: String },

    #[error("entry {position} has an empty key path segment: '{entry}'")]
    EmptyPath { position: usize, entry: String },

    #[error("entry {position} descends through '{path}', which already holds a value")]
    Conflict { position: usize, path: String },
}

impl ExpandError {
    /// Whether this is an input format error (as opposed to a conflict).
    pub fn is_format_error(&self) -> bool {
        !matches!(self, ExpandError::Conflict { .. })
    }
}

/// Errors raised while flattening a document back into a flat string.
#[derive(Error, Debug)]
pub enum FlattenError {
    #[error("yaml parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("document root must be a mapping")]
    NotAMapping,

    #[error("unsupported value at '{path}': only strings, numbers and booleans are allowed")]
    UnsupportedValue { path: String },

    #[error("key '{key}' cannot be flattened: contains '{ch}'")]
    ReservedInKey { key: String, ch: char },

    #[error("value at '{path}' cannot be flattened: contains ','")]
    ReservedInValue { path: String },
}

/// Errors talking to Vault.
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("vault returned {status} for {url}{}", format_vault_errors(.errors))]
    Status {
        status: u16,
        url: String,
        errors: Vec<String>,
    },

    #[error("vault login response did not contain a client token")]
    MissingClientToken,

    #[error("secret at '{path}' has no field '{field}'")]
    MissingField { path: String, field: String },

    #[error("field '{field}' of secret '{path}' is not a string")]
    FieldNotString { path: String, field: String },

    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl VaultError {
    /// Whether Vault rejected our credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, VaultError::Status { status, .. } if *status == 401 || *status == 403)
    }
}

fn format_vault_errors(errors: &[String]) -> String {
    if errors.is_empty() {
        String::new()
    } else {
        format!(": {}", errors.join("; "))
    }
}

/// Errors building or writing the ConfigMap manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("no service name found in secret path '{0}'")]
    NoServiceName(String),

    #[error("failed to serialize manifest: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors invoking the external encryption tool.
///
/// These never abort a render; they are reported as warnings.
#[derive(Error, Debug)]
pub enum EncryptError {
    #[error("{binary} not found on PATH")]
    NotFound { binary: String },

    #[error("failed to run {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{binary} exited with {code}: {stderr}")]
    Failed {
        binary: String,
        code: String,
        stderr: String,
    },
}

/// Configuration file and settings errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(String),

    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing required setting: {0}")]
    Missing(&'static str),
}

/// Input validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid {kind} '{value}': {reason}")]
    InvalidName {
        kind: &'static str,
        value: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
