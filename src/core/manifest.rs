//! ConfigMap manifest construction.
//!
//! Derives the service name from the Vault secret path, wraps the secret
//! data in a `v1/ConfigMap` and writes it as YAML.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::Deserialize;
use tracing::debug;

use crate::core::expand::{self, ConflictPolicy, Node};
use crate::core::validation;
use crate::error::{ManifestError, Result};

/// How secret entries are laid out in the ConfigMap's `data`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// One data key holding the expanded tree as YAML
    #[default]
    Nested,
    /// One data key per entry, value verbatim
    Flat,
}

/// Name and namespace of the generated ConfigMap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    pub namespace: String,
    /// Service name found in the secret path, if any.
    pub service: Option<String>,
}

impl Target {
    /// Resolve the target from the secret path and optional overrides.
    ///
    /// The service name found in `secret_path` provides the namespace and,
    /// with `suffix` appended, the name. Either can be overridden.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::NoServiceName` if a value is missing and the
    /// path has no service segment, or `ValidationError` if the result is
    /// not a valid resource name.
    pub fn resolve(
        secret_path: &str,
        suffix: &str,
        name: Option<&str>,
        namespace: Option<&str>,
    ) -> Result<Self> {
        let service = service_name(secret_path);
        let missing = || ManifestError::NoServiceName(secret_path.to_string());

        let namespace = match namespace {
            Some(ns) => ns.to_string(),
            None => service.clone().ok_or_else(missing)?,
        };
        let name = match name {
            Some(name) => name.to_string(),
            None => format!("{}{}", service.clone().ok_or_else(missing)?, suffix),
        };

        validation::validate_resource_name("name", &name)?;
        validation::validate_resource_name("namespace", &namespace)?;

        Ok(Self {
            name,
            namespace,
            service,
        })
    }

    /// File name the manifest is written to, `<service>.yaml`.
    ///
    /// Falls back to the namespace when the path has no service segment.
    pub fn file_name(&self) -> String {
        let stem = self.service.as_deref().unwrap_or(&self.namespace);
        format!("{}.yaml", stem)
    }
}

/// Find the service name in a secret path.
///
/// Looks at `/`-separated segments containing `service` and takes the part
/// between the first and second `-`, lowercased. The last matching segment
/// wins: `secret/data/team/service-Billing` gives `billing`.
pub fn service_name(secret_path: &str) -> Option<String> {
    secret_path
        .split('/')
        .filter(|segment| segment.contains("service"))
        .filter_map(|segment| segment.split('-').nth(1))
        .filter(|name| !name.is_empty())
        .last()
        .map(str::to_lowercase)
}

/// Build the ConfigMap `data` for a secret blob.
///
/// # Errors
///
/// Returns `ExpandError` for a malformed blob, or `ValidationError` for an
/// unusable data key.
pub fn build_data(
    blob: &str,
    layout: Layout,
    data_key: &str,
    policy: ConflictPolicy,
) -> Result<BTreeMap<String, String>> {
    let mut data = BTreeMap::new();

    match layout {
        Layout::Nested => {
            validation::validate_data_key(data_key)?;
            let tree = expand::expand_with(blob, policy)?;
            data.insert(data_key.to_string(), render_tree(&tree)?);
        }
        Layout::Flat => {
            for entry in expand::parse_entries(blob)? {
                validation::validate_data_key(&entry.path)?;
                data.insert(entry.path, entry.value);
            }
        }
    }

    Ok(data)
}

/// Render an expanded tree as YAML. An empty tree renders as `{}`.
pub fn render_tree(tree: &Node) -> Result<String> {
    Ok(serde_yaml::to_string(tree).map_err(ManifestError::Serialize)?)
}

/// Wrap `data` in a ConfigMap for `target`.
pub fn config_map(target: &Target, data: BTreeMap<String, String>) -> ConfigMap {
    ConfigMap {
        metadata: ObjectMeta {
            name: Some(target.name.clone()),
            namespace: Some(target.namespace.clone()),
            ..Default::default()
        },
        data: Some(data),
        ..Default::default()
    }
}

/// Serialize a ConfigMap to YAML.
pub fn render(config_map: &ConfigMap) -> Result<String> {
    Ok(serde_yaml::to_string(config_map).map_err(ManifestError::Serialize)?)
}

/// Write the manifest into `dir`, creating it if needed.
///
/// The file holds plaintext secrets until it is encrypted, so on Unix it is
/// created with mode 0600.
///
/// # Errors
///
/// Returns `ManifestError::Write` if the directory or file cannot be written.
pub fn write(dir: &Path, target: &Target, contents: &str) -> Result<PathBuf> {
    let path = dir.join(target.file_name());
    debug!(path = %path.display(), bytes = contents.len(), "writing manifest");

    let write_err = |source| ManifestError::Write {
        path: path.display().to_string(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(write_err)?;

    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .mode(0o600)
            .open(&path)
            .map_err(write_err)?;
        file.write_all(contents.as_bytes()).map_err(write_err)?;
        file.flush().map_err(write_err)?;

        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
            .map_err(write_err)?;
    }

    #[cfg(not(unix))]
    {
        std::fs::write(&path, contents).map_err(write_err)?;
    }

    Ok(path)
}
