//! In-place encryption with `sops`.
//!
//! ## Requirements
//!
//! - `sops` must be installed (or its path configured)
//! - A creation rule (`.sops.yaml`) or key flags must be available to sops
//!
//! Only the fields matching the encrypted regex are encrypted, so the
//! manifest stays readable by tooling that does not decrypt it.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, trace};

use crate::core::constants;
use crate::error::EncryptError;

/// A configured `sops` invocation.
#[derive(Debug, Clone)]
pub struct Sops {
    binary: String,
    encrypted_regex: Option<String>,
}

impl Default for Sops {
    fn default() -> Self {
        Self {
            binary: constants::SOPS_BINARY.to_string(),
            encrypted_regex: Some(constants::ENCRYPTED_REGEX.to_string()),
        }
    }
}

impl Sops {
    /// Create an invocation of `binary` (a name on PATH or a path).
    ///
    /// With `encrypted_regex` of `None`, sops encrypts every value.
    pub fn new(binary: impl Into<String>, encrypted_regex: Option<String>) -> Self {
        Self {
            binary: binary.into(),
            encrypted_regex,
        }
    }

    /// Resolve the binary to a path.
    fn locate(&self) -> Result<PathBuf, EncryptError> {
        which::which(&self.binary).map_err(|_| EncryptError::NotFound {
            binary: self.binary.clone(),
        })
    }

    /// Arguments passed to sops for `file`.
    pub fn args(&self, file: &Path) -> Vec<String> {
        let mut args = vec!["--encrypt".to_string(), "--in-place".to_string()];
        if let Some(regex) = &self.encrypted_regex {
            args.push("--encrypted-regex".to_string());
            args.push(regex.clone());
        }
        args.push(file.display().to_string());
        args
    }

    /// Encrypt `file` in place.
    ///
    /// # Errors
    ///
    /// Returns `EncryptError` if sops cannot be found or started, or exits
    /// with a failure status. Callers treat these as warnings.
    pub fn encrypt_in_place(&self, file: &Path) -> Result<(), EncryptError> {
        let binary = self.locate()?;
        let args = self.args(file);
        debug!(binary = %binary.display(), ?args, "running sops");

        let output = Command::new(&binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| EncryptError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            let code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            return Err(EncryptError::Failed {
                binary: self.binary.clone(),
                code,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        trace!(file = %file.display(), "encrypted");
        Ok(())
    }
}
