//! Render command.
//!
//! Logs in to Vault, reads the secret blob, builds the ConfigMap, writes it
//! and encrypts it with sops. Each step runs once, in order.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::cli::output;
use crate::cli::RenderArgs;
use crate::core::config::{Config, Credentials, Overrides, Settings};
use crate::core::encrypt::Sops;
use crate::core::manifest::{self, Target};
use crate::core::vault::VaultClient;
use crate::error::{Result, VaultError};

impl From<RenderArgs> for Overrides {
    fn from(args: RenderArgs) -> Self {
        Self {
            vault_address: args.vault_address,
            github_token: args.github_token,
            vault_token: args.vault_token,
            secret_path: args.secret_path,
            secret_field: args.secret_field,
            auth_mount: args.auth_mount,
            skip_verify: args.tls_skip_verify,
            timeout_secs: args.timeout,
            output_path: args.output_path,
            layout: args.layout,
            data_key: args.data_key,
            name: args.name,
            namespace: args.namespace,
            on_conflict: args.on_conflict,
            no_encrypt: args.no_encrypt,
            sops_binary: args.sops_bin,
            encrypted_regex: args.encrypted_regex,
            dry_run: args.dry_run,
        }
    }
}

/// Run `render`.
pub fn execute(args: RenderArgs, config_path: Option<&Path>) -> Result<()> {
    let config = Config::discover(config_path)?;
    let settings = Settings::resolve(args.into(), config)?;
    debug!(?settings, "render settings");

    // Resolve the target before talking to Vault so a bad path fails fast.
    let target = Target::resolve(
        &settings.secret_path,
        &settings.name_suffix,
        settings.name.as_deref(),
        settings.namespace.as_deref(),
    )?;

    let blob = fetch_blob(&settings)?;
    let data = manifest::build_data(
        &blob,
        settings.layout,
        &settings.data_key,
        settings.on_conflict,
    )?;
    let yaml = manifest::render(&manifest::config_map(&target, data))?;

    if settings.dry_run {
        print!("{}", yaml);
        return Ok(());
    }

    let path = manifest::write(&settings.output_path, &target, &yaml)?;
    output::success(&format!("wrote {}", output::path(&path.display().to_string())));
    output::kv("name:", &target.name);
    output::kv("namespace:", &target.namespace);

    if !settings.encrypt {
        info!("encryption disabled");
        return Ok(());
    }

    let sops = Sops::new(settings.sops_binary.clone(), settings.encrypted_regex.clone());
    match sops.encrypt_in_place(&path) {
        Ok(()) => output::success("encrypted with sops"),
        Err(e) => {
            warn!(error = %e, path = %path.display(), "encryption failed");
            output::warn(&format!("manifest left unencrypted: {}", e));
        }
    }

    Ok(())
}

/// Log in (unless a Vault token was given) and read the secret blob.
fn fetch_blob(settings: &Settings) -> Result<String> {
    let client = VaultClient::new(
        &settings.vault_address,
        settings.skip_verify,
        settings.timeout,
    )?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(VaultError::Runtime)?;

    let blob = rt.block_on(async {
        let token = match &settings.credentials {
            Credentials::VaultToken(token) => token.clone(),
            Credentials::GithubToken(github) => {
                client.login_github(&settings.auth_mount, github).await?
            }
        };

        client
            .read_field(&token, &settings.secret_path, &settings.secret_field)
            .await
    })?;

    debug!(bytes = blob.len(), "secret read");
    Ok(blob)
}
