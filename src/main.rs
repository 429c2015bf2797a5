//! vaultmaps - Render Vault secrets into sops-encrypted Kubernetes ConfigMaps.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vaultmaps::cli::output;
use vaultmaps::cli::{execute, Cli};
use vaultmaps::core::constants;
use vaultmaps::error::{Error, ExpandError, ManifestError};

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env(constants::LOG_ENV).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("vaultmaps=debug")
        } else {
            EnvFilter::new("vaultmaps=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    if let Err(e) = execute(cli.command, cli.config) {
        let suggestion = match &e {
            Error::Expand(ExpandError::Conflict { .. }) => {
                Some("pass --on-conflict overwrite to replace values with nested keys")
            }
            Error::Manifest(ManifestError::NoServiceName(_)) => {
                Some("pass --name and --namespace")
            }
            Error::Vault(v) if v.is_auth_failure() => {
                Some("check --github-token / --vault-token and the secret path policy")
            }
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
