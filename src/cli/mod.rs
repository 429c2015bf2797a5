//! Command-line interface.

pub mod completions;
pub mod expand;
pub mod flatten;
pub mod output;
pub mod render;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::core::expand::ConflictPolicy;
use crate::core::manifest::Layout;

/// vaultmaps - Render Vault secrets into sops-encrypted Kubernetes ConfigMaps.
#[derive(Parser)]
#[command(
    name = "vaultmaps",
    about = "Render Vault secrets into sops-encrypted Kubernetes ConfigMaps",
    version
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (defaults to ./vaultmaps.toml if present)
    #[arg(long, global = true, env = "VAULTMAPS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Fetch a secret from Vault and write it as an encrypted ConfigMap
    Render(RenderArgs),

    /// Expand a flat `a.b=value,...` string into YAML or JSON
    Expand {
        /// Flat string (reads --file or stdin when omitted)
        input: Option<String>,
        /// Read the flat string from a file
        #[arg(short, long, conflicts_with = "input")]
        file: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Yaml)]
        format: Format,
        /// What to do when a key descends through an existing value
        #[arg(long, value_enum, default_value_t = ConflictPolicy::Reject)]
        on_conflict: ConflictPolicy,
    },

    /// Flatten a YAML mapping into a flat `a.b=value,...` string
    Flatten {
        /// YAML file (reads stdin when omitted)
        file: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments of `render`.
#[derive(Args, Default)]
pub struct RenderArgs {
    /// Vault server address
    #[arg(long, env = "VAULT_ADDR")]
    pub vault_address: Option<String>,

    /// GitHub token exchanged for a Vault token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Vault token, skips the GitHub login
    #[arg(long, env = "VAULT_TOKEN", hide_env_values = true)]
    pub vault_token: Option<String>,

    /// Path of the secret, e.g. secret/data/service-billing
    #[arg(long, env = "SECRET_PATH")]
    pub secret_path: Option<String>,

    /// Secret field holding the flat string
    #[arg(long)]
    pub secret_field: Option<String>,

    /// Mount path of the GitHub auth method
    #[arg(long)]
    pub auth_mount: Option<String>,

    /// Skip TLS certificate verification
    #[arg(
        long,
        env = "VAULT_SKIP_VERIFY",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub tls_skip_verify: bool,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Directory the manifest is written to
    #[arg(long, env = "OUTPUT_PATH")]
    pub output_path: Option<PathBuf>,

    /// ConfigMap data layout
    #[arg(long, value_enum)]
    pub layout: Option<Layout>,

    /// Data key holding the nested YAML
    #[arg(long)]
    pub data_key: Option<String>,

    /// ConfigMap name (defaults to <service>-secure)
    #[arg(long)]
    pub name: Option<String>,

    /// ConfigMap namespace (defaults to <service>)
    #[arg(long)]
    pub namespace: Option<String>,

    /// What to do when a key descends through an existing value
    #[arg(long, value_enum)]
    pub on_conflict: Option<ConflictPolicy>,

    /// Write the manifest without encrypting it
    #[arg(long)]
    pub no_encrypt: bool,

    /// sops binary
    #[arg(long)]
    pub sops_bin: Option<String>,

    /// Regex of fields sops encrypts (empty encrypts everything)
    #[arg(long)]
    pub encrypted_regex: Option<String>,

    /// Print the manifest instead of writing and encrypting it
    #[arg(long)]
    pub dry_run: bool,
}

/// Output formats for `expand`.
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum Format {
    Yaml,
    Json,
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Execute a command.
pub fn execute(command: Command, config: Option<PathBuf>) -> crate::error::Result<()> {
    use Command::*;

    match command {
        Render(args) => render::execute(args, config.as_deref()),
        Expand {
            input,
            file,
            format,
            on_conflict,
        } => expand::execute(input, file.as_deref(), format, on_conflict),
        Flatten { file } => flatten::execute(file.as_deref()),
        Completions { shell } => completions::execute(shell),
    }
}
