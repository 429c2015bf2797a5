//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

/// Environment variables that would leak settings from the host.
const HOST_ENV: &[&str] = &[
    "VAULT_ADDR",
    "VAULT_TOKEN",
    "VAULT_SKIP_VERIFY",
    "GITHUB_TOKEN",
    "SECRET_PATH",
    "OUTPUT_PATH",
    "VAULTMAPS_CONFIG",
    "VAULTMAPS_LOG",
    "XDG_CONFIG_HOME",
];

impl Test {
    /// Create a vaultmaps command isolated from the host environment.
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("vaultmaps").expect("failed to find vaultmaps binary");
        for var in HOST_ENV {
            cmd.env_remove(var);
        }
        cmd.env("HOME", self.home.path());
        cmd.env("NO_COLOR", "1");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Shortcut for `vaultmaps expand <input>`.
    pub fn expand(&self, input: &str) -> Output {
        self.cmd()
            .args(["expand", input])
            .output()
            .expect("failed to run vaultmaps expand")
    }

    /// `vaultmaps render` against `vault_addr` with a GitHub token,
    /// without encryption, plus `extra` arguments.
    pub fn render(&self, vault_addr: &str, secret_path: &str, extra: &[&str]) -> Output {
        self.cmd()
            .args([
                "render",
                "--vault-address",
                vault_addr,
                "--github-token",
                "gh-token",
                "--secret-path",
                secret_path,
                "--output-path",
                "out",
            ])
            .args(extra)
            .output()
            .expect("failed to run vaultmaps render")
    }
}
