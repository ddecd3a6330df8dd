//! Marketplace and plugin (un)registration through `claude plugin ...`

use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::claude::ClaudeCli;
use crate::types::SyncResult;

pub const INSTALL_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct Installer {
    cli: ClaudeCli,
    timeout: Duration,
}

impl Default for Installer {
    fn default() -> Self {
        Self::new(ClaudeCli::default(), INSTALL_TIMEOUT)
    }
}

impl Installer {
    pub fn new(cli: ClaudeCli, timeout: Duration) -> Self {
        Self { cli, timeout }
    }

    pub fn build_marketplace_remove_command(&self, name: &str) -> String {
        format!("{} plugin marketplace remove {}", self.cli.binary(), name)
    }

    pub fn build_marketplace_add_command(&self, path: &Path) -> String {
        format!(
            "{} plugin marketplace add \"{}\"",
            self.cli.binary(),
            path.display()
        )
    }

    pub fn build_plugin_install_command(&self, plugin: &str, marketplace: &str) -> String {
        format!(
            "{} plugin install {}@{}",
            self.cli.binary(),
            plugin,
            marketplace
        )
    }

    /// Always succeeds: a marketplace that is not registered is fine.
    pub async fn remove_marketplace(&self, name: &str) -> SyncResult {
        let outcome = self
            .cli
            .run(["plugin", "marketplace", "remove", name], self.timeout)
            .await;

        match outcome {
            Ok(output) if output.success() => SyncResult::ok(format!("Removed marketplace {name}")),
            Ok(output) => {
                debug!(marketplace = name, reason = %output.failure_text(), "Marketplace remove failed");
                SyncResult::ok(format!("Marketplace {name} not installed (ok)"))
            }
            Err(e) => {
                debug!(marketplace = name, error = %e, "Marketplace remove failed");
                SyncResult::ok(format!("Marketplace {name} not installed (ok)"))
            }
        }
    }

    pub async fn add_marketplace(&self, path: &Path) -> SyncResult {
        let args = [
            OsStr::new("plugin"),
            OsStr::new("marketplace"),
            OsStr::new("add"),
            path.as_os_str(),
        ];

        match self.cli.run(args, self.timeout).await {
            Ok(output) if output.success() => {
                SyncResult::ok(format!("Added marketplace from {}", path.display()))
            }
            Ok(output) => SyncResult::failed(format!(
                "Failed to add marketplace: {}",
                output.failure_text()
            )),
            Err(e) => SyncResult::failed(format!("Failed to add marketplace: {}", e)),
        }
    }

    pub async fn install_plugin(&self, plugin: &str, marketplace: &str) -> SyncResult {
        let target = format!("{plugin}@{marketplace}");

        match self.cli.run(["plugin", "install", target.as_str()], self.timeout).await {
            Ok(output) if output.success() => SyncResult::ok(format!("Installed {target}")),
            Ok(output) => SyncResult::failed(format!(
                "Failed to install plugin: {}",
                output.failure_text()
            )),
            Err(e) => SyncResult::failed(format!("Failed to install plugin: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MISSING_BINARY: &str = "cps-test-missing-claude-binary";

    #[test]
    fn display_commands() {
        let installer = Installer::default();

        assert_eq!(
            installer.build_marketplace_remove_command("my-market"),
            "claude plugin marketplace remove my-market"
        );
        assert_eq!(
            installer.build_marketplace_add_command(Path::new("/path/with spaces/market")),
            "claude plugin marketplace add \"/path/with spaces/market\""
        );
        assert_eq!(
            installer.build_plugin_install_command("my-plugin", "my-market"),
            "claude plugin install my-plugin@my-market"
        );
    }

    #[tokio::test]
    async fn missing_binary() {
        let installer = Installer::new(ClaudeCli::new(MISSING_BINARY), INSTALL_TIMEOUT);

        let removed = installer.remove_marketplace("m").await;
        assert!(removed.success);
        assert_eq!(removed.message, "Marketplace m not installed (ok)");

        let added = installer.add_marketplace(Path::new("/tmp/m")).await;
        assert!(!added.success);
        assert!(added.message.starts_with("Failed to add marketplace: "));

        let installed = installer.install_plugin("p", "m").await;
        assert!(!installed.success);
        assert!(installed.message.starts_with("Failed to install plugin: "));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_commands() {
        let installer = Installer::new(ClaudeCli::new("true"), INSTALL_TIMEOUT);

        assert_eq!(
            installer.remove_marketplace("m").await.message,
            "Removed marketplace m"
        );
        assert!(installer.add_marketplace(Path::new("/tmp/m")).await.success);
        assert_eq!(installer.install_plugin("p", "m").await.message, "Installed p@m");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_commands() {
        let installer = Installer::new(ClaudeCli::new("false"), INSTALL_TIMEOUT);

        assert!(installer.remove_marketplace("m").await.success);
        assert_eq!(
            installer.add_marketplace(Path::new("/tmp/m")).await.message,
            "Failed to add marketplace: exit status 1"
        );
        assert!(!installer.install_plugin("p", "m").await.success);
    }
}
