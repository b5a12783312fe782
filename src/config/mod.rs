pub mod toml_config;

pub use toml_config::{RendererKind, VerifierConfig};

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "cert-verify")]
#[command(about = "Checks an online-course certificate against its issuer's record")]
pub struct CliConfig {
    /// Certificate to verify (PDF or image)
    pub document: String,

    #[arg(long, help = "TOML configuration file")]
    pub config: Option<String>,

    #[arg(long, value_enum, help = "Verification page renderer")]
    pub renderer: Option<RendererKind>,

    #[arg(long, help = "Upper bound for loading a verification page")]
    pub timeout_secs: Option<u64>,

    #[arg(long, help = "Delay between readiness checks of a verification page")]
    pub poll_interval_ms: Option<u64>,

    #[arg(long, help = "Print the report as JSON")]
    pub json: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Loads the TOML file (if any) and layers the command-line flags on top.
    pub fn effective_config(&self) -> crate::utils::error::Result<VerifierConfig> {
        let mut config = match &self.config {
            Some(path) => VerifierConfig::from_file(path)?,
            None => VerifierConfig::default(),
        };

        if let Some(kind) = self.renderer {
            config.renderer.kind = Some(kind);
        }
        if let Some(timeout) = self.timeout_secs {
            config.renderer.timeout_seconds = Some(timeout);
        }
        if let Some(interval) = self.poll_interval_ms {
            config.renderer.poll_interval_ms = Some(interval);
        }

        Ok(config)
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use crate::core::ConfigProvider;
    use std::time::Duration;

    #[test]
    fn test_flags_override_defaults() {
        let cli = CliConfig::parse_from([
            "cert-verify",
            "cert.pdf",
            "--renderer",
            "chromium",
            "--timeout-secs",
            "12",
        ]);

        let config = cli.effective_config().unwrap();

        assert_eq!(cli.document, "cert.pdf");
        assert_eq!(config.renderer_kind(), RendererKind::Chromium);
        assert_eq!(config.render_timeout(), Duration::from_secs(12));
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
    }
}
