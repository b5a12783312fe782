//! Headless Chromium as the page-rendering backend for client-side
//! verification pages.

use crate::adapters::html::visible_text;
use crate::adapters::tools::resolve_executable;
use crate::domain::ports::PageRenderer;
use crate::utils::error::{Result, VerifyError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use url::Url;

const CHROMIUM_NAMES: [&str; 4] = [
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
];

pub struct ChromiumRenderer {
    executable: Option<PathBuf>,
    user_agent: String,
    virtual_time_budget_ms: u64,
}

impl ChromiumRenderer {
    pub fn new(
        configured: Option<&Path>,
        user_agent: impl Into<String>,
        virtual_time_budget_ms: u64,
    ) -> Self {
        Self {
            executable: resolve_executable(configured, &CHROMIUM_NAMES),
            user_agent: user_agent.into(),
            virtual_time_budget_ms,
        }
    }

    fn args(&self, profile_dir: &Path, url: &Url) -> Vec<String> {
        vec![
            "--headless=new".to_string(),
            "--disable-gpu".to_string(),
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--no-first-run".to_string(),
            format!("--user-data-dir={}", profile_dir.display()),
            format!("--user-agent={}", self.user_agent),
            format!("--virtual-time-budget={}", self.virtual_time_budget_ms),
            "--dump-dom".to_string(),
            url.to_string(),
        ]
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    async fn render(&self, url: &Url, timeout: Duration) -> Result<String> {
        let exe = self
            .executable
            .as_ref()
            .ok_or_else(|| VerifyError::ToolNotFound("chromium".to_string()))?;

        // Both guards are released on every exit path, including cancellation.
        let profile = tempfile::Builder::new().prefix("cert-verify-chromium-").tempdir()?;
        let child = Command::new(exe)
            .args(self.args(profile.path(), url))
            .kill_on_drop(true)
            .output();

        tracing::debug!("Rendering {} with {}", url, exe.display());

        let output = match tokio::time::timeout(timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(VerifyError::VerificationPageUnreachable {
                    url: url.to_string(),
                    reason: format!("browser failed to start: {}", e),
                })
            }
            Err(_) => {
                return Err(VerifyError::VerificationPageUnreachable {
                    url: url.to_string(),
                    reason: format!("browser did not finish within {:?}", timeout),
                })
            }
        };

        if !output.status.success() {
            return Err(VerifyError::VerificationPageUnreachable {
                url: url.to_string(),
                reason: format!(
                    "browser exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(visible_text(&String::from_utf8_lossy(&output.stdout)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_dump_dom_with_isolated_profile() {
        let renderer = ChromiumRenderer {
            executable: None,
            user_agent: "cert-verify".to_string(),
            virtual_time_budget_ms: 8000,
        };
        let url = Url::parse("https://alison.com/check/1").unwrap();
        let args = renderer.args(Path::new("/tmp/profile"), &url);

        assert!(args.contains(&"--dump-dom".to_string()));
        assert!(args.contains(&"--user-data-dir=/tmp/profile".to_string()));
        assert!(args.contains(&"--virtual-time-budget=8000".to_string()));
        assert_eq!(args.last().unwrap(), "https://alison.com/check/1");
    }

    #[tokio::test]
    async fn test_missing_browser_is_reported() {
        let renderer = ChromiumRenderer {
            executable: None,
            user_agent: "cert-verify".to_string(),
            virtual_time_budget_ms: 1000,
        };
        let url = Url::parse("https://alison.com/check/1").unwrap();
        let err = renderer.render(&url, Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, VerifyError::ToolNotFound(_)));
    }
}
