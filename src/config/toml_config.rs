use crate::core::ConfigProvider;
use crate::utils::error::{Result, VerifyError};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) cert-verify/0.1";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifierConfig {
    #[serde(default)]
    pub renderer: RendererConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// Plain HTTP GET; enough for server-rendered verification pages.
    #[default]
    Http,
    /// Headless Chromium for pages that render client-side.
    Chromium,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RendererConfig {
    pub kind: Option<RendererKind>,
    pub timeout_seconds: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub chromium_path: Option<PathBuf>,
    pub user_agent: Option<String>,
    pub virtual_time_budget_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsConfig {
    pub tesseract_path: Option<PathBuf>,
    pub zbarimg_path: Option<PathBuf>,
    pub timeout_seconds: Option<u64>,
    pub ocr_language: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimitsConfig {
    pub max_document_bytes: Option<u64>,
}

impl VerifierConfig {
    /// Loads the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(VerifyError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Parses the configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| VerifyError::ConfigValidation {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` references (e.g. `${CHROMIUM_PATH}`) with environment values.
    fn substitute_env_vars(content: &str) -> String {
        use once_cell::sync::Lazy;
        use regex::Regex;

        static ENV_VAR: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"));

        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    pub fn renderer_kind(&self) -> RendererKind {
        self.renderer.kind.unwrap_or_default()
    }

    pub fn user_agent(&self) -> &str {
        self.renderer
            .user_agent
            .as_deref()
            .unwrap_or(DEFAULT_USER_AGENT)
    }

    pub fn virtual_time_budget_ms(&self) -> u64 {
        self.renderer.virtual_time_budget_ms.unwrap_or(10_000)
    }

    pub fn ocr_language(&self) -> &str {
        self.tools.ocr_language.as_deref().unwrap_or("eng")
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(timeout) = self.renderer.timeout_seconds {
            validate_range("renderer.timeout_seconds", timeout, 1, 600)?;
        }
        if let Some(interval) = self.renderer.poll_interval_ms {
            validate_range("renderer.poll_interval_ms", interval, 50, 10_000)?;
        }
        if self.poll_interval() >= self.render_timeout() {
            return Err(VerifyError::ConfigValidation {
                field: "renderer.poll_interval_ms".to_string(),
                message: "poll interval must be shorter than the render timeout".to_string(),
            });
        }
        if let Some(budget) = self.renderer.virtual_time_budget_ms {
            validate_positive_number("renderer.virtual_time_budget_ms", budget, 1)?;
        }
        validate_non_empty_string("renderer.user_agent", self.user_agent())?;
        validate_non_empty_string("tools.ocr_language", self.ocr_language())?;
        validate_positive_number("tools.timeout_seconds", self.tool_timeout_secs(), 1)?;
        validate_positive_number("limits.max_document_bytes", self.max_document_bytes(), 1)?;

        for (field, path) in [
            ("renderer.chromium_path", &self.renderer.chromium_path),
            ("tools.tesseract_path", &self.tools.tesseract_path),
            ("tools.zbarimg_path", &self.tools.zbarimg_path),
        ] {
            if let Some(path) = path {
                validate_path(field, &path.to_string_lossy())?;
            }
        }

        Ok(())
    }
}

impl ConfigProvider for VerifierConfig {
    fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.renderer.timeout_seconds.unwrap_or(30))
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.renderer.poll_interval_ms.unwrap_or(500))
    }

    fn tool_timeout_secs(&self) -> u64 {
        self.tools.timeout_seconds.unwrap_or(60)
    }

    fn max_document_bytes(&self) -> u64 {
        self.limits.max_document_bytes.unwrap_or(20 * 1024 * 1024)
    }
}

impl Validate for VerifierConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = VerifierConfig::from_toml_str("").unwrap();

        assert_eq!(config.renderer_kind(), RendererKind::Http);
        assert_eq!(config.render_timeout(), Duration::from_secs(30));
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.ocr_language(), "eng");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[renderer]
kind = "chromium"
timeout_seconds = 45
poll_interval_ms = 250
chromium_path = "/usr/bin/chromium"

[tools]
zbarimg_path = "/usr/bin/zbarimg"
timeout_seconds = 20
ocr_language = "eng+hin"

[limits]
max_document_bytes = 1048576
"#;

        let config = VerifierConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.renderer_kind(), RendererKind::Chromium);
        assert_eq!(config.render_timeout(), Duration::from_secs(45));
        assert_eq!(config.tool_timeout_secs(), 20);
        assert_eq!(config.max_document_bytes(), 1_048_576);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("CERT_VERIFY_TEST_CHROMIUM", "/opt/chromium/chrome");

        let toml_content = r#"
[renderer]
chromium_path = "${CERT_VERIFY_TEST_CHROMIUM}"
"#;

        let config = VerifierConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.renderer.chromium_path,
            Some(PathBuf::from("/opt/chromium/chrome"))
        );

        std::env::remove_var("CERT_VERIFY_TEST_CHROMIUM");
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[renderer]
timeout_seconds = 2
poll_interval_ms = 5000
"#;

        let config = VerifierConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());

        let config = VerifierConfig::from_toml_str("[renderer]\nkind = \"firefox\"");
        assert!(config.is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[tools]\ntesseract_path = \"/usr/local/bin/tesseract\"\n")
            .unwrap();

        let config = VerifierConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(
            config.tools.tesseract_path,
            Some(PathBuf::from("/usr/local/bin/tesseract"))
        );
    }
}
