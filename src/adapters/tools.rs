//! External command-line tools used as QR and OCR backends.

use crate::domain::model::RasterImage;
use crate::domain::ports::{CodeDecoder, OcrEngine};
use crate::utils::error::{Result, VerifyError};
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Runs a command with a timeout and returns (stdout, stderr, exit code).
///
/// The child is killed if the timeout fires or the future is dropped.
pub async fn run_command(
    cmd: &Path,
    args: &[&str],
    timeout_secs: u64,
) -> Result<(String, String, i32)> {
    use tokio::process::Command;
    use tokio::time::{timeout, Duration};

    let result = timeout(
        Duration::from_secs(timeout_secs),
        Command::new(cmd).args(args).kill_on_drop(true).output(),
    )
    .await;

    match result {
        Ok(Ok(output)) => {
            let stdout = String::from_utf8_lossy(&output.stdout).to_string();
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            let code = output.status.code().unwrap_or(-1);
            Ok((stdout, stderr, code))
        }
        Ok(Err(e)) => Err(VerifyError::ToolFailed(format!("{}: {}", cmd.display(), e))),
        Err(_) => Err(VerifyError::ToolTimeout(timeout_secs)),
    }
}

/// Configured path first, then `PATH`.
pub fn resolve_executable(configured: Option<&Path>, names: &[&str]) -> Option<PathBuf> {
    configured
        .map(Path::to_path_buf)
        .or_else(|| names.iter().find_map(|name| which::which(name).ok()))
}

/// Writes the image to a temp file that lives as long as the returned guard.
fn spill_to_temp(image: &RasterImage) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("cert-verify-")
        .suffix(&format!(".{}", image.file_extension()))
        .tempfile()?;
    file.write_all(&image.bytes)?;
    file.flush()?;
    Ok(file)
}

fn path_arg(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| VerifyError::ToolFailed(format!("non UTF-8 path: {}", path.display())))
}

/// QR decoding through `zbarimg` (zbar-tools).
pub struct ZbarDecoder {
    executable: Option<PathBuf>,
    timeout_secs: u64,
}

impl ZbarDecoder {
    pub fn new(configured: Option<&Path>, timeout_secs: u64) -> Self {
        Self {
            executable: resolve_executable(configured, &["zbarimg"]),
            timeout_secs,
        }
    }
}

#[async_trait]
impl CodeDecoder for ZbarDecoder {
    async fn decode(&self, image: &RasterImage) -> Result<Option<String>> {
        let exe = self
            .executable
            .as_ref()
            .ok_or_else(|| VerifyError::ToolNotFound("zbarimg".to_string()))?;

        let file = spill_to_temp(image)?;
        let (stdout, stderr, code) = run_command(
            exe,
            &[
                "--quiet",
                "--raw",
                "-Sdisable",
                "-Sqrcode.enable",
                path_arg(file.path())?,
            ],
            self.timeout_secs,
        )
        .await?;

        // zbarimg exits with 4 when the image holds no symbol.
        match code {
            0 => {
                let payload = stdout.trim_end_matches(['\r', '\n']).to_string();
                Ok((!payload.trim().is_empty()).then_some(payload))
            }
            4 => Ok(None),
            _ => Err(VerifyError::ToolFailed(format!(
                "zbarimg exited with {}: {}",
                code,
                stderr.trim()
            ))),
        }
    }
}

/// OCR through the `tesseract` CLI.
pub struct TesseractOcr {
    executable: Option<PathBuf>,
    language: String,
    timeout_secs: u64,
}

impl TesseractOcr {
    pub fn new(configured: Option<&Path>, language: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            executable: resolve_executable(configured, &["tesseract"]),
            language: language.into(),
            timeout_secs,
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn recognize(&self, image: &RasterImage) -> Result<String> {
        let exe = self
            .executable
            .as_ref()
            .ok_or_else(|| VerifyError::ToolNotFound("tesseract".to_string()))?;

        let file = spill_to_temp(image)?;
        let (stdout, stderr, code) = run_command(
            exe,
            &[path_arg(file.path())?, "stdout", "-l", self.language.as_str()],
            self.timeout_secs,
        )
        .await?;

        if code != 0 {
            return Err(VerifyError::ToolFailed(format!(
                "tesseract exited with {}: {}",
                code,
                stderr.trim()
            )));
        }
        Ok(stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_executable_prefers_configured_path() {
        let configured = PathBuf::from("/opt/zbar/bin/zbarimg");
        assert_eq!(
            resolve_executable(Some(&configured), &["zbarimg"]),
            Some(configured)
        );
    }

    #[tokio::test]
    async fn test_missing_tool_is_reported() {
        let decoder = ZbarDecoder {
            executable: None,
            timeout_secs: 5,
        };
        let err = decoder
            .decode(&RasterImage::from_bytes(vec![0xFF, 0xD8]))
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::ToolNotFound(_)));
    }

    #[test]
    fn test_spilled_file_keeps_extension() {
        let image = RasterImage::from_bytes(vec![0x89, b'P', b'N', b'G']);
        let file = spill_to_temp(&image).unwrap();
        assert!(file.path().to_string_lossy().ends_with(".png"));
        assert_eq!(std::fs::read(file.path()).unwrap(), image.bytes);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_command_times_out() {
        let err = run_command(Path::new("sleep"), &["5"], 1).await.unwrap_err();
        assert!(matches!(err, VerifyError::ToolTimeout(1)));
    }
}
