use crate::core::claims::parse_signed_credential;
use crate::core::patterns::{compile, first_capture, name_after};
use crate::domain::model::{ClaimField, ClaimRecord, PlatformTag, VerificationLocator};
use crate::domain::ports::{GroundTruthResolver, PageRenderer, Resolution};
use crate::utils::error::{Result, VerifyError};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Patterns for reading a platform's verification page, keyed by field.
pub struct VerificationPagePatterns {
    name: &'static [Regex],
    course: &'static [Regex],
}

static CERTIFY_NAME: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        name_after("this is to certify that").as_str(),
        r"Completed by\s+([A-Za-z]+)\s+([A-Za-z]+)",
    ])
});
static ALISON_NAME: Lazy<Vec<Regex>> =
    Lazy::new(|| compile(&[r"verify that (.+?) has completed"]));
static ALISON_COURSE: Lazy<Vec<Regex>> = Lazy::new(|| compile(&[r"course (.+?) on Alison"]));
static SAYLOR_NAME: Lazy<Vec<Regex>> =
    Lazy::new(|| compile(&[r"(?m)^[ \t]*Full name[ \t]*[\t:][ \t]*([^\n]+)$"]));
static SAYLOR_COURSE: Lazy<Vec<Regex>> =
    Lazy::new(|| compile(&[r"(?m)^[ \t]*Certificate[ \t]*[\t:][ \t]*([^\n]+)$"]));

impl VerificationPagePatterns {
    pub fn for_platform(platform: PlatformTag) -> Option<Self> {
        match platform {
            PlatformTag::Coursera | PlatformTag::Udemy => Some(Self {
                name: CERTIFY_NAME.as_slice(),
                course: &[],
            }),
            PlatformTag::Alison => Some(Self {
                name: ALISON_NAME.as_slice(),
                course: ALISON_COURSE.as_slice(),
            }),
            PlatformTag::Saylor => Some(Self {
                name: SAYLOR_NAME.as_slice(),
                course: SAYLOR_COURSE.as_slice(),
            }),
            PlatformTag::Infosys | PlatformTag::Unknown => None,
        }
    }

    fn read(&self, text: &str) -> ClaimRecord {
        ClaimRecord {
            subject_name: first_capture(self.name, text),
            course_name: first_capture(self.course, text),
            ..Default::default()
        }
    }

    /// The page is ready once every required field the page carries is readable.
    fn is_ready(&self, claim: &ClaimRecord, required: &[ClaimField]) -> bool {
        required
            .iter()
            .filter(|field| self.carries(**field))
            .all(|field| claim.field(*field).is_some())
    }

    fn carries(&self, field: ClaimField) -> bool {
        match field {
            ClaimField::SubjectName => !self.name.is_empty(),
            ClaimField::CourseName => !self.course.is_empty(),
            ClaimField::CredentialId | ClaimField::CompletedOn => false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            interval: Duration::from_millis(500),
        }
    }
}

/// Fetches the reference record: renders verification pages, or re-reads an
/// embedded signed credential.
pub struct ReferenceResolver {
    renderer: Arc<dyn PageRenderer>,
    poll: PollPolicy,
}

impl ReferenceResolver {
    pub fn new(renderer: Arc<dyn PageRenderer>, poll: PollPolicy) -> Self {
        Self { renderer, poll }
    }

    /// Re-renders until the page's required fields appear or the deadline passes.
    ///
    /// Returns the last rendered reading; `VerificationPageUnreachable` only when
    /// no render succeeded at all.
    async fn render_until_ready(
        &self,
        url: &Url,
        patterns: &VerificationPagePatterns,
        required: &[ClaimField],
    ) -> Result<ClaimRecord> {
        let deadline = Instant::now() + self.poll.timeout;
        let mut last_reading: Option<ClaimRecord> = None;
        let mut last_error: Option<VerifyError> = None;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }

            match tokio::time::timeout(remaining, self.renderer.render(url, remaining)).await {
                Ok(Ok(text)) => {
                    let reading = patterns.read(&text);
                    if patterns.is_ready(&reading, required) {
                        tracing::debug!("Verification page ready after {} attempt(s)", attempt);
                        return Ok(reading);
                    }
                    tracing::debug!("Attempt {}: verification page not ready yet", attempt);
                    last_reading = Some(reading);
                }
                Ok(Err(e)) => {
                    tracing::debug!("Attempt {}: render failed: {}", attempt, e);
                    last_error = Some(e);
                }
                Err(_) => break,
            }

            let now = Instant::now();
            if now + self.poll.interval >= deadline {
                break;
            }
            tokio::time::sleep(self.poll.interval).await;
        }

        match (last_reading, last_error) {
            (Some(reading), _) => Ok(reading),
            (None, error) => Err(VerifyError::VerificationPageUnreachable {
                url: url.to_string(),
                reason: error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| format!("no response within {:?}", self.poll.timeout)),
            }),
        }
    }
}

#[async_trait]
impl GroundTruthResolver for ReferenceResolver {
    async fn resolve(
        &self,
        platform: PlatformTag,
        locator: &VerificationLocator,
    ) -> Result<Resolution> {
        let required = platform.required_fields();

        let mut claim = match locator {
            VerificationLocator::Payload(raw) => parse_signed_credential(raw)?,
            VerificationLocator::Url(url) => {
                let patterns = VerificationPagePatterns::for_platform(platform).ok_or_else(|| {
                    VerifyError::VerificationPageUnreachable {
                        url: url.to_string(),
                        reason: format!("{} has no verification page reader", platform),
                    }
                })?;
                tracing::info!("Loading verification page {}", url);
                self.render_until_ready(url, &patterns, required).await?
            }
        };
        claim.source_locator = Some(locator.to_string());

        let diagnostics = required
            .iter()
            .filter(|field| claim.field(**field).is_none())
            .map(|field| {
                let miss = VerifyError::VerificationFieldNotFound {
                    platform: platform.to_string(),
                    field: field.to_string(),
                };
                tracing::warn!("{}", miss);
                miss
            })
            .collect();

        Ok(Resolution { claim, diagnostics })
    }
}
