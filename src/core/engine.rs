use crate::core::classifier::classify;
use crate::core::claims::extractor_for;
use crate::core::extractor::DocumentExtractor;
use crate::core::reconciler::Reconciler;
use crate::domain::model::{ClaimRecord, Document, OverallVerdict, PlatformTag, Verdict};
use crate::domain::ports::GroundTruthResolver;
use crate::utils::error::{Result, VerifyError};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct VerificationOutcome {
    pub platform: PlatformTag,
    pub document_claim: ClaimRecord,
    pub reference_claim: ClaimRecord,
    pub verdict: Verdict,
    /// Non-fatal problems met while gathering reference evidence.
    pub diagnostics: Vec<String>,
}

/// Result handed back to the caller. Never an error: failures become a message.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationReport {
    Completed(VerificationOutcome),
    Failed {
        message: String,
        suggestion: String,
    },
}

impl VerificationReport {
    pub fn overall(&self) -> Option<OverallVerdict> {
        match self {
            VerificationReport::Completed(outcome) => Some(outcome.verdict.overall),
            VerificationReport::Failed { .. } => None,
        }
    }
}

pub struct VerificationEngine {
    extractor: DocumentExtractor,
    resolver: Arc<dyn GroundTruthResolver>,
}

impl VerificationEngine {
    pub fn new(extractor: DocumentExtractor, resolver: Arc<dyn GroundTruthResolver>) -> Self {
        Self {
            extractor,
            resolver,
        }
    }

    pub async fn verify(&self, document: &Document) -> Result<VerificationOutcome> {
        tracing::info!("Verifying {}", document.filename());

        let content = self.extractor.extract(document).await?;

        let platform = classify(&content);
        tracing::info!("Detected platform: {}", platform);

        let claim_extractor = extractor_for(platform).ok_or(VerifyError::UnknownPlatform)?;
        let extraction = claim_extractor.extract(&content)?;
        tracing::debug!("Document claim: {:?}", extraction.claim);

        let mut diagnostics = Vec::new();
        let reference_claim = match &extraction.locator {
            None => {
                tracing::warn!("No verification locator found on the certificate");
                diagnostics.push("No verification link or payload found on the certificate".to_string());
                ClaimRecord::default()
            }
            Some(locator) => match self.resolver.resolve(platform, locator).await {
                Ok(resolution) => {
                    diagnostics.extend(resolution.diagnostics.iter().map(|d| d.to_string()));
                    resolution.claim
                }
                Err(e @ VerifyError::VerificationPageUnreachable { .. }) => {
                    tracing::warn!("{}", e);
                    diagnostics.push(e.to_string());
                    ClaimRecord::default()
                }
                Err(e) => return Err(e),
            },
        };
        tracing::debug!("Reference claim: {:?}", reference_claim);

        let verdict = Reconciler::for_platform(platform).reconcile(&extraction.claim, &reference_claim);

        Ok(VerificationOutcome {
            platform,
            document_claim: extraction.claim,
            reference_claim,
            verdict,
            diagnostics,
        })
    }

    /// Pipeline boundary: every error is turned into a user-facing report.
    pub async fn run(&self, document: &Document) -> VerificationReport {
        match self.verify(document).await {
            Ok(outcome) => VerificationReport::Completed(outcome),
            Err(e) => {
                tracing::error!(
                    "Verification failed: {} (Category: {:?}, Severity: {:?})",
                    e,
                    e.category(),
                    e.severity()
                );
                VerificationReport::Failed {
                    message: e.user_friendly_message(),
                    suggestion: e.recovery_suggestion().to_string(),
                }
            }
        }
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationReport::Failed {
                message,
                suggestion,
            } => {
                writeln!(f, "❌ {}", message)?;
                write!(f, "💡 {}", suggestion)
            }
            VerificationReport::Completed(outcome) => {
                let verdict = &outcome.verdict;
                let marker = match verdict.overall {
                    OverallVerdict::Valid => "✅",
                    OverallVerdict::Fake => "❌",
                    OverallVerdict::Inconclusive => "⚠️",
                };
                writeln!(f, "{} {}", marker, verdict.message)?;
                writeln!(f, "Platform: {}", outcome.platform)?;

                for (field, result) in &verdict.field_results {
                    writeln!(f, "  {}: {:?}", field, result.outcome)?;
                }

                for (field, result) in verdict.mismatched_fields() {
                    writeln!(
                        f,
                        "Expected {}: {} | Found: {}",
                        field,
                        result.expected.as_deref().unwrap_or("-"),
                        result.found.as_deref().unwrap_or("-")
                    )?;
                }

                for note in &outcome.diagnostics {
                    writeln!(f, "Note: {}", note)?;
                }
                Ok(())
            }
        }
    }
}
