//! Per-platform claim extraction from certificate content.
//!
//! Three families exist because certificate layouts are not self-describing:
//! positional (fixed line offsets), pattern (regexes tuned to the wording) and
//! payload (a structured credential embedded in the QR code).

use crate::core::classifier::platform_for_url;
use crate::core::patterns::{compile, find_phrase, first_capture, first_link, name_after};
use crate::domain::model::{ClaimRecord, ExtractedContent, PlatformTag, VerificationLocator};
use crate::domain::ports::{ClaimExtractor, Extraction};
use crate::utils::error::{Result, VerifyError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use url::Url;

pub fn extractor_for(platform: PlatformTag) -> Option<Box<dyn ClaimExtractor>> {
    match platform {
        PlatformTag::Coursera | PlatformTag::Udemy => Some(Box::new(PositionalExtractor {
            platform,
            name_line: 1,
            course_line: None,
            locator: LocatorSource::TrustedLink,
        })),
        PlatformTag::Alison => Some(Box::new(PositionalExtractor {
            platform,
            name_line: 0,
            course_line: Some(1),
            locator: LocatorSource::PayloadUrl,
        })),
        PlatformTag::Saylor => Some(Box::new(SaylorExtractor)),
        PlatformTag::Infosys => Some(Box::new(SignedPayloadExtractor)),
        PlatformTag::Unknown => None,
    }
}

#[derive(Debug, Clone, Copy)]
enum LocatorSource {
    /// A link printed on the certificate (or carried by the QR code) on one of
    /// the platform's trusted domains.
    TrustedLink,
    /// The QR code's URL as-is.
    PayloadUrl,
}

/// Reads fields from fixed positions among the non-empty lines.
///
/// A layout change shows up as absent fields, never as guessed offsets.
pub struct PositionalExtractor {
    platform: PlatformTag,
    name_line: usize,
    course_line: Option<usize>,
    locator: LocatorSource,
}

impl PositionalExtractor {
    fn locator(&self, content: &ExtractedContent) -> Option<VerificationLocator> {
        let payload_url = content
            .decoded_payload
            .as_deref()
            .map(str::trim)
            .filter(|payload| payload.starts_with("http"))
            .and_then(|payload| Url::parse(payload).ok());

        match self.locator {
            LocatorSource::PayloadUrl => payload_url.map(VerificationLocator::Url),
            LocatorSource::TrustedLink => {
                let candidate = first_link(content.claim_text())
                    .and_then(|link| Url::parse(&link).ok())
                    .or(payload_url)?;

                if platform_for_url(&candidate) == self.platform {
                    Some(VerificationLocator::Url(candidate))
                } else {
                    tracing::warn!(
                        "Verification link {} is not on a trusted {} domain",
                        candidate,
                        self.platform
                    );
                    None
                }
            }
        }
    }
}

impl ClaimExtractor for PositionalExtractor {
    fn extract(&self, content: &ExtractedContent) -> Result<Extraction> {
        let lines: Vec<&str> = content
            .claim_text()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let line_at = |index: usize| lines.get(index).map(|line| line.to_string());

        let locator = self.locator(content);
        let claim = ClaimRecord {
            subject_name: line_at(self.name_line),
            course_name: self.course_line.and_then(line_at),
            source_locator: locator.as_ref().map(|l| l.to_string()),
            ..Default::default()
        };

        if claim.subject_name.is_none() {
            tracing::warn!(
                "{} certificate has only {} text line(s); name not found",
                self.platform,
                lines.len()
            );
        }

        Ok(Extraction { claim, locator })
    }
}

const SAYLOR_VERIFY_URL: &str = "https://learn.saylor.org/admin/tool/certificate/index.php";

static SAYLOR_NAME: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        name_after("this is to certify that").as_str(),
        r"(?m)^([^\n]*)\n\s*[A-Z]+\d{3}:",
    ])
});
static SAYLOR_COURSE: Lazy<Vec<Regex>> = Lazy::new(|| compile(&[r"([A-Z]+\d{3}: [^\n]+)"]));
static SAYLOR_ID: Lazy<Vec<Regex>> = Lazy::new(|| compile(&[r"\b(\d{8,12}[A-Z]{0,3})\b"]));

/// Regex extraction tuned to Saylor Academy certificate wording.
pub struct SaylorExtractor;

impl ClaimExtractor for SaylorExtractor {
    fn extract(&self, content: &ExtractedContent) -> Result<Extraction> {
        let text = content.claim_text();

        let subject_name = first_capture(&SAYLOR_NAME, text)
            .map(|name| name.trim_end_matches('.').trim().to_string())
            .filter(|name| !name.is_empty());
        let course_name = first_capture(&SAYLOR_COURSE, text);
        let credential_id = first_capture(&SAYLOR_ID, text);

        let locator = credential_id
            .as_ref()
            .and_then(|code| Url::parse_with_params(SAYLOR_VERIFY_URL, [("code", code)]).ok())
            .map(VerificationLocator::Url);

        Ok(Extraction {
            claim: ClaimRecord {
                subject_name,
                course_name,
                credential_id,
                completed_on: None,
                source_locator: locator.as_ref().map(|l| l.to_string()),
            },
            locator,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignedCredential {
    id: Option<String>,
    credential_subject: CredentialSubject,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialSubject {
    issued_to: String,
    course: String,
    completed_on: String,
}

/// Parses an issuer-signed credential into a claim. The completion timestamp
/// is cut to its date part.
pub fn parse_signed_credential(raw: &str) -> Result<ClaimRecord> {
    let credential: SignedCredential = serde_json::from_str(raw.trim())
        .map_err(|e| VerifyError::malformed_payload(e.to_string()))?;
    let subject = credential.credential_subject;

    let completed_on: String = subject.completed_on.trim().chars().take(10).collect();
    if completed_on.is_empty() {
        return Err(VerifyError::malformed_payload("completedOn is empty"));
    }

    Ok(ClaimRecord {
        subject_name: Some(subject.issued_to.trim().to_string()),
        course_name: Some(subject.course.trim().to_string()),
        credential_id: credential.id,
        completed_on: Some(completed_on),
        source_locator: None,
    })
}

static HOLDER_NAME: Lazy<Vec<Regex>> = Lazy::new(|| {
    let lead = "this is to certify that|awarded to|presented to|issued to";
    compile(&[name_after(lead).as_str()])
});
static COMPLETED_COURSE: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?im)\b(?:has\s+(?:successfully\s+)?completed|for\s+(?:successfully\s+)?completing|completion\s+of)\s+(?:the\s+course\s+)?([^\n]+?)[ \t]*(?:\bon\s+[A-Za-z]+\s+\d{1,2},\s*\d{4}[^\n]*)?$",
    ])
});
static COMPLETION_DATE: Lazy<Vec<Regex>> =
    Lazy::new(|| compile(&[r"(?i)\bon\s+([A-Za-z]+\s+\d{1,2},\s*\d{4})"]));

/// Certificates carrying a signed credential in their QR code.
///
/// The credential says what to look for. A value the page text does not carry
/// is read from the certificate wording instead, or failing that from the
/// first line of text, so an edited certificate surfaces as a mismatch. Only
/// a certificate without readable text leaves the fields absent.
pub struct SignedPayloadExtractor;

impl SignedPayloadExtractor {
    fn printed_value(
        text: &str,
        expected: Option<&str>,
        wording: &[Regex],
        field: &str,
    ) -> Option<String> {
        if text.trim().is_empty() {
            return None;
        }
        if let Some(found) = expected.and_then(|value| find_phrase(text, value)) {
            return Some(found);
        }

        let printed = first_capture(wording, text).or_else(|| {
            text.lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .map(|line| line.chars().take(80).collect())
        });
        tracing::warn!(
            "Credential {} {:?} is not on the certificate; found {:?}",
            field,
            expected,
            printed
        );
        printed
    }
}

impl ClaimExtractor for SignedPayloadExtractor {
    fn extract(&self, content: &ExtractedContent) -> Result<Extraction> {
        let raw = content
            .decoded_payload
            .as_deref()
            .ok_or_else(|| VerifyError::malformed_payload("certificate has no QR payload"))?;
        let credential = parse_signed_credential(raw)?;
        let text = content.claim_text();

        let subject_name = Self::printed_value(
            text,
            credential.subject_name.as_deref(),
            &HOLDER_NAME,
            "name",
        );
        let course_name = Self::printed_value(
            text,
            credential.course_name.as_deref(),
            &COMPLETED_COURSE,
            "course",
        );
        let completed_on = first_capture(&COMPLETION_DATE, text);

        Ok(Extraction {
            claim: ClaimRecord {
                subject_name,
                course_name,
                credential_id: None,
                completed_on,
                source_locator: None,
            },
            locator: Some(VerificationLocator::Payload(raw.to_string())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(text: &str, payload: Option<&str>) -> ExtractedContent {
        ExtractedContent {
            page_text: text.to_string(),
            images: vec![],
            decoded_payload: payload.map(str::to_string),
            ocr_text: None,
        }
    }

    fn extract(platform: PlatformTag, c: &ExtractedContent) -> Extraction {
        extractor_for(platform).unwrap().extract(c).unwrap()
    }

    #[test]
    fn test_unknown_platform_has_no_extractor() {
        assert!(extractor_for(PlatformTag::Unknown).is_none());
    }

    #[test]
    fn test_coursera_positional_name_and_trusted_link() {
        let c = content(
            "May 3, 2024\n\nJane Doe\nhas successfully completed\nVerify at: https://coursera.org/verify/ABC123",
            None,
        );
        let extraction = extract(PlatformTag::Coursera, &c);
        assert_eq!(extraction.claim.subject_name.as_deref(), Some("Jane Doe"));
        assert_eq!(
            extraction.locator,
            Some(VerificationLocator::Url(
                Url::parse("https://coursera.org/verify/ABC123").unwrap()
            ))
        );
    }

    #[test]
    fn test_untrusted_link_is_dropped() {
        let c = content("Udemy\nJane Doe\nhttps://udemy.example.net/cert/1", None);
        let extraction = extract(PlatformTag::Udemy, &c);
        assert_eq!(extraction.claim.subject_name.as_deref(), Some("Jane Doe"));
        assert!(extraction.locator.is_none());
    }

    #[test]
    fn test_alison_reads_first_two_lines_and_payload_url() {
        let c = content(
            "Jane Doe\nDiploma in Data Science - Revised\nAlison",
            Some("https://alison.com/certification/check/abc"),
        );
        let extraction = extract(PlatformTag::Alison, &c);
        assert_eq!(extraction.claim.subject_name.as_deref(), Some("Jane Doe"));
        assert_eq!(
            extraction.claim.course_name.as_deref(),
            Some("Diploma in Data Science - Revised")
        );
        assert!(matches!(extraction.locator, Some(VerificationLocator::Url(_))));
    }

    #[test]
    fn test_positional_layout_too_short_gives_absent_fields() {
        let extraction = extract(PlatformTag::Alison, &content("Jane Doe", None));
        assert_eq!(extraction.claim.subject_name.as_deref(), Some("Jane Doe"));
        assert!(extraction.claim.course_name.is_none());
        assert!(extraction.locator.is_none());

        let extraction = extract(PlatformTag::Coursera, &content("", None));
        assert!(extraction.claim.subject_name.is_none());
    }

    #[test]
    fn test_saylor_patterns_and_locator() {
        let c = content(
            "Saylor Academy\nJane Doe.\nCS101: Introduction to Computer Science I\nCertificate 1234567890",
            None,
        );
        let extraction = extract(PlatformTag::Saylor, &c);
        assert_eq!(extraction.claim.subject_name.as_deref(), Some("Jane Doe"));
        assert_eq!(
            extraction.claim.course_name.as_deref(),
            Some("CS101: Introduction to Computer Science I")
        );
        assert_eq!(extraction.claim.credential_id.as_deref(), Some("1234567890"));
        assert_eq!(
            extraction.claim.source_locator.as_deref(),
            Some("https://learn.saylor.org/admin/tool/certificate/index.php?code=1234567890")
        );
    }

    #[test]
    fn test_saylor_certify_pattern_takes_precedence() {
        let c = content(
            "This is to certify that John Smith\nhas completed\nBUS210: Corporate Communication",
            None,
        );
        let extraction = extract(PlatformTag::Saylor, &c);
        assert_eq!(extraction.claim.subject_name.as_deref(), Some("John Smith"));
        assert!(extraction.claim.credential_id.is_none());
        assert!(extraction.locator.is_none());
    }

    #[test]
    fn test_parse_signed_credential_truncates_timestamp() {
        let raw = r#"{"credentialSubject":{"issuedTo":" Jane Doe ","course":"Cloud 101","completedOn":"2024-05-03T00:00:00Z"}}"#;
        let claim = parse_signed_credential(raw).unwrap();
        assert_eq!(claim.subject_name.as_deref(), Some("Jane Doe"));
        assert_eq!(claim.completed_on.as_deref(), Some("2024-05-03"));
    }

    #[test]
    fn test_parse_signed_credential_rejects_missing_keys() {
        let raw = r#"{"credentialSubject":{"issuedTo":"Jane Doe"}}"#;
        assert!(matches!(
            parse_signed_credential(raw),
            Err(VerifyError::MalformedPayload { .. })
        ));
        assert!(matches!(
            parse_signed_credential("https://alison.com"),
            Err(VerifyError::MalformedPayload { .. })
        ));
    }

    #[test]
    fn test_signed_payload_document_side() {
        let raw = r#"{"credentialSubject":{"issuedTo":"Jane Doe","course":"Cloud 101","completedOn":"2024-05-03T00:00:00Z"}}"#;
        let c = content(
            "certificate of completion\njane doe\nfor completing cloud 101\non May 3, 2024",
            Some(raw),
        );
        let extraction = extract(PlatformTag::Infosys, &c);
        assert_eq!(extraction.claim.subject_name.as_deref(), Some("jane doe"));
        assert_eq!(extraction.claim.course_name.as_deref(), Some("cloud 101"));
        assert_eq!(extraction.claim.completed_on.as_deref(), Some("May 3, 2024"));
        assert_eq!(
            extraction.locator,
            Some(VerificationLocator::Payload(raw.to_string()))
        );
    }

    #[test]
    fn test_signed_payload_reads_printed_values_that_differ() {
        let raw = r#"{"credentialSubject":{"issuedTo":"Jane Doe","course":"Cloud 101","completedOn":"2024-05-03T00:00:00Z"}}"#;

        let c = content(
            "This is to certify that Jane Doe\nhas completed Advanced Quantum Computing\non May 3, 2024",
            Some(raw),
        );
        let extraction = extract(PlatformTag::Infosys, &c);
        assert_eq!(extraction.claim.subject_name.as_deref(), Some("Jane Doe"));
        assert_eq!(
            extraction.claim.course_name.as_deref(),
            Some("Advanced Quantum Computing")
        );

        let c = content(
            "Certificate awarded to\nJohn Roe\nfor completing Cloud 101\non May 3, 2024",
            Some(raw),
        );
        let extraction = extract(PlatformTag::Infosys, &c);
        assert_eq!(extraction.claim.subject_name.as_deref(), Some("John Roe"));
        assert_eq!(extraction.claim.course_name.as_deref(), Some("Cloud 101"));
    }

    #[test]
    fn test_signed_payload_without_text_leaves_fields_absent() {
        let raw = r#"{"credentialSubject":{"issuedTo":"Jane Doe","course":"Cloud 101","completedOn":"2024-05-03"}}"#;
        let extraction = extract(PlatformTag::Infosys, &content("  ", Some(raw)));
        assert!(extraction.claim.subject_name.is_none());
        assert!(extraction.claim.course_name.is_none());
    }

    #[test]
    fn test_positional_reads_ocr_text_of_scanned_pdf() {
        let c = ExtractedContent {
            page_text: String::new(),
            images: vec![],
            decoded_payload: None,
            ocr_text: Some("Udemy\nJane Doe\nhttps://ude.my/UC-1".to_string()),
        };
        let extraction = extract(PlatformTag::Udemy, &c);
        assert_eq!(extraction.claim.subject_name.as_deref(), Some("Jane Doe"));
        assert!(extraction.locator.is_some());
    }

    #[test]
    fn test_signed_payload_missing_is_malformed() {
        let result = SignedPayloadExtractor.extract(&content("jane doe", None));
        assert!(matches!(result, Err(VerifyError::MalformedPayload { .. })));
    }
}
