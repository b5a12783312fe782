//! Field-by-field comparison of document claims against the reference record.
//!
//! Absent or unparsable evidence makes a field `Inconclusive`, which in turn
//! makes the overall verdict `Inconclusive`. Only fields present on both sides
//! can produce `Fake`.

use crate::domain::model::{
    ClaimField, ClaimRecord, FieldOutcome, FieldResult, OverallVerdict, PlatformTag, Verdict,
};
use chrono::{DateTime, NaiveDate};
use std::collections::BTreeMap;

/// Trailing markers that do not change which course a certificate is for.
const COURSE_SUFFIX_NOISE: [&str; 2] = ["- revised", "(revised)"];

const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d %Y",
];

pub struct Reconciler {
    platform: PlatformTag,
    required: &'static [ClaimField],
}

impl Reconciler {
    pub fn for_platform(platform: PlatformTag) -> Self {
        Self {
            platform,
            required: platform.required_fields(),
        }
    }

    pub fn reconcile(&self, document: &ClaimRecord, reference: &ClaimRecord) -> Verdict {
        let field_results: BTreeMap<ClaimField, FieldResult> = self
            .required
            .iter()
            .map(|field| (*field, compare_field(*field, document, reference)))
            .collect();

        let overall = if self.required.is_empty()
            || field_results
                .values()
                .any(|r| r.outcome == FieldOutcome::Inconclusive)
        {
            OverallVerdict::Inconclusive
        } else if field_results
            .values()
            .any(|r| r.outcome == FieldOutcome::Mismatched)
        {
            OverallVerdict::Fake
        } else {
            OverallVerdict::Valid
        };

        let message = self.summary(overall, document, &field_results);
        tracing::info!("Verdict: {:?} ({})", overall, message);

        Verdict {
            overall,
            field_results,
            message,
        }
    }

    fn summary(
        &self,
        overall: OverallVerdict,
        document: &ClaimRecord,
        results: &BTreeMap<ClaimField, FieldResult>,
    ) -> String {
        match overall {
            OverallVerdict::Valid => {
                let mut message = format!(
                    "Valid {} certificate for {}",
                    self.platform,
                    document.subject_name.as_deref().unwrap_or("unknown holder")
                );
                if let Some(course) = &document.course_name {
                    message.push_str(&format!(" - {}", course));
                }
                message
            }
            OverallVerdict::Fake => {
                let fields: Vec<String> = results
                    .iter()
                    .filter(|(_, r)| r.outcome == FieldOutcome::Mismatched)
                    .map(|(field, _)| field.to_string())
                    .collect();
                format!(
                    "Fake {} certificate: {} do not match the issuer record",
                    self.platform,
                    fields.join(", ")
                )
            }
            OverallVerdict::Inconclusive => {
                let fields: Vec<String> = results
                    .iter()
                    .filter(|(_, r)| r.outcome == FieldOutcome::Inconclusive)
                    .map(|(field, _)| field.to_string())
                    .collect();
                if fields.is_empty() {
                    format!("No comparable fields for {} certificates", self.platform)
                } else {
                    format!(
                        "Could not confirm {} against the issuer record",
                        fields.join(", ")
                    )
                }
            }
        }
    }
}

pub fn compare_field(field: ClaimField, document: &ClaimRecord, reference: &ClaimRecord) -> FieldResult {
    let found = document.field(field).map(str::to_string);
    let expected = reference.field(field).map(str::to_string);

    let outcome = match (found.as_deref(), expected.as_deref()) {
        (Some(found), Some(expected)) => match field {
            ClaimField::SubjectName => equal_outcome(normalize_name(found) == normalize_name(expected)),
            ClaimField::CourseName => {
                equal_outcome(normalize_course(found) == normalize_course(expected))
            }
            ClaimField::CredentialId => {
                equal_outcome(found.trim().to_lowercase() == expected.trim().to_lowercase())
            }
            ClaimField::CompletedOn => match (parse_date(found), parse_date(expected)) {
                (Some(a), Some(b)) => equal_outcome(a == b),
                _ => FieldOutcome::Inconclusive,
            },
        },
        _ => FieldOutcome::Inconclusive,
    };

    FieldResult {
        outcome,
        expected,
        found,
    }
}

fn equal_outcome(equal: bool) -> FieldOutcome {
    if equal {
        FieldOutcome::Matched
    } else {
        FieldOutcome::Mismatched
    }
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn normalize_name(value: &str) -> String {
    collapse_whitespace(&value.to_lowercase())
        .trim_matches('.')
        .trim()
        .to_string()
}

pub fn normalize_course(value: &str) -> String {
    let mut course = collapse_whitespace(&value.to_lowercase());
    for suffix in COURSE_SUFFIX_NOISE {
        if let Some(stripped) = course.strip_suffix(suffix) {
            course = stripped.trim_end().to_string();
        }
    }
    course
}

/// Parses certificate and payload date spellings into a calendar date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = collapse_whitespace(value);
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(&value) {
        return Some(timestamp.date_naive());
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&value, format).ok())
}
