//! Issuing-platform detection.
//!
//! Signals are checked strongest first and the first hit wins:
//! brand keyword in the text, signed-credential payload shape, payload URL
//! domain, image-only layout, then the default platform.

use crate::domain::model::{ExtractedContent, PlatformTag};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use url::Url;

static TEXT_KEYWORDS: &[(&str, PlatformTag)] = &[
    ("coursera", PlatformTag::Coursera),
    ("udemy", PlatformTag::Udemy),
    ("saylor academy", PlatformTag::Saylor),
    ("infosys springboard", PlatformTag::Infosys),
];

static TRUSTED_DOMAINS: Lazy<HashMap<&'static str, PlatformTag>> = Lazy::new(|| {
    HashMap::from([
        ("coursera.org", PlatformTag::Coursera),
        ("www.coursera.org", PlatformTag::Coursera),
        ("udemy.com", PlatformTag::Udemy),
        ("www.udemy.com", PlatformTag::Udemy),
        ("ude.my", PlatformTag::Udemy),
        ("alison.com", PlatformTag::Alison),
        ("www.alison.com", PlatformTag::Alison),
        ("saylor.org", PlatformTag::Saylor),
        ("www.saylor.org", PlatformTag::Saylor),
        ("learn.saylor.org", PlatformTag::Saylor),
        ("infyspringboard.onwingspan.com", PlatformTag::Infosys),
    ])
});

/// Keys that only appear together in an issuer-signed credential.
const SIGNED_CREDENTIAL_KEYS: [&str; 2] = ["issuanceDate", "credentialSubject"];

const IMAGE_ONLY_PLATFORM: PlatformTag = PlatformTag::Udemy;
const FALLBACK_PLATFORM: PlatformTag = PlatformTag::Saylor;

/// Maps a URL's host to a platform through the trusted-domain table.
pub fn platform_for_url(url: &Url) -> PlatformTag {
    url.host_str()
        .map(|host| host.to_ascii_lowercase())
        .and_then(|host| TRUSTED_DOMAINS.get(host.as_str()).copied())
        .unwrap_or(PlatformTag::Unknown)
}

pub fn classify(content: &ExtractedContent) -> PlatformTag {
    if let Some(platform) = keyword_platform(&content.page_text) {
        tracing::debug!("Classified by text keyword as {}", platform);
        return platform;
    }

    if let Some(payload) = content.decoded_payload.as_deref().map(str::trim) {
        if is_signed_credential(payload) {
            tracing::debug!("Classified by signed credential payload");
            return PlatformTag::Infosys;
        }

        if payload.starts_with("http") {
            let platform = Url::parse(payload)
                .map(|url| platform_for_url(&url))
                .unwrap_or(PlatformTag::Unknown);
            tracing::debug!("Classified by payload URL domain as {}", platform);
            return platform;
        }
    }

    if content.page_text.trim().is_empty() && !content.images.is_empty() {
        tracing::debug!("No text layer, treating as image-only certificate");
        return IMAGE_ONLY_PLATFORM;
    }

    FALLBACK_PLATFORM
}

fn keyword_platform(text: &str) -> Option<PlatformTag> {
    let lowered = text.to_lowercase();
    TEXT_KEYWORDS
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, platform)| *platform)
}

fn is_signed_credential(payload: &str) -> bool {
    if !payload.starts_with('{') {
        return false;
    }
    match serde_json::from_str::<serde_json::Value>(payload) {
        Ok(serde_json::Value::Object(map)) => {
            SIGNED_CREDENTIAL_KEYS.iter().all(|key| map.contains_key(*key))
        }
        _ => false,
    }
}
