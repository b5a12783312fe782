use once_cell::sync::Lazy;
use regex::Regex;

pub static VERIFICATION_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://[a-zA-Z0-9./\-]+").expect("valid link pattern"));

/// Runs each pattern in order and returns the first non-empty capture.
///
/// Multiple capture groups are joined with a single space, so
/// `Completed by (\w+) (\w+)` yields `"First Last"`.
pub fn first_capture(patterns: &[Regex], text: &str) -> Option<String> {
    patterns.iter().find_map(|pattern| {
        let captures = pattern.captures(text)?;
        let joined = captures
            .iter()
            .skip(1)
            .flatten()
            .map(|m| m.as_str().trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        (!joined.is_empty()).then_some(joined)
    })
}

/// First `http(s)://` link in the text, with line breaks flattened.
pub fn first_link(text: &str) -> Option<String> {
    let flattened = text.replace(['\r', '\n'], " ");
    VERIFICATION_LINK
        .find(&flattened)
        .map(|m| m.as_str().trim_end_matches('.').to_string())
}

/// Locates `needle` in `text` ignoring case and whitespace runs, returning the
/// span as it appears in `text`.
pub fn find_phrase(text: &str, needle: &str) -> Option<String> {
    let words: Vec<String> = needle.split_whitespace().map(regex::escape).collect();
    if words.is_empty() {
        return None;
    }
    let pattern = Regex::new(&format!("(?i){}", words.join(r"\s+"))).ok()?;
    pattern.find(text).map(|m| m.as_str().to_string())
}

/// Name words after a lead-in. The name ends at the line end or at the verb
/// that continues the sentence on the same line.
const NAME_AFTER_LEAD: &str = r"\s+([A-Za-z][A-Za-z.'-]*(?:[ \t]+[A-Za-z][A-Za-z.'-]*)*?)[ \t]*(?:\b(?:has|have|for|who|successfully|completed)\b|[,.]?[ \t]*$)";

/// Builds a case-insensitive pattern capturing the name that follows any of
/// the `|`-separated lead-ins, e.g. `name_after("this is to certify that")`.
pub fn name_after(lead: &str) -> String {
    format!(r"(?im)(?:{}){}", lead, NAME_AFTER_LEAD)
}

pub fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("static pattern must compile"))
        .collect()
}
