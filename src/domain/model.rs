use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

pub const IMAGE_EXTENSIONS: [&str; 8] = ["png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff", "webp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    Pdf,
    Image,
}

impl MediaType {
    pub fn from_filename(filename: &str) -> Option<Self> {
        let extension = std::path::Path::new(filename)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();

        if extension == "pdf" {
            Some(MediaType::Pdf)
        } else if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            Some(MediaType::Image)
        } else {
            None
        }
    }
}

/// An uploaded certificate. Read-only for the lifetime of one request.
#[derive(Debug, Clone)]
pub struct Document {
    filename: String,
    media_type: MediaType,
    bytes: Vec<u8>,
}

impl Document {
    pub fn new(filename: impl Into<String>, media_type: MediaType, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            media_type,
            bytes,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub bytes: Vec<u8>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// PDF stream filter (`DCTDecode`, `JPXDecode`, ...) when the image came out of a PDF.
    pub encoding: Option<String>,
}

impl RasterImage {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            width: None,
            height: None,
            encoding: None,
        }
    }

    /// File extension matching the byte layout, for tools that sniff by name.
    pub fn file_extension(&self) -> &'static str {
        match self.encoding.as_deref() {
            Some("DCTDecode") => "jpg",
            Some("JPXDecode") => "jp2",
            _ if self.bytes.starts_with(&[0x89, b'P', b'N', b'G']) => "png",
            _ if self.bytes.starts_with(&[0xFF, 0xD8]) => "jpg",
            _ if self.bytes.starts_with(b"GIF8") => "gif",
            _ if self.bytes.starts_with(b"BM") => "bmp",
            _ if self.bytes.starts_with(b"P5") || self.bytes.starts_with(b"P6") => "pnm",
            _ => "img",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExtractedContent {
    /// Text layer of a PDF, or the OCR result for an image upload.
    pub page_text: String,
    pub images: Vec<RasterImage>,
    pub decoded_payload: Option<String>,
    /// OCR of the embedded images when a PDF has no text layer.
    pub ocr_text: Option<String>,
}

impl ExtractedContent {
    /// Text the claim extractors read: the OCR text when the PDF had none of its own.
    pub fn claim_text(&self) -> &str {
        match &self.ocr_text {
            Some(text) if self.page_text.is_empty() => text,
            _ => &self.page_text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlatformTag {
    Coursera,
    Udemy,
    Alison,
    Saylor,
    Infosys,
    Unknown,
}

impl PlatformTag {
    pub fn required_fields(&self) -> &'static [ClaimField] {
        match self {
            PlatformTag::Coursera | PlatformTag::Udemy => &[ClaimField::SubjectName],
            PlatformTag::Alison | PlatformTag::Saylor => {
                &[ClaimField::SubjectName, ClaimField::CourseName]
            }
            PlatformTag::Infosys => &[
                ClaimField::SubjectName,
                ClaimField::CourseName,
                ClaimField::CompletedOn,
            ],
            PlatformTag::Unknown => &[],
        }
    }
}

impl fmt::Display for PlatformTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlatformTag::Coursera => "Coursera",
            PlatformTag::Udemy => "Udemy",
            PlatformTag::Alison => "Alison",
            PlatformTag::Saylor => "Saylor",
            PlatformTag::Infosys => "Infosys",
            PlatformTag::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimField {
    SubjectName,
    CourseName,
    CredentialId,
    CompletedOn,
}

impl fmt::Display for ClaimField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ClaimField::SubjectName => "name",
            ClaimField::CourseName => "course",
            ClaimField::CredentialId => "credential id",
            ClaimField::CompletedOn => "completion date",
        };
        f.write_str(label)
    }
}

/// Identity/course facts taken from one source. Every field is best-effort.
///
/// `completed_on` keeps the date text as found; it is only parsed when
/// compared, so an unparsable date stays distinct from a missing one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub subject_name: Option<String>,
    pub course_name: Option<String>,
    pub credential_id: Option<String>,
    pub completed_on: Option<String>,
    pub source_locator: Option<String>,
}

impl ClaimRecord {
    pub fn field(&self, field: ClaimField) -> Option<&str> {
        match field {
            ClaimField::SubjectName => self.subject_name.as_deref(),
            ClaimField::CourseName => self.course_name.as_deref(),
            ClaimField::CredentialId => self.credential_id.as_deref(),
            ClaimField::CompletedOn => self.completed_on.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationLocator {
    Url(Url),
    Payload(String),
}

impl fmt::Display for VerificationLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationLocator::Url(url) => write!(f, "{}", url),
            VerificationLocator::Payload(_) => f.write_str("embedded payload"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverallVerdict {
    Valid,
    Fake,
    Inconclusive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldOutcome {
    Matched,
    Mismatched,
    Inconclusive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldResult {
    pub outcome: FieldOutcome,
    /// Reference-side value.
    pub expected: Option<String>,
    /// Document-side value.
    pub found: Option<String>,
}

impl FieldResult {
    pub fn matched(&self) -> bool {
        self.outcome == FieldOutcome::Matched
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub overall: OverallVerdict,
    pub field_results: BTreeMap<ClaimField, FieldResult>,
    pub message: String,
}

impl Verdict {
    pub fn mismatched_fields(&self) -> impl Iterator<Item = (&ClaimField, &FieldResult)> {
        self.field_results
            .iter()
            .filter(|(_, result)| result.outcome == FieldOutcome::Mismatched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_from_filename() {
        assert_eq!(MediaType::from_filename("cert.pdf"), Some(MediaType::Pdf));
        assert_eq!(MediaType::from_filename("Cert.PDF"), Some(MediaType::Pdf));
        assert_eq!(MediaType::from_filename("scan.jpeg"), Some(MediaType::Image));
        assert_eq!(MediaType::from_filename("notes.txt"), None);
        assert_eq!(MediaType::from_filename("no_extension"), None);
    }

    #[test]
    fn test_raster_image_extension_sniffing() {
        let png = RasterImage::from_bytes(vec![0x89, b'P', b'N', b'G', 0x0D]);
        assert_eq!(png.file_extension(), "png");

        let mut jpeg = RasterImage::from_bytes(vec![0x00]);
        jpeg.encoding = Some("DCTDecode".to_string());
        assert_eq!(jpeg.file_extension(), "jpg");
    }

    #[test]
    fn test_required_fields_per_platform() {
        assert_eq!(
            PlatformTag::Coursera.required_fields(),
            &[ClaimField::SubjectName]
        );
        assert_eq!(PlatformTag::Infosys.required_fields().len(), 3);
        assert!(PlatformTag::Unknown.required_fields().is_empty());
    }
}
