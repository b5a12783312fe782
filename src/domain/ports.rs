use crate::domain::model::{
    ClaimRecord, ExtractedContent, PlatformTag, RasterImage, VerificationLocator,
};
use crate::utils::error::{Result, VerifyError};
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn render_timeout(&self) -> Duration;
    fn poll_interval(&self) -> Duration;
    fn tool_timeout_secs(&self) -> u64;
    fn max_document_bytes(&self) -> u64;
}

/// PDF text and image access. Both calls fail with `UnreadableDocument` on corrupt input.
pub trait PdfReader: Send + Sync {
    fn extract_text(&self, bytes: &[u8]) -> Result<String>;
    fn extract_images(&self, bytes: &[u8]) -> Result<Vec<RasterImage>>;
}

/// QR/barcode reader. `Ok(None)` when the image carries no code.
#[async_trait]
pub trait CodeDecoder: Send + Sync {
    async fn decode(&self, image: &RasterImage) -> Result<Option<String>>;
}

#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image: &RasterImage) -> Result<String>;
}

/// Loads a page and returns its visible text once client-side rendering is done.
///
/// Implementations must release whatever session they hold before returning,
/// and when the returned future is dropped.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &Url, timeout: Duration) -> Result<String>;
}

/// Claims read from the certificate plus where to look for the reference record.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub claim: ClaimRecord,
    pub locator: Option<VerificationLocator>,
}

pub trait ClaimExtractor: Send + Sync {
    fn extract(&self, content: &ExtractedContent) -> Result<Extraction>;
}

/// Reference record plus the non-fatal misses met while building it.
#[derive(Debug, Default)]
pub struct Resolution {
    pub claim: ClaimRecord,
    pub diagnostics: Vec<VerifyError>,
}

#[async_trait]
pub trait GroundTruthResolver: Send + Sync {
    async fn resolve(
        &self,
        platform: PlatformTag,
        locator: &VerificationLocator,
    ) -> Result<Resolution>;
}
