pub mod claims;
pub mod classifier;
pub mod engine;
pub mod extractor;
pub mod patterns;
pub mod reconciler;
pub mod resolver;

pub use crate::domain::model::{ClaimRecord, Document, ExtractedContent, PlatformTag, Verdict};
pub use crate::domain::ports::{
    ClaimExtractor, CodeDecoder, ConfigProvider, GroundTruthResolver, OcrEngine, PageRenderer,
    PdfReader, Storage,
};
pub use crate::utils::error::Result;
