use crate::adapters::browser::ChromiumRenderer;
use crate::adapters::http::HttpPageRenderer;
use crate::adapters::pdf::LopdfReader;
use crate::adapters::tools::{TesseractOcr, ZbarDecoder};
use crate::config::{RendererKind, VerifierConfig};
use crate::core::engine::VerificationEngine;
use crate::core::extractor::DocumentExtractor;
use crate::core::resolver::{PollPolicy, ReferenceResolver};
use crate::core::{ConfigProvider, PageRenderer, Storage};
use crate::domain::model::{Document, MediaType, IMAGE_EXTENSIONS};
use crate::utils::error::{Result, VerifyError};
use crate::utils::validation::validate_file_extension;
use std::path::Path;
use std::sync::Arc;

/// Wires the lopdf/zbar/tesseract adapters and the configured renderer into an engine.
pub fn build_engine(config: &VerifierConfig) -> VerificationEngine {
    let tool_timeout = config.tool_timeout_secs();

    let extractor = DocumentExtractor::new(
        Arc::new(LopdfReader::new()),
        Arc::new(ZbarDecoder::new(
            config.tools.zbarimg_path.as_deref(),
            tool_timeout,
        )),
        Arc::new(TesseractOcr::new(
            config.tools.tesseract_path.as_deref(),
            config.ocr_language(),
            tool_timeout,
        )),
    );

    let renderer: Arc<dyn PageRenderer> = match config.renderer_kind() {
        RendererKind::Http => Arc::new(HttpPageRenderer::new(config.user_agent())),
        RendererKind::Chromium => Arc::new(ChromiumRenderer::new(
            config.renderer.chromium_path.as_deref(),
            config.user_agent(),
            config.virtual_time_budget_ms(),
        )),
    };
    tracing::debug!("Using {:?} renderer", config.renderer_kind());

    let resolver = ReferenceResolver::new(
        renderer,
        PollPolicy {
            timeout: config.render_timeout(),
            interval: config.poll_interval(),
        },
    );

    VerificationEngine::new(extractor, Arc::new(resolver))
}

/// Reads an uploaded file and tags its media type from the declared extension.
pub async fn load_document<S: Storage>(storage: &S, path: &str) -> Result<Document> {
    let mut allowed = vec!["pdf"];
    allowed.extend_from_slice(&IMAGE_EXTENSIONS);
    validate_file_extension("document", path, &allowed).map_err(|_| {
        VerifyError::UnsupportedMediaType {
            filename: path.to_string(),
        }
    })?;

    let media_type = MediaType::from_filename(path).ok_or_else(|| {
        VerifyError::UnsupportedMediaType {
            filename: path.to_string(),
        }
    })?;
    let bytes = storage.read_file(path).await?;

    let filename = Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string());

    Ok(Document::new(filename, media_type, bytes))
}
