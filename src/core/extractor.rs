use crate::domain::model::{Document, ExtractedContent, MediaType, RasterImage};
use crate::domain::ports::{CodeDecoder, OcrEngine, PdfReader};
use crate::utils::error::{Result, VerifyError};
use std::sync::Arc;

/// Turns an uploaded document into text, images and an optional decoded payload.
#[derive(Clone)]
pub struct DocumentExtractor {
    pdf: Arc<dyn PdfReader>,
    decoder: Arc<dyn CodeDecoder>,
    ocr: Arc<dyn OcrEngine>,
}

impl DocumentExtractor {
    pub fn new(
        pdf: Arc<dyn PdfReader>,
        decoder: Arc<dyn CodeDecoder>,
        ocr: Arc<dyn OcrEngine>,
    ) -> Self {
        Self { pdf, decoder, ocr }
    }

    pub async fn extract(&self, document: &Document) -> Result<ExtractedContent> {
        if document.bytes().is_empty() {
            return Err(VerifyError::unreadable(format!(
                "'{}' is empty",
                document.filename()
            )));
        }

        let (page_text, images, ocr_text) = match document.media_type() {
            MediaType::Pdf => {
                let text = self.pdf.extract_text(document.bytes())?;
                let images = self.pdf.extract_images(document.bytes())?;
                let text = text.trim().to_string();
                let ocr_text = if text.is_empty() && !images.is_empty() {
                    tracing::info!("{} has no text layer, running OCR", document.filename());
                    self.recognize_all(&images).await
                } else {
                    None
                };
                (text, images, ocr_text)
            }
            MediaType::Image => {
                let image = RasterImage::from_bytes(document.bytes().to_vec());
                let text = self.ocr.recognize(&image).await.map_err(|e| {
                    VerifyError::unreadable(format!("OCR failed for '{}': {}", document.filename(), e))
                })?;
                (text.trim().to_string(), vec![image], None)
            }
        };

        tracing::debug!(
            "Extracted {} chars of text and {} image(s) from {}",
            page_text.len(),
            images.len(),
            document.filename()
        );

        let decoded_payload = self.first_payload(&images).await;
        if let Some(payload) = &decoded_payload {
            tracing::debug!("Decoded payload: {}", payload);
        }

        Ok(ExtractedContent {
            page_text,
            images,
            decoded_payload,
            ocr_text,
        })
    }

    /// OCR over every image, joined in order. Failures on single images are skipped.
    async fn recognize_all(&self, images: &[RasterImage]) -> Option<String> {
        let mut pages = Vec::new();
        for (index, image) in images.iter().enumerate() {
            match self.ocr.recognize(image).await {
                Ok(text) if !text.trim().is_empty() => pages.push(text.trim().to_string()),
                Ok(_) => {}
                Err(e) => tracing::warn!("OCR failed on image {}: {}", index, e),
            }
        }
        (!pages.is_empty()).then(|| pages.join("\n"))
    }

    async fn first_payload(&self, images: &[RasterImage]) -> Option<String> {
        for (index, image) in images.iter().enumerate() {
            match self.decoder.decode(image).await {
                Ok(Some(payload)) if !payload.trim().is_empty() => {
                    return Some(payload.trim().to_string())
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Code decoding failed on image {}: {}", index, e),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedPdf {
        text: String,
        images: Vec<RasterImage>,
    }

    impl PdfReader for FixedPdf {
        fn extract_text(&self, _bytes: &[u8]) -> Result<String> {
            Ok(self.text.clone())
        }

        fn extract_images(&self, _bytes: &[u8]) -> Result<Vec<RasterImage>> {
            Ok(self.images.clone())
        }
    }

    struct BrokenPdf;

    impl PdfReader for BrokenPdf {
        fn extract_text(&self, _bytes: &[u8]) -> Result<String> {
            Err(VerifyError::unreadable("trailer not found"))
        }

        fn extract_images(&self, _bytes: &[u8]) -> Result<Vec<RasterImage>> {
            Ok(vec![])
        }
    }

    /// Decodes an image to its own bytes when they start with `QR:`.
    struct PrefixDecoder;

    #[async_trait]
    impl CodeDecoder for PrefixDecoder {
        async fn decode(&self, image: &RasterImage) -> Result<Option<String>> {
            let text = String::from_utf8_lossy(&image.bytes).to_string();
            if text == "BROKEN" {
                return Err(VerifyError::ToolFailed("zbarimg crashed".to_string()));
            }
            Ok(text.strip_prefix("QR:").map(str::to_string))
        }
    }

    struct EchoOcr;

    #[async_trait]
    impl OcrEngine for EchoOcr {
        async fn recognize(&self, _image: &RasterImage) -> Result<String> {
            Ok("  This is to certify that\nJane Doe \n".to_string())
        }
    }

    fn image(bytes: &str) -> RasterImage {
        RasterImage::from_bytes(bytes.as_bytes().to_vec())
    }

    fn extractor(pdf: impl PdfReader + 'static) -> DocumentExtractor {
        DocumentExtractor::new(Arc::new(pdf), Arc::new(PrefixDecoder), Arc::new(EchoOcr))
    }

    #[tokio::test]
    async fn test_pdf_text_is_trimmed_and_first_payload_wins() {
        let pdf = FixedPdf {
            text: "\n Jane Doe\nCloud 101 \n".to_string(),
            images: vec![image("logo"), image("BROKEN"), image("QR:first"), image("QR:second")],
        };
        let document = Document::new("cert.pdf", MediaType::Pdf, b"%PDF-1.7".to_vec());

        let content = extractor(pdf).extract(&document).await.unwrap();

        assert_eq!(content.page_text, "Jane Doe\nCloud 101");
        assert!(content.ocr_text.is_none());
        assert_eq!(content.images.len(), 4);
        assert_eq!(content.decoded_payload.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_image_document_uses_ocr_and_is_its_own_image() {
        let pdf = FixedPdf {
            text: String::new(),
            images: vec![],
        };
        let document = Document::new("scan.png", MediaType::Image, b"QR:https://alison.com/x".to_vec());

        let content = extractor(pdf).extract(&document).await.unwrap();

        assert_eq!(content.page_text, "This is to certify that\nJane Doe");
        assert_eq!(content.images.len(), 1);
        assert_eq!(
            content.decoded_payload.as_deref(),
            Some("https://alison.com/x")
        );
    }

    #[tokio::test]
    async fn test_pdf_without_text_layer_is_ocred() {
        let pdf = FixedPdf {
            text: " \n".to_string(),
            images: vec![image("scan")],
        };
        let document = Document::new("cert.pdf", MediaType::Pdf, b"%PDF-1.7".to_vec());

        let content = extractor(pdf).extract(&document).await.unwrap();

        assert_eq!(content.page_text, "");
        assert_eq!(
            content.ocr_text.as_deref(),
            Some("This is to certify that\nJane Doe")
        );
        assert_eq!(content.claim_text(), "This is to certify that\nJane Doe");
    }

    #[tokio::test]
    async fn test_corrupt_pdf_is_unreadable() {
        let document = Document::new("cert.pdf", MediaType::Pdf, b"garbage".to_vec());
        let err = extractor(BrokenPdf).extract(&document).await.unwrap_err();
        assert!(matches!(err, VerifyError::UnreadableDocument { .. }));
    }

    #[tokio::test]
    async fn test_empty_document_is_unreadable() {
        let document = Document::new("cert.pdf", MediaType::Pdf, vec![]);
        let err = extractor(BrokenPdf).extract(&document).await.unwrap_err();
        assert!(matches!(err, VerifyError::UnreadableDocument { .. }));
    }
}
