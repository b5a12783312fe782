use crate::domain::model::RasterImage;
use crate::domain::ports::PdfReader;
use crate::utils::error::{Result, VerifyError};
use lopdf::{Document, Object, ObjectId};

/// `PdfReader` backed by lopdf.
#[derive(Debug, Clone, Default)]
pub struct LopdfReader;

impl LopdfReader {
    pub fn new() -> Self {
        Self
    }

    fn load(bytes: &[u8]) -> Result<Document> {
        let document = Document::load_mem(bytes)
            .map_err(|e| VerifyError::unreadable(format!("PDF parse error: {}", e)))?;
        if document.is_encrypted() {
            return Err(VerifyError::unreadable("PDF is encrypted"));
        }
        Ok(document)
    }
}

impl PdfReader for LopdfReader {
    fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        let document = Self::load(bytes)?;
        let mut pages = Vec::new();

        for page_number in document.get_pages().keys() {
            match document.extract_text(&[*page_number]) {
                Ok(text) => pages.push(text),
                Err(e) => tracing::warn!("No text layer on page {}: {}", page_number, e),
            }
        }

        Ok(pages.join("\n").trim().to_string())
    }

    fn extract_images(&self, bytes: &[u8]) -> Result<Vec<RasterImage>> {
        let document = Self::load(bytes)?;
        let mut images = Vec::new();

        for (page_number, page_id) in document.get_pages() {
            let page_images = match document.get_page_images(page_id) {
                Ok(page_images) => page_images,
                Err(e) => {
                    tracing::warn!("Could not list images on page {}: {}", page_number, e);
                    continue;
                }
            };

            for image in page_images {
                let filter = image
                    .filters
                    .as_ref()
                    .and_then(|filters| filters.first().cloned());
                let width = u32::try_from(image.width).ok();
                let height = u32::try_from(image.height).ok();

                let bytes = match filter.as_deref() {
                    Some("DCTDecode") | Some("JPXDecode") => image.content.to_vec(),
                    _ => match raw_pixels_as_pnm(
                        &document,
                        image.id,
                        image.color_space.as_deref(),
                        width,
                        height,
                    ) {
                        Some(pnm) => pnm,
                        None => {
                            tracing::debug!(
                                "Skipping image {:?} on page {} with unsupported encoding {:?}",
                                image.id,
                                page_number,
                                filter
                            );
                            continue;
                        }
                    },
                };

                images.push(RasterImage {
                    bytes,
                    width,
                    height,
                    encoding: filter,
                });
            }
        }

        Ok(images)
    }
}

/// Wraps decompressed 8-bit gray or RGB samples in a PNM header so external
/// decoders can read them.
fn raw_pixels_as_pnm(
    document: &Document,
    id: ObjectId,
    color_space: Option<&str>,
    width: Option<u32>,
    height: Option<u32>,
) -> Option<Vec<u8>> {
    let (width, height) = (width?, height?);
    let stream = match document.get_object(id).ok()? {
        Object::Stream(stream) => stream,
        _ => return None,
    };
    let samples = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    let (magic, channels) = match color_space {
        Some("DeviceGray") => ("P5", 1usize),
        Some("DeviceRGB") => ("P6", 3usize),
        _ => return None,
    };
    let expected = width as usize * height as usize * channels;
    if samples.len() < expected {
        return None;
    }

    let mut pnm = format!("{}\n{} {}\n255\n", magic, width, height).into_bytes();
    pnm.extend_from_slice(&samples[..expected]);
    Some(pnm)
}
