use crate::infrastructure::traits::{ExtractionError, TextExtractor};
use di::{inject, injectable};
use lopdf::Document;

pub struct PdfTextExtractor;

#[injectable(TextExtractor)]
impl PdfTextExtractor {
    #[inject]
    pub fn create() -> PdfTextExtractor {
        PdfTextExtractor
    }
}

impl TextExtractor for PdfTextExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let document =
            Document::load_mem(bytes).map_err(|e| ExtractionError::Unreadable(e.to_string()))?;
        let pages: Vec<u32> = document.get_pages().keys().copied().collect();
        if pages.is_empty() {
            return Ok(String::new());
        }
        document
            .extract_text(&pages)
            .map_err(|e| ExtractionError::Unreadable(e.to_string()))
    }
}
