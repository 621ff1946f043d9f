//! PDF text extraction, page by page

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::PageText;

/// pdf-extract can hang on pathological fonts; give up on it after this long
const EXTRACT_TIMEOUT: Duration = Duration::from_secs(60);

/// Normalize extracted text without touching its paragraph structure
fn cleanup_pdf_text(text: &str) -> String {
    text.replace('\0', "")
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\u{00A0}', " ") // Non-breaking space -> space
        .replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

/// PDF parser
pub struct FileParser;

impl FileParser {
    /// Extract one `PageText` per page. Pages without text are kept with empty
    /// content so page numbers stay aligned with the file.
    pub fn parse_pdf(filename: &str, data: &[u8]) -> Result<Vec<PageText>> {
        let page_count = match lopdf::Document::load_mem(data) {
            Ok(doc) => {
                if doc.is_encrypted() {
                    tracing::warn!("{} is encrypted; extraction may produce no text", filename);
                }
                Some(doc.get_pages().len() as u32)
            }
            Err(e) => {
                tracing::debug!("lopdf could not load {}: {}", filename, e);
                None
            }
        };

        let raw_pages = match Self::extract_pages_with_timeout(data) {
            Ok(pages) => pages,
            Err(message) => {
                tracing::warn!("pdf-extract failed for {}: {}, trying fallback", filename, message);
                if page_count.is_none() {
                    return Err(Error::file_parse(filename, "not a readable PDF document"));
                }
                Self::extract_pages_fallback(filename, data)?
            }
        };

        let page_count = page_count
            .unwrap_or(raw_pages.len() as u32)
            .max(raw_pages.len() as u32);

        let pages: Vec<PageText> = raw_pages
            .iter()
            .enumerate()
            .map(|(i, text)| PageText {
                filename: filename.to_string(),
                page_number: i as u32 + 1,
                page_count,
                content: cleanup_pdf_text(text),
            })
            .collect();

        tracing::info!(
            "Extracted {} pages from {} ({} with text)",
            pages.len(),
            filename,
            pages.iter().filter(|p| !p.content.trim().is_empty()).count()
        );

        Ok(pages)
    }

    /// Run pdf-extract on a helper thread so a stuck font cannot block the batch forever
    fn extract_pages_with_timeout(data: &[u8]) -> std::result::Result<Vec<String>, String> {
        let data_vec = data.to_vec();
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let result = pdf_extract::extract_text_from_mem_by_pages(&data_vec)
                .map_err(|e| e.to_string());
            let _ = tx.send(result);
        });

        match rx.recv_timeout(EXTRACT_TIMEOUT) {
            Ok(result) => {
                let _ = handle.join();
                result
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                // The thread cannot be killed; it is left to finish on its own
                tracing::error!("PDF extraction timeout after {:?}", EXTRACT_TIMEOUT);
                Err("extraction timed out".to_string())
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err("extraction thread panicked".to_string())
            }
        }
    }

    /// Fallback extraction using lopdf directly
    fn extract_pages_fallback(filename: &str, data: &[u8]) -> Result<Vec<String>> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::file_parse(filename, format!("Failed to load PDF: {}", e)))?;

        let pages = doc
            .get_pages()
            .keys()
            .map(|&page_number| match doc.extract_text(&[page_number]) {
                Ok(text) => text,
                Err(e) => {
                    tracing::debug!("Could not extract page {} of {}: {}", page_number, filename, e);
                    String::new()
                }
            })
            .collect();

        Ok(pages)
    }
}
