//! Content decoding: base64url transport encoding, UTF-8 text and PDF text.
//!
//! Nothing in here is fatal to a statement parse. The `*_or_empty`
//! helpers log the problem and hand back an empty string.

use std::panic::{self, AssertUnwindSafe};

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use tracing::{debug, warn};

use crate::error::{Result, StmtError};

/// URL-safe base64 that accepts input with or without `=` padding.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decode a base64url payload into raw bytes.
///
/// ASCII whitespace (line folding from some sources) is ignored.
pub fn decode_base64url(data: &str) -> Result<Vec<u8>> {
    let compact: Vec<u8> = data
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    URL_SAFE_LENIENT
        .decode(compact)
        .map_err(|e| StmtError::Decode(format!("invalid base64url: {e}")))
}

/// Encode raw bytes as unpadded base64url, the form message sources return.
pub fn encode_base64url(bytes: &[u8]) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode a base64url payload as UTF-8 text.
pub fn decode_text(data: &str) -> Result<String> {
    let bytes = decode_base64url(data)?;
    String::from_utf8(bytes).map_err(|e| StmtError::Decode(format!("invalid UTF-8: {e}")))
}

/// Like [`decode_text`], but a failure yields an empty string.
pub fn decode_text_or_empty(data: &str) -> String {
    match decode_text(data) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "Could not decode text part, treating as empty");
            String::new()
        }
    }
}

/// A document-text extraction capability.
///
/// Implementations return the text of every page, concatenated in page
/// order, or an error for unreadable input.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, pdf: &[u8]) -> Result<String>;
}

/// [`TextExtractor`] backed by the `pdf-extract` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract_text(&self, pdf: &[u8]) -> Result<String> {
        // pdf-extract can panic on malformed streams instead of returning Err.
        match panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(pdf))) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(StmtError::Pdf(e.to_string())),
            Err(_) => Err(StmtError::Pdf("PDF parser panicked".to_string())),
        }
    }
}

/// Decode a base64url PDF payload and extract its text.
pub fn pdf_text(extractor: &dyn TextExtractor, encoded: &str) -> Result<String> {
    let bytes = decode_base64url(encoded)?;
    debug!(bytes = bytes.len(), "Extracting PDF text");
    extractor.extract_text(&bytes)
}

/// Like [`pdf_text`], but any failure yields an empty string.
pub fn pdf_text_or_empty(extractor: &dyn TextExtractor, encoded: &str) -> String {
    match pdf_text(extractor, encoded) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "Could not read PDF attachment, treating as empty");
            String::new()
        }
    }
}
