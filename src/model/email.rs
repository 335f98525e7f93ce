//! Email content located by the MIME tree walk.

use serde::{Deserialize, Serialize};

/// MIME type of statement attachments.
pub const PDF_MIME: &str = "application/pdf";

/// A PDF attachment found while walking the content tree.
///
/// Content is populated lazily: from inline body data during the walk,
/// or by a separate fetch once the walk has finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// Dot-separated pre-order position in the tree (e.g. `"0.1.2"`).
    pub part_path: String,
    /// Filename from the part, possibly empty.
    pub filename: String,
    /// MIME type of the part.
    pub mime_type: String,
    /// Base64url-encoded content, once available.
    pub content: Option<String>,
}

impl Attachment {
    /// `true` if this attachment is a PDF.
    pub fn is_pdf(&self) -> bool {
        self.mime_type.eq_ignore_ascii_case(PDF_MIME)
    }
}

/// Headers and text-bearing content of one message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailContent {
    pub id: String,
    pub subject: String,
    pub from_address: String,
    /// Raw `Date` header, parsed only at assembly time.
    pub date: String,
    /// First `text/plain` body found, or empty.
    pub body_text: String,
    pub attachments: Vec<Attachment>,
}

impl EmailContent {
    /// PDF attachments in traversal order.
    pub fn pdf_attachments(&self) -> impl Iterator<Item = &Attachment> {
        self.attachments.iter().filter(|a| a.is_pdf())
    }
}
