//! Message payload tree, in the shape the Gmail API returns it.
//!
//! A [`Message`] owns a root [`MessagePart`]; every part exclusively owns
//! its children. Bodies are base64url strings, decoded later by
//! [`crate::parser::decode`].

use serde::{Deserialize, Serialize};

/// A full message as returned by `users.messages.get`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Message {
    /// Opaque message id, also used to scope attachment fetches.
    pub id: String,
    /// Thread id, if the source groups messages.
    pub thread_id: Option<String>,
    /// Short preview text.
    pub snippet: Option<String>,
    /// Root of the content tree.
    pub payload: MessagePart,
}

/// One node of the content tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessagePart {
    /// Source-assigned part id (not the traversal path).
    pub part_id: Option<String>,
    /// MIME type, e.g. `"text/plain"` or `"application/pdf"`.
    pub mime_type: String,
    /// Filename for attachment parts, empty otherwise.
    pub filename: String,
    /// Headers of this part. Only the root's headers are read.
    pub headers: Vec<Header>,
    /// Inline data and/or a reference to fetch it later.
    pub body: PartBody,
    /// Nested parts, in document order.
    pub parts: Vec<MessagePart>,
}

/// A single `name: value` header pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// Body of a part: inline base64url data, an attachment id, or both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartBody {
    /// Attachment reference resolvable with `get_attachment`.
    pub attachment_id: Option<String>,
    /// Decoded size in bytes as reported by the source.
    pub size: u64,
    /// Inline base64url-encoded content.
    pub data: Option<String>,
}

impl MessagePart {
    /// Look up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Inline body data, treating an empty string as absent.
    pub fn inline_data(&self) -> Option<&str> {
        self.body.data.as_deref().filter(|d| !d.is_empty())
    }

    /// `true` if the MIME type matches, ignoring case and parameters.
    pub fn is_mime(&self, mime: &str) -> bool {
        self.mime_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .eq_ignore_ascii_case(mime)
    }
}
