//! Message sources: where raw messages and attachment payloads come from.
//!
//! A source mirrors the three calls of a mailbox API: list matching
//! messages, get one message, get one attachment of a message.

pub mod eml;
pub mod local;

use tracing::{debug, warn};

use crate::error::Result;
use crate::model::email::EmailContent;
use crate::model::part::Message;
use crate::parser::mime::{read_message, PendingFetch};

/// Default search for statement emails.
pub const DEFAULT_QUERY: &str = "statement OR estatement OR e-statement";

/// Something that can hand out messages and their attachments.
pub trait MessageSource {
    /// Ids of messages matching `query`, newest first, at most `max_results`.
    fn list_messages(&self, query: &str, max_results: usize) -> Result<Vec<String>>;

    /// The full message with its content tree.
    fn get_message(&self, id: &str) -> Result<Message>;

    /// Base64url payload of one attachment of `message_id`.
    fn get_attachment(&self, message_id: &str, attachment_id: &str) -> Result<String>;
}

/// Retrieve a message and reduce it to [`EmailContent`], fetching queued
/// attachments once the walk is done.
pub fn fetch_content(source: &dyn MessageSource, message_id: &str) -> Result<EmailContent> {
    let message = source.get_message(message_id)?;
    let parsed = read_message(&message);
    let mut content = parsed.content;
    resolve_attachments(source, &mut content, &parsed.pending);
    Ok(content)
}

/// Fetch the content of each pending attachment.
///
/// A failed fetch is logged and leaves that attachment without content;
/// it never fails the message.
pub fn resolve_attachments(
    source: &dyn MessageSource,
    content: &mut EmailContent,
    pending: &[PendingFetch],
) {
    for fetch in pending {
        let Some(attachment) = content.attachments.get_mut(fetch.index) else {
            continue;
        };
        match source.get_attachment(&content.id, &fetch.attachment_id) {
            Ok(data) => {
                debug!(
                    message_id = %content.id,
                    path = %attachment.part_path,
                    encoded_len = data.len(),
                    "Fetched attachment"
                );
                attachment.content = Some(data);
            }
            Err(e) => {
                warn!(
                    message_id = %content.id,
                    attachment_id = %fetch.attachment_id,
                    error = %e,
                    "Attachment fetch failed"
                );
            }
        }
    }
}

/// Case-insensitive subject filter for queries of the form `a OR b OR c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectQuery {
    terms: Vec<String>,
}

impl SubjectQuery {
    pub fn parse(query: &str) -> Self {
        let terms = query
            .split(" OR ")
            .map(|t| t.trim().trim_matches('"').to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self { terms }
    }

    /// `true` if any term occurs in `subject`. An empty query matches everything.
    pub fn matches(&self, subject: &str) -> bool {
        if self.terms.is_empty() {
            return true;
        }
        let subject = subject.to_lowercase();
        self.terms.iter().any(|t| subject.contains(t.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::error::StmtError;
    use crate::model::part::{MessagePart, PartBody};

    struct FakeSource {
        message: Message,
        attachments: HashMap<String, String>,
    }

    impl MessageSource for FakeSource {
        fn list_messages(&self, _query: &str, _max: usize) -> Result<Vec<String>> {
            Ok(vec![self.message.id.clone()])
        }

        fn get_message(&self, id: &str) -> Result<Message> {
            if id == self.message.id {
                Ok(self.message.clone())
            } else {
                Err(StmtError::MessageNotFound(id.to_string()))
            }
        }

        fn get_attachment(&self, _message_id: &str, attachment_id: &str) -> Result<String> {
            self.attachments
                .get(attachment_id)
                .cloned()
                .ok_or_else(|| StmtError::retrieval(attachment_id, "gone"))
        }
    }

    fn pdf_part(attachment_id: &str) -> MessagePart {
        MessagePart {
            mime_type: "application/pdf".into(),
            body: PartBody {
                attachment_id: Some(attachment_id.into()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn source() -> FakeSource {
        FakeSource {
            message: Message {
                id: "m1".into(),
                payload: MessagePart {
                    mime_type: "multipart/mixed".into(),
                    parts: vec![pdf_part("ok"), pdf_part("missing")],
                    ..Default::default()
                },
                ..Default::default()
            },
            attachments: HashMap::from([("ok".to_string(), "JVBERi0".to_string())]),
        }
    }

    #[test]
    fn test_fetch_content_resolves_attachments() {
        let content = fetch_content(&source(), "m1").unwrap();
        assert_eq!(content.attachments.len(), 2);
        assert_eq!(content.attachments[0].content.as_deref(), Some("JVBERi0"));
        // A failed fetch degrades to no content.
        assert_eq!(content.attachments[1].content, None);
    }

    #[test]
    fn test_fetch_content_unknown_message() {
        assert!(matches!(
            fetch_content(&source(), "nope"),
            Err(StmtError::MessageNotFound(_))
        ));
    }

    #[test]
    fn test_subject_query() {
        let q = SubjectQuery::parse(DEFAULT_QUERY);
        assert!(q.matches("Your Statement is ready"));
        assert!(q.matches("New E-Statement available"));
        assert!(!q.matches("Weekly newsletter"));
        assert!(SubjectQuery::parse("").matches("anything"));
    }
}
