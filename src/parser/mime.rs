//! Content-tree walk: finds the plain-text body and PDF attachments.
//!
//! The walk is pre-order over an explicit stack, so hostile nesting depth
//! costs heap, never call stack.

use tracing::debug;

use crate::model::email::{Attachment, EmailContent, PDF_MIME};
use crate::model::part::{Message, MessagePart};
use crate::parser::decode::decode_text_or_empty;

/// An attachment whose content must be fetched by id after the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFetch {
    /// Index into [`EmailContent::attachments`].
    pub index: usize,
    pub attachment_id: String,
}

/// Result of walking a part list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalkOutput {
    pub body_text: String,
    pub attachments: Vec<Attachment>,
    pub pending: Vec<PendingFetch>,
}

/// A message reduced to its content, plus the fetches still owed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedMessage {
    pub content: EmailContent,
    pub pending: Vec<PendingFetch>,
}

/// Extract headers, body text and attachments from a full message.
///
/// A payload without child parts is a one-node tree: if it is plain text
/// its body becomes `body_text`, and it can have no attachments.
pub fn read_message(message: &Message) -> ParsedMessage {
    let payload = &message.payload;

    let mut content = EmailContent {
        id: message.id.clone(),
        subject: payload.header("subject").unwrap_or_default().to_string(),
        from_address: payload.header("from").unwrap_or_default().to_string(),
        date: payload.header("date").unwrap_or_default().to_string(),
        ..Default::default()
    };

    if payload.parts.is_empty() {
        if payload.is_mime("text/plain") {
            if let Some(data) = payload.inline_data() {
                content.body_text = decode_text_or_empty(data);
            }
        }
        return ParsedMessage {
            content,
            pending: Vec::new(),
        };
    }

    let walk = walk_parts(&payload.parts);
    content.body_text = walk.body_text;
    content.attachments = walk.attachments;

    debug!(
        id = %content.id,
        attachments = content.attachments.len(),
        pending = walk.pending.len(),
        has_body = !content.body_text.is_empty(),
        "Walked message parts"
    );

    ParsedMessage {
        content,
        pending: walk.pending,
    }
}

/// Walk a list of sibling parts (and their descendants) in pre-order.
///
/// Paths concatenate sibling indices: top-level parts are `"0"`, `"1"`,
/// their children `"0.0"`, `"0.1"`, and so on. The first `text/plain`
/// part wins the body. `text/html` parts are decoded but never used as
/// the body. Every `application/pdf` part becomes an [`Attachment`].
pub fn walk_parts(parts: &[MessagePart]) -> WalkOutput {
    let mut out = WalkOutput::default();

    let mut stack: Vec<(&MessagePart, String)> = parts
        .iter()
        .enumerate()
        .rev()
        .map(|(i, part)| (part, i.to_string()))
        .collect();

    while let Some((part, path)) = stack.pop() {
        visit(part, &path, &mut out);

        for (i, child) in part.parts.iter().enumerate().rev() {
            stack.push((child, format!("{path}.{i}")));
        }
    }

    out
}

fn visit(part: &MessagePart, path: &str, out: &mut WalkOutput) {
    if part.is_mime("text/plain") || part.is_mime("text/html") {
        if let Some(data) = part.inline_data() {
            let decoded = decode_text_or_empty(data);
            if part.is_mime("text/plain") && out.body_text.is_empty() {
                out.body_text = decoded;
            }
        }
    } else if part.is_mime(PDF_MIME) {
        let index = out.attachments.len();
        out.attachments.push(Attachment {
            part_path: path.to_string(),
            filename: part.filename.clone(),
            mime_type: PDF_MIME.to_string(),
            content: part.inline_data().map(str::to_string),
        });

        if let Some(attachment_id) = part.body.attachment_id.as_deref() {
            if !attachment_id.is_empty() {
                out.pending.push(PendingFetch {
                    index,
                    attachment_id: attachment_id.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::part::{Header, PartBody};
    use crate::parser::decode::encode_base64url;

    fn text(mime: &str, body: &str) -> MessagePart {
        MessagePart {
            mime_type: mime.to_string(),
            body: PartBody {
                data: Some(encode_base64url(body.as_bytes())),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn container(mime: &str, parts: Vec<MessagePart>) -> MessagePart {
        MessagePart {
            mime_type: mime.to_string(),
            parts,
            ..Default::default()
        }
    }

    fn pdf_ref(filename: &str, attachment_id: &str) -> MessagePart {
        MessagePart {
            mime_type: PDF_MIME.to_string(),
            filename: filename.to_string(),
            body: PartBody {
                attachment_id: Some(attachment_id.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_first_plain_text_wins() {
        let walk = walk_parts(&[text("text/plain", "first"), text("text/plain", "second")]);
        assert_eq!(walk.body_text, "first");
    }

    #[test]
    fn test_html_never_becomes_body() {
        let walk = walk_parts(&[text("text/html", "<p>html</p>")]);
        assert_eq!(walk.body_text, "");

        let walk = walk_parts(&[text("text/html", "<p>html</p>"), text("text/plain", "plain")]);
        assert_eq!(walk.body_text, "plain");
    }

    #[test]
    fn test_empty_plain_part_does_not_block_later_one() {
        let walk = walk_parts(&[text("text/plain", ""), text("text/plain", "later")]);
        assert_eq!(walk.body_text, "later");
    }

    #[test]
    fn test_deeply_nested_body_is_found() {
        // Body lives at path "0.1.2"
        let tree = container(
            "multipart/mixed",
            vec![
                container("multipart/related", vec![]),
                container(
                    "multipart/alternative",
                    vec![
                        text("text/html", "<b>a</b>"),
                        container("multipart/related", vec![]),
                        text("text/plain", "nested body"),
                    ],
                ),
            ],
        );
        let walk = walk_parts(&[tree]);
        assert_eq!(walk.body_text, "nested body");
    }

    #[test]
    fn test_attachment_paths_are_preorder() {
        let parts = vec![
            container(
                "multipart/mixed",
                vec![pdf_ref("a.pdf", "att-a"), container("multipart/mixed", vec![pdf_ref("b.pdf", "att-b")])],
            ),
            pdf_ref("c.pdf", "att-c"),
        ];
        let walk = walk_parts(&parts);
        let paths: Vec<&str> = walk.attachments.iter().map(|a| a.part_path.as_str()).collect();
        assert_eq!(paths, vec!["0.0", "0.1.0", "1"]);
        let files: Vec<&str> = walk.attachments.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(files, vec!["a.pdf", "b.pdf", "c.pdf"]);
    }

    #[test]
    fn test_attachment_ids_are_queued_not_fetched() {
        let walk = walk_parts(&[text("text/plain", "body"), pdf_ref("s.pdf", "ANGjdJ")]);
        assert_eq!(walk.attachments.len(), 1);
        assert_eq!(walk.attachments[0].content, None);
        assert_eq!(
            walk.pending,
            vec![PendingFetch {
                index: 0,
                attachment_id: "ANGjdJ".to_string()
            }]
        );
    }

    #[test]
    fn test_inline_pdf_content_is_kept() {
        let mut part = text(PDF_MIME, "%PDF-1.4");
        part.filename = "inline.pdf".into();
        let walk = walk_parts(&[part]);
        assert_eq!(walk.attachments[0].content.as_deref(), Some("JVBERi0xLjQ"));
        assert!(walk.pending.is_empty());
    }

    #[test]
    fn test_hostile_depth_does_not_overflow() {
        let mut node = text("text/plain", "bottom");
        for _ in 0..10_000 {
            node = container("multipart/mixed", vec![node]);
        }
        let walk = walk_parts(std::slice::from_ref(&node));
        assert_eq!(walk.body_text, "bottom");
        // Drop iteratively; the derived Drop recurses once per level.
        let mut current = Some(node);
        while let Some(mut n) = current.take() {
            current = n.parts.pop();
        }
    }

    #[test]
    fn test_read_message_headers_and_single_part() {
        let message = Message {
            id: "m1".into(),
            payload: MessagePart {
                mime_type: "text/plain".into(),
                headers: vec![
                    Header { name: "Subject".into(), value: "Statement".into() },
                    Header { name: "FROM".into(), value: "bank@example.com".into() },
                    Header { name: "date".into(), value: "Mon, 01 Apr 2024 10:00:00 +0000".into() },
                ],
                body: PartBody {
                    data: Some(encode_base64url(b"only body")),
                    ..Default::default()
                },
                ..Default::default()
            },
            ..Default::default()
        };
        let parsed = read_message(&message);
        assert_eq!(parsed.content.subject, "Statement");
        assert_eq!(parsed.content.from_address, "bank@example.com");
        assert_eq!(parsed.content.date, "Mon, 01 Apr 2024 10:00:00 +0000");
        assert_eq!(parsed.content.body_text, "only body");
        assert!(parsed.content.attachments.is_empty());
    }

    #[test]
    fn test_single_part_html_has_no_body() {
        let message = Message {
            id: "m2".into(),
            payload: text("text/html", "<p>hi</p>"),
            ..Default::default()
        };
        assert_eq!(read_message(&message).content.body_text, "");
    }
}
