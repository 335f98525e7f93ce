//! Raw RFC 5322 messages (`.eml`) converted into a [`Message`] tree.
//!
//! `mail-parser` does the MIME decoding. Each leaf part's decoded bytes
//! are re-encoded as base64url so the tree looks exactly like one from a
//! mailbox API and goes through the same walk and decoder.

use mail_parser::{MessageParser, MimeHeaders, PartType};
use tracing::warn;

use crate::error::{Result, StmtError};
use crate::model::part::{Header, Message, MessagePart, PartBody};
use crate::parser::decode::encode_base64url;

/// Maximum multipart nesting converted (deeper parts are dropped).
const MAX_DEPTH: usize = 32;

/// Parse a raw message into a [`Message`] with the given id.
pub fn message_from_eml(id: &str, raw: &[u8]) -> Result<Message> {
    let data = skip_from_line(raw);
    let parsed = MessageParser::default()
        .parse(data)
        .ok_or_else(|| StmtError::Decode(format!("'{id}' is not an RFC 5322 message")))?;

    let mut payload = convert_part(&parsed, 0, 0);

    let header_end = find_header_end(data).unwrap_or(data.len());
    payload.headers = unfold_headers(&String::from_utf8_lossy(&data[..header_end]));

    // Prefer mail-parser's RFC 2047 decoded subject over the raw one.
    if let Some(subject) = parsed.subject() {
        for header in payload.headers.iter_mut() {
            if header.name.eq_ignore_ascii_case("subject") {
                header.value = subject.to_string();
            }
        }
    }

    Ok(Message {
        id: id.to_string(),
        payload,
        ..Default::default()
    })
}

fn convert_part(msg: &mail_parser::Message<'_>, part_id: usize, depth: usize) -> MessagePart {
    let Some(part) = msg.part(part_id) else {
        return MessagePart::default();
    };

    let mime_type = part
        .content_type()
        .map(|ct| match ct.subtype() {
            Some(sub) => format!("{}/{}", ct.ctype(), sub),
            None => ct.ctype().to_string(),
        })
        .unwrap_or_else(|| "text/plain".to_string())
        .to_lowercase();

    let mut out = MessagePart {
        part_id: Some(part_id.to_string()),
        filename: part.attachment_name().unwrap_or_default().to_string(),
        ..Default::default()
    };

    match &part.body {
        PartType::Multipart(children) => {
            if depth < MAX_DEPTH {
                out.parts = children
                    .iter()
                    .map(|&child| convert_part(msg, child, depth + 1))
                    .collect();
            } else {
                warn!(depth, "Multipart nesting too deep, dropping children");
            }
            out.mime_type = mime_type;
        }
        PartType::Message(nested) => {
            if depth < MAX_DEPTH {
                out.parts = vec![convert_part(nested, 0, depth + 1)];
            }
            out.mime_type = "message/rfc822".to_string();
        }
        _ => {
            let contents = part.contents();
            out.body = PartBody {
                attachment_id: None,
                size: contents.len() as u64,
                data: Some(encode_base64url(contents)),
            };
            out.mime_type = mime_type;
        }
    }

    out
}

/// Skip an mbox-style `From ` separator line and a UTF-8 BOM, if present.
fn skip_from_line(data: &[u8]) -> &[u8] {
    let data = data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data);

    if data.starts_with(b"From ") {
        if let Some(pos) = data.iter().position(|&b| b == b'\n') {
            return &data[pos + 1..];
        }
    }
    data
}

/// Byte offset of the blank line that ends the header block.
fn find_header_end(data: &[u8]) -> Option<usize> {
    let lf = data.windows(2).position(|w| w == b"\n\n");
    let crlf = data.windows(4).position(|w| w == b"\r\n\r\n");
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Join folded continuation lines and split `Name: value` pairs.
fn unfold_headers(text: &str) -> Vec<Header> {
    let mut result: Vec<Header> = Vec::new();

    for line in text.lines() {
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some(last) = result.last_mut() {
                last.value.push(' ');
                last.value.push_str(line.trim());
            }
        } else if let Some((name, value)) = line.split_once(':') {
            result.push(Header {
                name: name.trim().to_string(),
                value: value.trim().to_string(),
            });
        }
    }

    result
}
