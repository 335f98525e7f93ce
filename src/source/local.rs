//! Directory-backed message source.
//!
//! Layout:
//!
//! ```text
//! <dir>/<id>.json                                 Gmail API message (format=full)
//! <dir>/<id>.eml                                  raw RFC 5322 message
//! <dir>/attachments/<id>/<attachment_id>.json     {"size": n, "data": "<base64url>"}
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Result, StmtError};
use crate::model::part::Message;
use crate::source::eml::message_from_eml;
use crate::source::{MessageSource, SubjectQuery};

/// Attachment payload file, in the shape of `users.messages.attachments.get`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct AttachmentBody {
    data: String,
}

/// Reads messages and attachments from a local directory.
#[derive(Debug, Clone)]
pub struct LocalSource {
    dir: PathBuf,
}

impl LocalSource {
    /// Open a source directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            return Err(StmtError::io(
                &dir,
                std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            ));
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All message ids present, sorted.
    pub fn message_ids(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| StmtError::io(&self.dir, e))?;

        let mut ids: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                matches!(
                    path.extension().and_then(|e| e.to_str()),
                    Some("json") | Some("eml")
                )
            })
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    fn read_file(path: &Path) -> Result<Vec<u8>> {
        std::fs::read(path).map_err(|e| StmtError::io(path, e))
    }
}

/// Reject ids that would escape the source directory.
fn check_id(id: &str) -> Result<()> {
    if id.is_empty() || id.starts_with('.') || id.contains(['/', '\\']) {
        return Err(StmtError::MessageNotFound(id.to_string()));
    }
    Ok(())
}

impl MessageSource for LocalSource {
    fn list_messages(&self, query: &str, max_results: usize) -> Result<Vec<String>> {
        let query = SubjectQuery::parse(query);
        let mut matched: Vec<(Option<DateTime<FixedOffset>>, String)> = Vec::new();

        for id in self.message_ids()? {
            let message = match self.get_message(&id) {
                Ok(m) => m,
                Err(e) => {
                    warn!(id = %id, error = %e, "Skipping unreadable message");
                    continue;
                }
            };
            let subject = message.payload.header("subject").unwrap_or_default();
            if !query.matches(subject) {
                continue;
            }
            let date = message
                .payload
                .header("date")
                .and_then(|d| DateTime::parse_from_rfc2822(d.trim()).ok());
            matched.push((date, id));
        }

        // Newest first; undated messages last, then by id.
        matched.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        debug!(count = matched.len(), "Listed matching messages");

        Ok(matched
            .into_iter()
            .take(max_results)
            .map(|(_, id)| id)
            .collect())
    }

    fn get_message(&self, id: &str) -> Result<Message> {
        check_id(id)?;

        let json_path = self.dir.join(format!("{id}.json"));
        if json_path.is_file() {
            let bytes = Self::read_file(&json_path)?;
            let mut message: Message =
                serde_json::from_slice(&bytes).map_err(|e| StmtError::json(&json_path, e))?;
            if message.id.is_empty() {
                message.id = id.to_string();
            }
            return Ok(message);
        }

        let eml_path = self.dir.join(format!("{id}.eml"));
        if eml_path.is_file() {
            let bytes = Self::read_file(&eml_path)?;
            return message_from_eml(id, &bytes);
        }

        Err(StmtError::MessageNotFound(id.to_string()))
    }

    fn get_attachment(&self, message_id: &str, attachment_id: &str) -> Result<String> {
        check_id(message_id)?;
        check_id(attachment_id).map_err(|_| StmtError::retrieval(attachment_id, "invalid id"))?;

        let path = self
            .dir
            .join("attachments")
            .join(message_id)
            .join(format!("{attachment_id}.json"));
        let bytes = std::fs::read(&path).map_err(|e| StmtError::retrieval(attachment_id, e))?;
        let body: AttachmentBody =
            serde_json::from_slice(&bytes).map_err(|e| StmtError::retrieval(attachment_id, e))?;
        Ok(body.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    fn gmail_json(id: &str, subject: &str, date: &str) -> String {
        serde_json::json!({
            "id": id,
            "payload": {
                "mimeType": "text/plain",
                "headers": [
                    {"name": "Subject", "value": subject},
                    {"name": "Date", "value": date}
                ],
                "body": {"size": 0}
            }
        })
        .to_string()
    }

    #[test]
    fn test_list_filters_and_sorts_newest_first() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "old.json", &gmail_json("old", "March statement", "Fri, 15 Mar 2024 08:00:00 +0000"));
        write(tmp.path(), "new.json", &gmail_json("new", "April statement", "Mon, 15 Apr 2024 08:00:00 +0000"));
        write(tmp.path(), "promo.json", &gmail_json("promo", "Special offer", "Tue, 16 Apr 2024 08:00:00 +0000"));
        write(tmp.path(), "notes.txt", "ignored");

        let source = LocalSource::open(tmp.path()).unwrap();
        assert_eq!(source.message_ids().unwrap(), vec!["new", "old", "promo"]);
        assert_eq!(
            source.list_messages("statement", 5).unwrap(),
            vec!["new".to_string(), "old".to_string()]
        );
        assert_eq!(source.list_messages("statement", 1).unwrap(), vec!["new".to_string()]);
    }

    #[test]
    fn test_get_attachment() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "m1.json", &gmail_json("m1", "Statement", "Mon, 15 Apr 2024 08:00:00 +0000"));
        write(
            tmp.path(),
            "attachments/m1/att1.json",
            r#"{"size": 8, "data": "JVBERi0xLjQ"}"#,
        );

        let source = LocalSource::open(tmp.path()).unwrap();
        assert_eq!(source.get_attachment("m1", "att1").unwrap(), "JVBERi0xLjQ");
        assert!(matches!(
            source.get_attachment("m1", "att2"),
            Err(StmtError::Retrieval { .. })
        ));
    }

    #[test]
    fn test_missing_and_hostile_ids() {
        let tmp = tempfile::tempdir().unwrap();
        let source = LocalSource::open(tmp.path()).unwrap();
        assert!(matches!(source.get_message("nope"), Err(StmtError::MessageNotFound(_))));
        assert!(matches!(
            source.get_message("../etc/passwd"),
            Err(StmtError::MessageNotFound(_))
        ));
    }

    #[test]
    fn test_open_missing_dir() {
        assert!(LocalSource::open("/definitely/not/here").is_err());
    }

    #[test]
    fn test_message_id_defaults_to_file_stem() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "stem.json", r#"{"payload": {"mimeType": "text/plain"}}"#);
        let source = LocalSource::open(tmp.path()).unwrap();
        assert_eq!(source.get_message("stem").unwrap().id, "stem");
    }
}
