//! The statement pipeline: text selection, extraction, categorization,
//! aggregation and assembly, with a tagged outcome per message.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::classify::aggregate::aggregate;
use crate::classify::category::categorize;
use crate::error::{Result, StmtError};
use crate::model::email::EmailContent;
use crate::model::statement::{StatementRecord, StatementSummary};
use crate::parser::decode::{pdf_text_or_empty, PdfTextExtractor, TextExtractor};
use crate::parser::transaction::extract_transactions;
use crate::source::{fetch_content, MessageSource};
use crate::statement::assemble::assemble;
use crate::statement::clock::{Clock, SystemClock};
use crate::store::StatementStore;

/// One way of obtaining statement text from an email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStrategy {
    /// Text of the first readable PDF attachment, in traversal order.
    PdfAttachments,
    /// The plain-text body.
    BodyText,
}

/// PDF text first, then the body.
pub const DEFAULT_STRATEGIES: &[TextStrategy] =
    &[TextStrategy::PdfAttachments, TextStrategy::BodyText];

impl TextStrategy {
    /// Try this strategy. Only an empty string counts as nothing found.
    pub fn extract(self, content: &EmailContent, extractor: &dyn TextExtractor) -> Option<String> {
        match self {
            Self::PdfAttachments => content.pdf_attachments().find_map(|att| {
                let encoded = att.content.as_deref()?;
                let text = pdf_text_or_empty(extractor, encoded);
                if text.is_empty() {
                    debug!(path = %att.part_path, "PDF attachment yielded no text");
                    None
                } else {
                    Some(text)
                }
            }),
            Self::BodyText => {
                if content.body_text.is_empty() {
                    None
                } else {
                    Some(content.body_text.clone())
                }
            }
        }
    }
}

/// Run the strategies in order and return the first text found, or `""`.
pub fn select_text(
    content: &EmailContent,
    extractor: &dyn TextExtractor,
    strategies: &[TextStrategy],
) -> String {
    for strategy in strategies {
        if let Some(text) = strategy.extract(content, extractor) {
            debug!(?strategy, chars = text.len(), "Selected statement text");
            return text;
        }
    }
    String::new()
}

/// What happened to one statement parse request.
#[derive(Debug)]
pub enum ParseOutcome {
    /// A record was assembled (and, via [`StatementParser::parse_and_store`], stored).
    Parsed(StatementRecord),
    /// The message could not be retrieved. Nothing was parsed.
    Unavailable { message_id: String, reason: String },
    /// Assembly or storage failed. Nothing was written.
    Failed(StmtError),
}

impl ParseOutcome {
    pub fn record(&self) -> Option<&StatementRecord> {
        match self {
            Self::Parsed(record) => Some(record),
            _ => None,
        }
    }

    pub fn summary(&self) -> Option<StatementSummary> {
        self.record().map(StatementRecord::summary)
    }

    /// Collapse into a `Result`, mapping `Unavailable` to a retrieval error.
    pub fn into_result(self) -> Result<StatementRecord> {
        match self {
            Self::Parsed(record) => Ok(record),
            Self::Unavailable { message_id, reason } => {
                Err(StmtError::Retrieval { id: message_id, reason })
            }
            Self::Failed(e) => Err(e),
        }
    }
}

/// Runs the statement pipeline with its collaborators.
pub struct StatementParser {
    extractor: Box<dyn TextExtractor>,
    clock: Box<dyn Clock>,
    strategies: Vec<TextStrategy>,
}

impl Default for StatementParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementParser {
    /// A parser using `pdf-extract`, the system clock and the default strategies.
    pub fn new() -> Self {
        Self {
            extractor: Box::new(PdfTextExtractor),
            clock: Box::new(SystemClock),
            strategies: DEFAULT_STRATEGIES.to_vec(),
        }
    }

    pub fn with_extractor(mut self, extractor: impl TextExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replace the strategy order. An empty list falls back to the defaults.
    pub fn with_strategies(mut self, strategies: Vec<TextStrategy>) -> Self {
        self.strategies = if strategies.is_empty() {
            DEFAULT_STRATEGIES.to_vec()
        } else {
            strategies
        };
        self
    }

    pub fn strategies(&self) -> &[TextStrategy] {
        &self.strategies
    }

    /// Run the pure stages on content that has already been retrieved.
    pub fn parse_content(&self, content: &EmailContent, user_id: &str) -> Result<StatementRecord> {
        let text = select_text(content, self.extractor.as_ref(), &self.strategies);
        let transactions = categorize(extract_transactions(&text));
        let totals = aggregate(&transactions);
        assemble(content, user_id, transactions, totals, self.clock.as_ref())
    }

    /// Retrieve one message and parse it.
    pub fn parse_message(
        &self,
        source: &dyn MessageSource,
        message_id: &str,
        user_id: &str,
    ) -> ParseOutcome {
        let content = match fetch_content(source, message_id) {
            Ok(content) => content,
            Err(e) => {
                warn!(message_id, error = %e, "Message unavailable");
                return ParseOutcome::Unavailable {
                    message_id: message_id.to_string(),
                    reason: e.to_string(),
                };
            }
        };

        match self.parse_content(&content, user_id) {
            Ok(record) => {
                info!(
                    message_id,
                    transactions = record.transactions.len(),
                    "Parsed statement"
                );
                ParseOutcome::Parsed(record)
            }
            Err(e) => {
                warn!(message_id, error = %e, "Statement parse failed");
                ParseOutcome::Failed(e)
            }
        }
    }

    /// Parse one message and upsert the record on success.
    pub fn parse_and_store(
        &self,
        source: &dyn MessageSource,
        store: &mut dyn StatementStore,
        message_id: &str,
        user_id: &str,
    ) -> ParseOutcome {
        match self.parse_message(source, message_id, user_id) {
            ParseOutcome::Parsed(record) => match store.upsert(record.clone()) {
                Ok(_) => ParseOutcome::Parsed(record),
                Err(e) => ParseOutcome::Failed(e),
            },
            other => other,
        }
    }
}
