//! Dispatch orchestrator — routes a message, records rows, fans out forwards.
//!
//! For every category the router matches, the dispatcher extracts the
//! category's fields, prepends the current date in the configured
//! reference timezone, appends the row to the category's sheet, and then
//! forwards the verbatim text to each destination chat. Every append and
//! every forward is an independent operation: a failure is logged with
//! its category or destination and processing continues.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{FixedOffset, Utc};
use tracing::{debug, error, info, warn};

use crate::error::{ChannelError, SheetError};
use crate::router::{CategoryTable, ChatId};

/// Spreadsheet collaborator seam. Appends exactly one row; at-least-once
/// from the dispatcher's perspective.
#[async_trait]
pub trait SheetAppender: Send + Sync {
    async fn append_row(&self, sheet_id: &str, row: Vec<String>) -> Result<(), SheetError>;
}

/// Forwarding collaborator seam. Sends the text as a new message to the
/// destination chat.
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(&self, chat_id: ChatId, text: &str) -> Result<(), ChannelError>;
}

/// Outcome counters for one dispatched message. Logged, and handy in
/// tests; nothing downstream consumes it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub categories_matched: usize,
    pub rows_appended: usize,
    pub rows_failed: usize,
    pub forwards_sent: usize,
    pub forwards_failed: usize,
}

/// The orchestrator. Holds the immutable category table and the two
/// collaborator seams; processes one message at a time.
pub struct Dispatcher {
    table: CategoryTable,
    sheets: Arc<dyn SheetAppender>,
    forwarder: Arc<dyn Forwarder>,
    tz: FixedOffset,
}

impl Dispatcher {
    pub fn new(
        table: CategoryTable,
        sheets: Arc<dyn SheetAppender>,
        forwarder: Arc<dyn Forwarder>,
        tz: FixedOffset,
    ) -> Self {
        Self {
            table,
            sheets,
            forwarder,
            tz,
        }
    }

    /// Today's date in the reference timezone, as it appears in column 1.
    fn date_stamp(&self) -> String {
        Utc::now()
            .with_timezone(&self.tz)
            .format("%Y-%m-%d")
            .to_string()
    }

    /// Process one inbound message: classify, record, forward.
    pub async fn dispatch(&self, text: &str) -> DispatchReport {
        let matched = self.table.route(text);
        let mut report = DispatchReport {
            categories_matched: matched.len(),
            ..DispatchReport::default()
        };

        if matched.is_empty() {
            debug!("Message matched no categories");
            return report;
        }

        // Overlapping destination lists deliver once per matched
        // category; repeats are noted at debug.
        let mut seen_destinations: HashSet<ChatId> = HashSet::new();

        for rule in matched {
            if let Some(sheet_id) = rule.sheet_id.as_deref() {
                let record = rule.fields.extract(text);
                let mut row = Vec::with_capacity(record.len() + 1);
                row.push(self.date_stamp());
                row.extend(record.into_values());

                match self.sheets.append_row(sheet_id, row).await {
                    Ok(()) => {
                        info!(category = %rule.id, sheet_id, "Row appended");
                        report.rows_appended += 1;
                    }
                    Err(e) => {
                        error!(category = %rule.id, sheet_id, error = %e, "Sheet append failed");
                        report.rows_failed += 1;
                    }
                }
            } else {
                debug!(category = %rule.id, "No sheet configured, skipping record");
            }

            for &chat_id in &rule.forward_to {
                if !seen_destinations.insert(chat_id) {
                    debug!(
                        category = %rule.id,
                        destination = chat_id,
                        "Destination already served by an earlier category; forwarding again"
                    );
                }
                match self.forwarder.forward(chat_id, text).await {
                    Ok(()) => {
                        info!(category = %rule.id, destination = chat_id, "Message forwarded");
                        report.forwards_sent += 1;
                    }
                    Err(e) => {
                        warn!(
                            category = %rule.id,
                            destination = chat_id,
                            error = %e,
                            "Forward failed"
                        );
                        report.forwards_failed += 1;
                    }
                }
            }
        }

        info!(
            matched = report.categories_matched,
            rows = report.rows_appended,
            forwards = report.forwards_sent,
            "Dispatch complete"
        );
        report
    }
}
