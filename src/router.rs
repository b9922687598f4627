//! Category routing — keyword matching over inbound message text.
//!
//! Each category carries a keyword list; a message belongs to every
//! category for which at least one keyword occurs as a case-insensitive
//! substring of the text. Categories match independently, so overlapping
//! keyword sets are expected (an accessory may also land in a broader
//! electronics bucket).

use std::collections::HashMap;

use crate::extract::FieldSpec;

/// Telegram chat identifier.
pub type ChatId = i64;

/// One classification bucket: keywords, optional spreadsheet target,
/// forward destinations, and the extraction schema used for its rows.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    /// Category identifier, used in logs and as the table key.
    pub id: String,
    /// Keywords matched as case-insensitive substrings. Empty matches nothing.
    pub keywords: Vec<String>,
    /// Destination spreadsheet. `None` means "do not record".
    pub sheet_id: Option<String>,
    /// Destination chats. Empty means "do not forward".
    pub forward_to: Vec<ChatId>,
    /// Extraction schema for this category's rows.
    pub fields: FieldSpec,
}

impl CategoryRule {
    /// Whether any keyword occurs in `text` (case-insensitive substring).
    pub fn matches(&self, text: &str) -> bool {
        if self.keywords.is_empty() {
            return false;
        }
        let haystack = text.to_lowercase();
        self.keywords
            .iter()
            .any(|kw| !kw.is_empty() && haystack.contains(&kw.to_lowercase()))
    }
}

/// Immutable category table, built once at startup.
///
/// Holds no resources and is never mutated afterwards, so it can be
/// shared freely without locking. Routing iterates in insertion order
/// to keep logs and tests stable.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    order: Vec<String>,
    rules: HashMap<String, CategoryRule>,
}

impl CategoryTable {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        let order = rules.iter().map(|r| r.id.clone()).collect();
        let rules = rules.into_iter().map(|r| (r.id.clone(), r)).collect();
        Self { order, rules }
    }

    pub fn get(&self, id: &str) -> Option<&CategoryRule> {
        self.rules.get(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// All rules in insertion order.
    pub fn rules(&self) -> impl Iterator<Item = &CategoryRule> {
        self.order.iter().filter_map(|id| self.rules.get(id))
    }

    /// Categories whose keywords match `text`, in insertion order.
    ///
    /// Deterministic, side-effect free, total — an empty result just
    /// means the message belongs nowhere.
    pub fn route(&self, text: &str) -> Vec<&CategoryRule> {
        self.rules().filter(|rule| rule.matches(text)).collect()
    }
}
