//! Domain collaborators consumed by the engine
//!
//! The transactions/line-items repository is owned by the host app;
//! the engine only reads from it through [`LessonSource`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cue_core::Result;
use std::collections::BTreeMap;

/// One purchased lesson occurrence
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub id: String,
    pub student: String,
    pub focus: String,
    pub provider: String,
    pub starts_at: DateTime<Utc>,
}

/// Read-only view of the host app's transactions/line-items repository
#[async_trait]
pub trait LessonSource: Send + Sync {
    /// All lesson line items across all transactions
    async fn get_all_with_items(&self) -> Result<Vec<LineItem>>;

    /// Look up a single line item
    async fn get_line_item_by_id(&self, id: &str) -> Result<Option<LineItem>>;
}

/// A logical recurring series of lessons: same student, focus, and
/// provider, occurrences sorted by start time
#[derive(Debug, Clone, PartialEq)]
pub struct LessonChain {
    pub student: String,
    pub focus: String,
    pub provider: String,
    pub occurrences: Vec<LineItem>,
}

/// Group raw line items into chains keyed by (student, focus, provider)
pub fn build_chains(items: &[LineItem]) -> Vec<LessonChain> {
    let mut grouped: BTreeMap<(String, String, String), Vec<LineItem>> = BTreeMap::new();
    for item in items {
        grouped
            .entry((
                item.student.clone(),
                item.focus.clone(),
                item.provider.clone(),
            ))
            .or_default()
            .push(item.clone());
    }

    grouped
        .into_iter()
        .map(|((student, focus, provider), mut occurrences)| {
            occurrences.sort_by_key(|item| item.starts_at);
            LessonChain {
                student,
                focus,
                provider,
                occurrences,
            }
        })
        .collect()
}

/// In-memory lesson source backed by a fixed list. Handy for tests and
/// host-app previews.
#[derive(Default, Clone)]
pub struct StaticLessons {
    items: Vec<LineItem>,
}

impl StaticLessons {
    pub fn new(items: Vec<LineItem>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl LessonSource for StaticLessons {
    async fn get_all_with_items(&self) -> Result<Vec<LineItem>> {
        Ok(self.items.clone())
    }

    async fn get_line_item_by_id(&self, id: &str) -> Result<Option<LineItem>> {
        Ok(self.items.iter().find(|item| item.id == id).cloned())
    }
}
