//! Core types for the Cue notification engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::constants::*;
use crate::error::{Error, Result};

/// Notification category - fixed enumeration of notification types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    ReceiptReady,
    Lessons,
    GearEnrichment,
    Warranty,
    Maintenance,
    Reengagement,
    Service,
}

impl Category {
    /// All categories, in declaration order
    pub const ALL: [Category; 7] = [
        Category::ReceiptReady,
        Category::Lessons,
        Category::GearEnrichment,
        Category::Warranty,
        Category::Maintenance,
        Category::Reengagement,
        Category::Service,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::ReceiptReady => "receipt_ready",
            Category::Lessons => "lessons",
            Category::GearEnrichment => "gear_enrichment",
            Category::Warranty => "warranty",
            Category::Maintenance => "maintenance",
            Category::Reengagement => "reengagement",
            Category::Service => "service",
        }
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "receipt_ready" => Ok(Category::ReceiptReady),
            "lessons" => Ok(Category::Lessons),
            "gear_enrichment" => Ok(Category::GearEnrichment),
            "warranty" => Ok(Category::Warranty),
            "maintenance" => Ok(Category::Maintenance),
            "reengagement" => Ok(Category::Reengagement),
            "service" => Ok(Category::Service),
            _ => Err(Error::InvalidCategory(s.to_string())),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Notification priority. Critical notifications bypass volume caps but
/// still respect the global and per-category opt-outs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Normal,
    Critical,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

/// Lifecycle status of a notification event.
///
/// `Delivered` is reserved for a future delivery-tracking integration;
/// the engine itself never writes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Scheduled,
    Delivered,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Scheduled => "scheduled",
            EventStatus::Delivered => "delivered",
            EventStatus::Cancelled => "cancelled",
        }
    }

    /// Statuses that count against rate limits and per-item caps
    pub fn counts_toward_limits(&self) -> bool {
        matches!(self, EventStatus::Scheduled | EventStatus::Delivered)
    }
}

impl FromStr for EventStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "scheduled" => Ok(EventStatus::Scheduled),
            "delivered" => Ok(EventStatus::Delivered),
            "cancelled" => Ok(EventStatus::Cancelled),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User-facing notification settings (singleton row in the store)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Master switch
    pub global_enabled: bool,
    /// Per-category toggles; categories not present default to disabled
    #[serde(default)]
    pub per_category_enabled: HashMap<Category, bool>,
    /// Cap on non-critical notifications per local calendar day
    pub daily_limit: i64,
    /// Cap on non-critical notifications per trailing 7-day window
    pub weekly_limit: i64,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        let per_category_enabled = Category::ALL.iter().map(|c| (*c, true)).collect();
        Self {
            global_enabled: true,
            per_category_enabled,
            daily_limit: DEFAULT_DAILY_LIMIT,
            weekly_limit: DEFAULT_WEEKLY_LIMIT,
        }
    }
}

impl NotificationSettings {
    /// Whether a category is enabled; absent categories are disabled
    pub fn category_enabled(&self, category: Category) -> bool {
        self.per_category_enabled
            .get(&category)
            .copied()
            .unwrap_or(false)
    }
}

/// Partial update for notification settings. Only `Some` fields are
/// applied; per-category entries are merged, not replaced wholesale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsPatch {
    pub global_enabled: Option<bool>,
    #[serde(default)]
    pub per_category_enabled: HashMap<Category, bool>,
    pub daily_limit: Option<i64>,
    pub weekly_limit: Option<i64>,
}

impl SettingsPatch {
    /// Apply this patch on top of existing settings
    pub fn apply(&self, settings: &mut NotificationSettings) {
        if let Some(global) = self.global_enabled {
            settings.global_enabled = global;
        }
        for (category, enabled) in &self.per_category_enabled {
            settings.per_category_enabled.insert(*category, *enabled);
        }
        if let Some(daily) = self.daily_limit {
            settings.daily_limit = daily;
        }
        if let Some(weekly) = self.weekly_limit {
            settings.weekly_limit = weekly;
        }
    }

    pub fn global(enabled: bool) -> Self {
        Self {
            global_enabled: Some(enabled),
            ..Default::default()
        }
    }

    pub fn category(category: Category, enabled: bool) -> Self {
        let mut patch = Self::default();
        patch.per_category_enabled.insert(category, enabled);
        patch
    }
}

/// Free-form notification metadata.
///
/// The identifier fields drive idempotency keys and per-item policy
/// lookups; everything else rides along in `extra` and is carried into
/// the OS notification payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gear_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_item_id: Option<String>,
    #[serde(default, flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl EventMetadata {
    /// Identifier used in the idempotency key: first present of
    /// line item, lesson, gear, service, queue item.
    pub fn item_identifier(&self) -> Option<&str> {
        self.line_item_id
            .as_deref()
            .or(self.lesson_id.as_deref())
            .or(self.gear_id.as_deref())
            .or(self.service_id.as_deref())
            .or(self.queue_item_id.as_deref())
    }

    /// Identifier used for per-item caps: first present of gear,
    /// service, lesson. Note the order differs from the key identifier.
    pub fn policy_item_id(&self) -> Option<&str> {
        self.gear_id
            .as_deref()
            .or(self.service_id.as_deref())
            .or(self.lesson_id.as_deref())
    }

    /// Subset match: every field present in `filter` must be equal here.
    pub fn matches(&self, filter: &EventMetadata) -> bool {
        fn field_matches(actual: &Option<String>, wanted: &Option<String>) -> bool {
            match wanted {
                Some(w) => actual.as_deref() == Some(w.as_str()),
                None => true,
            }
        }

        field_matches(&self.line_item_id, &filter.line_item_id)
            && field_matches(&self.lesson_id, &filter.lesson_id)
            && field_matches(&self.gear_id, &filter.gear_id)
            && field_matches(&self.service_id, &filter.service_id)
            && field_matches(&self.queue_item_id, &filter.queue_item_id)
            && filter
                .extra
                .iter()
                .all(|(k, v)| self.extra.get(k) == Some(v))
    }

    pub fn with_line_item(id: impl Into<String>) -> Self {
        Self {
            line_item_id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn with_gear(id: impl Into<String>) -> Self {
        Self {
            gear_id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn with_service(id: impl Into<String>) -> Self {
        Self {
            service_id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn with_queue_item(id: impl Into<String>) -> Self {
        Self {
            queue_item_id: Some(id.into()),
            ..Default::default()
        }
    }
}

/// A persisted notification event (one row in the event log)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub id: String,
    pub category: Category,
    /// Stable idempotency key: `category|item_identifier|YYYY-MM-DD`
    pub key: String,
    /// When this row was created
    pub scheduled_at: DateTime<Utc>,
    /// When the OS should fire the alarm (UTC)
    pub trigger_at: DateTime<Utc>,
    pub status: EventStatus,
    pub metadata: EventMetadata,
    /// Handle returned by the OS scheduler; required to cancel
    pub os_notification_id: Option<String>,
}

/// Outcome of a policy evaluation. Rejection is a value, not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyDecision {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl PolicyDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

/// Outcome of a service-layer send call
#[derive(Debug, Clone, PartialEq)]
pub struct SendOutcome {
    pub scheduled: bool,
    pub reason: Option<String>,
}

impl SendOutcome {
    pub fn ok() -> Self {
        Self {
            scheduled: true,
            reason: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            scheduled: false,
            reason: Some(reason.into()),
        }
    }
}
