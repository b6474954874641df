//! Scheduler - turns allowed notification requests into OS alarms
//!
//! Guarantees at most one live OS alarm per idempotency key. Scheduling
//! the same logical notification twice is a no-op; scheduling it with a
//! new trigger time cancels the old alarm first.

use chrono::{DateTime, SubsecRound, Utc};
use cue_core::{
    Category, EventMetadata, EventStatus, NotificationEvent, Result, UNKNOWN_ITEM,
};
use cue_db::Database;
use cue_platform::{AlarmBackend, AlarmPayload};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Deterministic idempotency key: `category|item_identifier|YYYY-MM-DD`
pub fn generate_key(
    category: Category,
    metadata: &EventMetadata,
    trigger_at: DateTime<Utc>,
) -> String {
    format!(
        "{}|{}|{}",
        category.as_str(),
        metadata.item_identifier().unwrap_or(UNKNOWN_ITEM),
        trigger_at.format("%Y-%m-%d")
    )
}

/// A fully built notification ready for scheduling
#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    pub category: Category,
    pub title: String,
    pub body: String,
    pub trigger_at: DateTime<Utc>,
    pub deep_link: String,
    pub metadata: EventMetadata,
}

/// Schedules and cancels notification events against the store and the
/// platform alarm backend. Sole writer of event status and OS handles.
#[derive(Clone)]
pub struct Scheduler {
    db: Database,
    alarms: Arc<dyn AlarmBackend>,
}

impl Scheduler {
    pub fn new(db: Database, alarms: Arc<dyn AlarmBackend>) -> Self {
        Self { db, alarms }
    }

    /// Schedule a notification, idempotently. Returns the stored event.
    pub async fn schedule(&self, request: ScheduleRequest) -> Result<NotificationEvent> {
        // Truncate to the store's millisecond precision so trigger
        // comparisons against persisted rows are exact.
        let trigger_at = request.trigger_at.trunc_subsecs(3);
        let key = generate_key(request.category, &request.metadata, trigger_at);
        let events = self.db.events();

        if let Some(existing) = events.get_by_key(&key).await? {
            if existing.status == EventStatus::Scheduled {
                if existing.trigger_at == trigger_at {
                    debug!(key = %key, "Already scheduled, nothing to do");
                    return Ok(existing);
                }
                // Reschedule: drop the old alarm before booking the new one
                if let Some(handle) = &existing.os_notification_id {
                    self.alarms.cancel(handle).await?;
                    debug!(key = %key, "Cancelled stale alarm for reschedule");
                }
            }
        }

        let payload = AlarmPayload {
            title: request.title.clone(),
            body: request.body.clone(),
            category: request.category,
            deep_link: request.deep_link.clone(),
            data: serde_json::to_value(&request.metadata)?,
        };
        let handle = self.alarms.schedule_at(trigger_at, payload).await?;

        let event = NotificationEvent {
            id: Uuid::new_v4().to_string(),
            category: request.category,
            key: key.clone(),
            scheduled_at: Utc::now(),
            trigger_at,
            status: EventStatus::Scheduled,
            metadata: request.metadata,
            os_notification_id: Some(handle),
        };
        events.upsert(&event).await?;

        info!(key = %key, category = %request.category, trigger_at = %trigger_at, "Notification scheduled");
        Ok(event)
    }

    /// Cancel one event by key. Idempotent; a missing event or an
    /// already-gone OS alarm is not an error.
    pub async fn cancel_by_key(&self, key: &str) -> Result<()> {
        let events = self.db.events();

        let event = match events.get_by_key(key).await? {
            Some(event) => event,
            None => {
                debug!(key = %key, "No event to cancel");
                return Ok(());
            }
        };

        // Cancel the alarm before the status transition so a cancelled
        // row never points at a live alarm.
        if let Some(handle) = &event.os_notification_id {
            if let Err(e) = self.alarms.cancel(handle).await {
                warn!(key = %key, "OS alarm cancellation failed, marking cancelled anyway: {}", e);
            }
        }
        events
            .update_status(key, EventStatus::Cancelled, None)
            .await?;

        info!(key = %key, "Notification cancelled");
        Ok(())
    }

    /// Cancel every currently-scheduled event in a category. Returns
    /// the number of events cancelled.
    pub async fn cancel_by_category(&self, category: Category) -> Result<u64> {
        let events = self.db.events().get_by_category(category).await?;

        let mut cancelled = 0u64;
        for event in events {
            if event.status == EventStatus::Scheduled {
                self.cancel_by_key(&event.key).await?;
                cancelled += 1;
            }
        }

        if cancelled > 0 {
            info!(category = %category, cancelled, "Cancelled category notifications");
        }
        Ok(cancelled)
    }
}
