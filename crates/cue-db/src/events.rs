//! Events repository - the append-mostly notification event log

use chrono::{DateTime, Utc};
use cue_core::{Category, Error, EventMetadata, EventStatus, NotificationEvent, Result};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use tracing::warn;

use crate::{fmt_ts, parse_ts};

const EVENT_COLUMNS: &str =
    "id, category, key, scheduled_at, trigger_at, status, metadata, os_notification_id";

/// Repository for notification events, unique on the idempotency key
pub struct EventsRepository {
    pool: SqlitePool,
}

impl EventsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new event. Fails if the key already exists.
    pub async fn insert(&self, event: &NotificationEvent) -> Result<String> {
        let metadata_json = serde_json::to_string(&event.metadata)?;

        sqlx::query(
            r#"
            INSERT INTO notification_events (
                id, category, key, scheduled_at, trigger_at, status, metadata, os_notification_id
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.id)
        .bind(event.category.as_str())
        .bind(&event.key)
        .bind(fmt_ts(event.scheduled_at))
        .bind(fmt_ts(event.trigger_at))
        .bind(event.status.as_str())
        .bind(&metadata_json)
        .bind(&event.os_notification_id)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::db(e.to_string()))?;

        Ok(event.id.clone())
    }

    /// Insert or, when the key already exists, replace the row's
    /// schedule fields. This is what makes rescheduling idempotent.
    pub async fn upsert(&self, event: &NotificationEvent) -> Result<String> {
        let metadata_json = serde_json::to_string(&event.metadata)?;

        sqlx::query(
            r#"
            INSERT INTO notification_events (
                id, category, key, scheduled_at, trigger_at, status, metadata, os_notification_id
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                scheduled_at = excluded.scheduled_at,
                trigger_at = excluded.trigger_at,
                status = excluded.status,
                metadata = excluded.metadata,
                os_notification_id = excluded.os_notification_id
            "#,
        )
        .bind(&event.id)
        .bind(event.category.as_str())
        .bind(&event.key)
        .bind(fmt_ts(event.scheduled_at))
        .bind(fmt_ts(event.trigger_at))
        .bind(event.status.as_str())
        .bind(&metadata_json)
        .bind(&event.os_notification_id)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::db(e.to_string()))?;

        Ok(event.id.clone())
    }

    /// Get an event by its idempotency key
    pub async fn get_by_key(&self, key: &str) -> Result<Option<NotificationEvent>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM notification_events WHERE key = ?",
            EVENT_COLUMNS
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::db(e.to_string()))?;

        match row {
            Some(row) => Ok(Some(row_to_event(&row)?)),
            None => Ok(None),
        }
    }

    /// Update an event's status, and its OS handle when one is provided
    pub async fn update_status(
        &self,
        key: &str,
        status: EventStatus,
        os_notification_id: Option<&str>,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE notification_events
            SET status = ?, os_notification_id = COALESCE(?, os_notification_id)
            WHERE key = ?
            "#,
        )
        .bind(status.as_str())
        .bind(os_notification_id)
        .bind(key)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::db(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(Error::EventNotFound(key.to_string()));
        }
        Ok(())
    }

    /// Get all events in a category, most recent trigger first
    pub async fn get_by_category(&self, category: Category) -> Result<Vec<NotificationEvent>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM notification_events WHERE category = ? ORDER BY trigger_at DESC",
            EVENT_COLUMNS
        ))
        .bind(category.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::db(e.to_string()))?;

        rows.iter().map(row_to_event).collect()
    }

    /// Get events with `trigger_at` inside the inclusive range,
    /// optionally restricted to one category. Used for rate-limit
    /// window queries.
    pub async fn get_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        category: Option<Category>,
    ) -> Result<Vec<NotificationEvent>> {
        let rows = match category {
            Some(category) => {
                sqlx::query(&format!(
                    "SELECT {} FROM notification_events
                     WHERE trigger_at >= ? AND trigger_at <= ? AND category = ?
                     ORDER BY trigger_at",
                    EVENT_COLUMNS
                ))
                .bind(fmt_ts(start))
                .bind(fmt_ts(end))
                .bind(category.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {} FROM notification_events
                     WHERE trigger_at >= ? AND trigger_at <= ?
                     ORDER BY trigger_at",
                    EVENT_COLUMNS
                ))
                .bind(fmt_ts(start))
                .bind(fmt_ts(end))
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| Error::db(e.to_string()))?;

        rows.iter().map(row_to_event).collect()
    }

    /// Most recent event (by trigger time) in a category whose metadata
    /// matches the filter subset. Scans a bounded recent window and
    /// filters in memory; an accepted precision/performance tradeoff
    /// for cooldown checks.
    pub async fn latest_matching(
        &self,
        category: Category,
        filter: Option<&EventMetadata>,
        scan_limit: i64,
    ) -> Result<Option<NotificationEvent>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM notification_events
             WHERE category = ? ORDER BY trigger_at DESC LIMIT ?",
            EVENT_COLUMNS
        ))
        .bind(category.as_str())
        .bind(scan_limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::db(e.to_string()))?;

        for row in &rows {
            let event = row_to_event(row)?;
            let matched = match filter {
                Some(filter) => event.metadata.matches(filter),
                None => true,
            };
            if matched {
                return Ok(Some(event));
            }
        }
        Ok(None)
    }

    /// Delete an event by key, returning whether a row existed
    pub async fn delete_by_key(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notification_events WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::db(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> Result<NotificationEvent> {
    let id: String = row.get("id");
    let category_str: String = row.get("category");
    let key: String = row.get("key");
    let scheduled_at_str: String = row.get("scheduled_at");
    let trigger_at_str: String = row.get("trigger_at");
    let status_str: String = row.get("status");
    let metadata_json: String = row.get("metadata");
    let os_notification_id: Option<String> = row.get("os_notification_id");

    let category: Category = category_str.parse()?;
    let status: EventStatus = status_str.parse()?;
    let scheduled_at = parse_ts(&scheduled_at_str)?;
    let trigger_at = parse_ts(&trigger_at_str)?;

    // Malformed metadata degrades to empty so one bad row cannot break
    // a reconciliation pass.
    let metadata: EventMetadata = serde_json::from_str(&metadata_json).unwrap_or_else(|e| {
        warn!(key = %key, "Malformed event metadata, treating as empty: {}", e);
        EventMetadata::default()
    });

    Ok(NotificationEvent {
        id,
        category,
        key,
        scheduled_at,
        trigger_at,
        status,
        metadata,
        os_notification_id,
    })
}
