//! Settings repository - the singleton notification settings row

use cue_core::{
    Category, Error, NotificationSettings, Result, SettingsPatch, SETTINGS_ROW_ID,
};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Repository for the singleton settings row
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the settings, lazily creating the default row on first read
    pub async fn get(&self) -> Result<NotificationSettings> {
        let row = sqlx::query(
            "SELECT global_enabled, per_category_enabled, daily_limit, weekly_limit
             FROM notification_settings WHERE id = ?",
        )
        .bind(SETTINGS_ROW_ID)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::db(e.to_string()))?;

        match row {
            Some(row) => Ok(row_to_settings(&row)),
            None => {
                debug!("No settings row, creating defaults");
                let settings = NotificationSettings::default();
                self.write(&settings).await?;
                Ok(settings)
            }
        }
    }

    /// Apply a partial update and return the new settings
    pub async fn update(&self, patch: &SettingsPatch) -> Result<NotificationSettings> {
        let mut settings = self.get().await?;
        patch.apply(&mut settings);
        self.write(&settings).await?;
        Ok(settings)
    }

    async fn write(&self, settings: &NotificationSettings) -> Result<()> {
        let per_category_json = serde_json::to_string(&settings.per_category_enabled)?;

        sqlx::query(
            r#"
            INSERT INTO notification_settings (
                id, global_enabled, per_category_enabled, daily_limit, weekly_limit, updated_at
            ) VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(id) DO UPDATE SET
                global_enabled = excluded.global_enabled,
                per_category_enabled = excluded.per_category_enabled,
                daily_limit = excluded.daily_limit,
                weekly_limit = excluded.weekly_limit,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(SETTINGS_ROW_ID)
        .bind(settings.global_enabled)
        .bind(&per_category_json)
        .bind(settings.daily_limit)
        .bind(settings.weekly_limit)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::db(e.to_string()))?;

        Ok(())
    }
}

fn row_to_settings(row: &sqlx::sqlite::SqliteRow) -> NotificationSettings {
    let global_enabled: bool = row.get("global_enabled");
    let per_category_json: String = row.get("per_category_enabled");
    let daily_limit: i64 = row.get("daily_limit");
    let weekly_limit: i64 = row.get("weekly_limit");

    // Malformed toggle JSON degrades to "nothing enabled" rather than
    // failing every read.
    let per_category_enabled: HashMap<Category, bool> =
        serde_json::from_str(&per_category_json).unwrap_or_else(|e| {
            warn!("Malformed per-category toggles, treating as empty: {}", e);
            HashMap::new()
        });

    NotificationSettings {
        global_enabled,
        per_category_enabled,
        daily_limit,
        weekly_limit,
    }
}
