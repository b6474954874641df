//! Database schema for the Cue event store

/// SQLite schema initialization
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS notification_settings (
    id TEXT PRIMARY KEY,
    global_enabled INTEGER NOT NULL DEFAULT 1,
    per_category_enabled TEXT NOT NULL DEFAULT '{}',
    daily_limit INTEGER NOT NULL DEFAULT 5,
    weekly_limit INTEGER NOT NULL DEFAULT 15,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS notification_events (
    id TEXT PRIMARY KEY,
    category TEXT NOT NULL,
    key TEXT NOT NULL UNIQUE,
    scheduled_at TEXT NOT NULL,
    trigger_at TEXT NOT NULL,
    status TEXT NOT NULL,
    metadata TEXT NOT NULL DEFAULT '{}',
    os_notification_id TEXT
);

CREATE INDEX IF NOT EXISTS idx_events_category ON notification_events(category);
CREATE INDEX IF NOT EXISTS idx_events_trigger_at ON notification_events(trigger_at);
CREATE INDEX IF NOT EXISTS idx_events_status ON notification_events(status);
"#;
