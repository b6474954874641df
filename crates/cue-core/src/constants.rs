//! Constants and default values for Cue

/// Default Cue home directory name
pub const CUE_DIR: &str = ".cue";

/// Default database file name
pub const DB_FILE: &str = "cue.db";

/// Default engine config file name
pub const CONFIG_FILE: &str = "engine.toml";

/// Row id of the singleton settings row
pub const SETTINGS_ROW_ID: &str = "default";

/// Item identifier used in idempotency keys when no identifier is present
pub const UNKNOWN_ITEM: &str = "unknown";

/// URI scheme for deep links attached to notification payloads
pub const DEEP_LINK_SCHEME: &str = "cue";

/// Default daily cap on non-critical notifications
pub const DEFAULT_DAILY_LIMIT: i64 = 5;

/// Default weekly cap on non-critical notifications
pub const DEFAULT_WEEKLY_LIMIT: i64 = 15;

/// Default horizon for regenerating future occurrences during reconciliation
pub const DEFAULT_HORIZON_DAYS: i64 = 30;

/// Default lead time for lesson reminders, in minutes before the lesson
pub const DEFAULT_LESSON_LEAD_MINUTES: i64 = 60;

/// Default lead time for warranty reminders, in days before expiry
pub const DEFAULT_WARRANTY_LEAD_DAYS: i64 = 30;

/// Default lead time for service pickup reminders, in days before pickup
pub const DEFAULT_SERVICE_PICKUP_LEAD_DAYS: i64 = 1;

/// Default delay before a receipt-ready notification fires.
/// Kept slightly in the future so the OS accepts it as a scheduled
/// alarm rather than an instantaneous one.
pub const DEFAULT_RECEIPT_READY_DELAY_SECS: i64 = 2;

/// Default delay after last activity before a re-engagement prompt fires
pub const DEFAULT_REENGAGEMENT_DELAY_DAYS: i64 = 21;

/// Default delay before a gear enrichment prompt fires
pub const DEFAULT_GEAR_ENRICHMENT_DELAY_HOURS: i64 = 1;

/// How many recent events per category the cooldown lookup scans
pub const DEFAULT_COOLDOWN_SCAN_LIMIT: i64 = 100;
