//! OS alarm scheduling seam

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cue_core::{Category, Result};

/// Opaque payload carried by a scheduled alarm. The deep link and data
/// map are handed back to the host app's router when the user taps the
/// notification; the engine never resolves them.
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmPayload {
    pub title: String,
    pub body: String,
    pub category: Category,
    pub deep_link: String,
    pub data: serde_json::Value,
}

/// Platform alarm scheduling.
///
/// Implementations bind to the OS local-notification API. `cancel` of a
/// handle the OS no longer knows about must return `Ok` - cancellation
/// is best-effort at the application level.
#[async_trait]
pub trait AlarmBackend: Send + Sync {
    /// Register an alarm to fire at `when`, returning the OS handle
    async fn schedule_at(&self, when: DateTime<Utc>, payload: AlarmPayload) -> Result<String>;

    /// Cancel a previously scheduled alarm by handle
    async fn cancel(&self, handle: &str) -> Result<()>;
}
