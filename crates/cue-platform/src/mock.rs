//! In-memory platform backends for tests

use crate::alarm::{AlarmBackend, AlarmPayload};
use crate::channels::{ChannelBackend, ChannelCapability, ChannelSpec};
use crate::permission::{PermissionBackend, PermissionStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cue_core::{Error, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Mock alarm backend that records live alarms keyed by handle
#[derive(Default, Clone)]
pub struct MockAlarms {
    alarms: Arc<Mutex<HashMap<String, (DateTime<Utc>, AlarmPayload)>>>,
    schedule_calls: Arc<AtomicUsize>,
    cancel_calls: Arc<AtomicUsize>,
    should_fail: bool,
}

impl MockAlarms {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that fails every schedule call, for testing the
    /// service-layer downgrade path
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    /// Number of currently live alarms
    pub async fn live_count(&self) -> usize {
        self.alarms.lock().await.len()
    }

    /// Snapshot of live alarms
    pub async fn live(&self) -> Vec<(String, DateTime<Utc>, AlarmPayload)> {
        self.alarms
            .lock()
            .await
            .iter()
            .map(|(handle, (when, payload))| (handle.clone(), *when, payload.clone()))
            .collect()
    }

    pub async fn contains(&self, handle: &str) -> bool {
        self.alarms.lock().await.contains_key(handle)
    }

    pub fn schedule_calls(&self) -> usize {
        self.schedule_calls.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AlarmBackend for MockAlarms {
    async fn schedule_at(&self, when: DateTime<Utc>, payload: AlarmPayload) -> Result<String> {
        self.schedule_calls.fetch_add(1, Ordering::SeqCst);

        if self.should_fail {
            return Err(Error::platform("Mock scheduling failure"));
        }

        let handle = Uuid::new_v4().to_string();
        self.alarms
            .lock()
            .await
            .insert(handle.clone(), (when, payload));
        Ok(handle)
    }

    async fn cancel(&self, handle: &str) -> Result<()> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);

        // An alarm the OS no longer knows about is not an error
        self.alarms.lock().await.remove(handle);
        Ok(())
    }
}

/// Mock permission backend with a scripted prompt result
pub struct MockPermissions {
    status: Mutex<PermissionStatus>,
    request_result: PermissionStatus,
    prompt_count: AtomicUsize,
}

impl MockPermissions {
    pub fn new(status: PermissionStatus) -> Self {
        Self {
            status: Mutex::new(status),
            request_result: PermissionStatus::Denied,
            prompt_count: AtomicUsize::new(0),
        }
    }

    /// What the native dialog will answer
    pub fn with_request_result(mut self, result: PermissionStatus) -> Self {
        self.request_result = result;
        self
    }

    /// How many native dialogs were shown
    pub fn prompt_count(&self) -> usize {
        self.prompt_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionBackend for MockPermissions {
    async fn status(&self) -> Result<PermissionStatus> {
        Ok(*self.status.lock().await)
    }

    async fn request(&self) -> Result<PermissionStatus> {
        self.prompt_count.fetch_add(1, Ordering::SeqCst);
        *self.status.lock().await = self.request_result;
        Ok(self.request_result)
    }
}

/// Mock channel backend recording every declaration
pub struct MockChannels {
    declared: Mutex<Vec<ChannelSpec>>,
    capability: ChannelCapability,
}

impl MockChannels {
    pub fn new() -> Self {
        Self {
            declared: Mutex::new(Vec::new()),
            capability: ChannelCapability::Supported,
        }
    }

    /// A platform without a channel concept
    pub fn unsupported() -> Self {
        Self {
            declared: Mutex::new(Vec::new()),
            capability: ChannelCapability::Unsupported,
        }
    }

    pub async fn declared(&self) -> Vec<ChannelSpec> {
        self.declared.lock().await.clone()
    }
}

impl Default for MockChannels {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChannelBackend for MockChannels {
    fn capability(&self) -> ChannelCapability {
        self.capability
    }

    async fn declare(&self, spec: &ChannelSpec) -> Result<()> {
        self.declared.lock().await.push(spec.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cue_core::Category;

    fn payload() -> AlarmPayload {
        AlarmPayload {
            title: "Upcoming lesson".to_string(),
            body: "Guitar with Sam".to_string(),
            category: Category::Lessons,
            deep_link: "cue://education/li-1".to_string(),
            data: serde_json::json!({"line_item_id": "li-1"}),
        }
    }

    #[tokio::test]
    async fn test_mock_alarms_schedule_and_cancel() {
        let alarms = MockAlarms::new();
        let handle = alarms.schedule_at(Utc::now(), payload()).await.unwrap();

        assert_eq!(alarms.live_count().await, 1);
        assert!(alarms.contains(&handle).await);

        alarms.cancel(&handle).await.unwrap();
        assert_eq!(alarms.live_count().await, 0);

        // Cancelling an unknown handle is fine
        alarms.cancel("gone").await.unwrap();
        assert_eq!(alarms.cancel_calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_alarms_failing() {
        let alarms = MockAlarms::failing();
        assert!(alarms.schedule_at(Utc::now(), payload()).await.is_err());
        assert_eq!(alarms.live_count().await, 0);
        assert_eq!(alarms.schedule_calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_permissions_prompt_updates_status() {
        let perms =
            MockPermissions::new(PermissionStatus::Denied).with_request_result(PermissionStatus::Granted);

        assert_eq!(perms.status().await.unwrap(), PermissionStatus::Denied);
        assert_eq!(perms.request().await.unwrap(), PermissionStatus::Granted);
        assert_eq!(perms.status().await.unwrap(), PermissionStatus::Granted);
        assert_eq!(perms.prompt_count(), 1);
    }
}
