//! Notification permission gateway

use async_trait::async_trait;
use cue_core::Result;
use tracing::debug;

/// OS notification permission, as a tri-state.
///
/// `Denied` means the user has not been asked yet; `Blocked` means the
/// OS refused before and a prompt would be silently ignored, so the
/// only way forward is a settings-app round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    Blocked,
}

/// Raw platform permission calls
#[async_trait]
pub trait PermissionBackend: Send + Sync {
    /// Query the current permission without prompting
    async fn status(&self) -> Result<PermissionStatus>;

    /// Show the native permission dialog and return the mapped result.
    /// Callers must not invoke this while the status is `Blocked`.
    async fn request(&self) -> Result<PermissionStatus>;
}

/// Gateway enforcing the prompt discipline on top of a backend:
/// short-circuit when granted, never re-prompt while blocked, at most
/// one native dialog otherwise.
pub struct PermissionGateway<B> {
    backend: B,
}

impl<B: PermissionBackend> PermissionGateway<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Current permission status, no prompting
    pub async fn status(&self) -> Result<PermissionStatus> {
        self.backend.status().await
    }

    /// Ensure permission is granted, prompting at most once
    pub async fn ensure_granted(&self) -> Result<PermissionStatus> {
        match self.backend.status().await? {
            PermissionStatus::Granted => Ok(PermissionStatus::Granted),
            PermissionStatus::Blocked => {
                // Prompting now would be silently refused by the OS
                debug!("Notification permission blocked, not prompting");
                Ok(PermissionStatus::Blocked)
            }
            PermissionStatus::Denied => self.backend.request().await,
        }
    }
}
