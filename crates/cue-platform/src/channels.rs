//! Delivery channel registrar
//!
//! Declares one OS-level channel per category on startup. Re-declaring
//! an existing channel is a harmless overwrite on every platform that
//! has a channel concept; platforms without one report `Unsupported`
//! and the registrar no-ops.

use async_trait::async_trait;
use cue_core::{Category, Result};
use tracing::debug;

/// Channel importance, mapped to the platform's own scale by backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelImportance {
    Low,
    Default,
    High,
}

/// Declaration of one delivery channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    /// Stable channel id (the category tag)
    pub id: &'static str,
    /// Human-readable channel name
    pub name: &'static str,
    pub importance: ChannelImportance,
    pub sound: bool,
}

/// The full set of channels, one per category
pub fn channel_specs() -> Vec<ChannelSpec> {
    Category::ALL
        .iter()
        .map(|category| spec_for(*category))
        .collect()
}

fn spec_for(category: Category) -> ChannelSpec {
    match category {
        Category::ReceiptReady => ChannelSpec {
            id: category.as_str(),
            name: "Receipt ready",
            importance: ChannelImportance::High,
            sound: true,
        },
        Category::Lessons => ChannelSpec {
            id: category.as_str(),
            name: "Lesson reminders",
            importance: ChannelImportance::High,
            sound: true,
        },
        Category::GearEnrichment => ChannelSpec {
            id: category.as_str(),
            name: "Gear suggestions",
            importance: ChannelImportance::Default,
            sound: false,
        },
        Category::Warranty => ChannelSpec {
            id: category.as_str(),
            name: "Warranty reminders",
            importance: ChannelImportance::Default,
            sound: false,
        },
        Category::Maintenance => ChannelSpec {
            id: category.as_str(),
            name: "Maintenance reminders",
            importance: ChannelImportance::Default,
            sound: false,
        },
        Category::Reengagement => ChannelSpec {
            id: category.as_str(),
            name: "Tips and updates",
            importance: ChannelImportance::Low,
            sound: false,
        },
        Category::Service => ChannelSpec {
            id: category.as_str(),
            name: "Service reminders",
            importance: ChannelImportance::High,
            sound: true,
        },
    }
}

/// Whether the platform has a channel concept at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelCapability {
    Supported,
    Unsupported,
}

/// Raw platform channel calls
#[async_trait]
pub trait ChannelBackend: Send + Sync {
    fn capability(&self) -> ChannelCapability;

    /// Declare (or overwrite) a channel
    async fn declare(&self, spec: &ChannelSpec) -> Result<()>;
}

/// Registrar that declares every category channel, idempotently
pub struct ChannelRegistrar<B> {
    backend: B,
}

impl<B: ChannelBackend> ChannelRegistrar<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Declare all channels. Safe to call on every app start.
    pub async fn initialize(&self) -> Result<()> {
        if self.backend.capability() == ChannelCapability::Unsupported {
            debug!("Platform has no channel concept, skipping registration");
            return Ok(());
        }

        for spec in channel_specs() {
            self.backend.declare(&spec).await?;
        }
        debug!("Registered {} notification channels", Category::ALL.len());
        Ok(())
    }
}
