//! Engine configuration
//!
//! Tunables for trigger offsets and reconciliation, loaded from a TOML
//! file under the Cue home directory. User-facing settings (toggles,
//! volume caps) live in the database, not here.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::*;
use crate::error::Result;

/// Get the Cue home directory (`~/.cue`)
pub fn cue_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CUE_DIR)
}

/// Default engine config path (`~/.cue/engine.toml`)
pub fn engine_config_path() -> PathBuf {
    cue_home().join(CONFIG_FILE)
}

/// Default database path (`~/.cue/cue.db`)
pub fn database_path() -> PathBuf {
    cue_home().join(DB_FILE)
}

// Default value functions for serde
fn default_horizon_days() -> i64 {
    DEFAULT_HORIZON_DAYS
}

fn default_lesson_lead_minutes() -> i64 {
    DEFAULT_LESSON_LEAD_MINUTES
}

fn default_warranty_lead_days() -> i64 {
    DEFAULT_WARRANTY_LEAD_DAYS
}

fn default_service_pickup_lead_days() -> i64 {
    DEFAULT_SERVICE_PICKUP_LEAD_DAYS
}

fn default_receipt_ready_delay_secs() -> i64 {
    DEFAULT_RECEIPT_READY_DELAY_SECS
}

fn default_reengagement_delay_days() -> i64 {
    DEFAULT_REENGAGEMENT_DELAY_DAYS
}

fn default_gear_enrichment_delay_hours() -> i64 {
    DEFAULT_GEAR_ENRICHMENT_DELAY_HOURS
}

fn default_cooldown_scan_limit() -> i64 {
    DEFAULT_COOLDOWN_SCAN_LIMIT
}

/// Engine tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How far ahead reconciliation regenerates occurrences, in days
    #[serde(default = "default_horizon_days")]
    pub reconcile_horizon_days: i64,
    /// Lesson reminders fire this many minutes before the lesson
    #[serde(default = "default_lesson_lead_minutes")]
    pub lesson_lead_minutes: i64,
    /// Warranty reminders fire this many days before expiry
    #[serde(default = "default_warranty_lead_days")]
    pub warranty_lead_days: i64,
    /// Service pickup reminders fire this many days before pickup
    #[serde(default = "default_service_pickup_lead_days")]
    pub service_pickup_lead_days: i64,
    /// Receipt-ready notifications fire this many seconds after the call
    #[serde(default = "default_receipt_ready_delay_secs")]
    pub receipt_ready_delay_secs: i64,
    /// Re-engagement prompts fire this many days after last activity
    #[serde(default = "default_reengagement_delay_days")]
    pub reengagement_delay_days: i64,
    /// Gear enrichment prompts fire this many hours after the call
    #[serde(default = "default_gear_enrichment_delay_hours")]
    pub gear_enrichment_delay_hours: i64,
    /// How many recent events per category the cooldown lookup scans
    #[serde(default = "default_cooldown_scan_limit")]
    pub cooldown_scan_limit: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reconcile_horizon_days: DEFAULT_HORIZON_DAYS,
            lesson_lead_minutes: DEFAULT_LESSON_LEAD_MINUTES,
            warranty_lead_days: DEFAULT_WARRANTY_LEAD_DAYS,
            service_pickup_lead_days: DEFAULT_SERVICE_PICKUP_LEAD_DAYS,
            receipt_ready_delay_secs: DEFAULT_RECEIPT_READY_DELAY_SECS,
            reengagement_delay_days: DEFAULT_REENGAGEMENT_DELAY_DAYS,
            gear_enrichment_delay_hours: DEFAULT_GEAR_ENRICHMENT_DELAY_HOURS,
            cooldown_scan_limit: DEFAULT_COOLDOWN_SCAN_LIMIT,
        }
    }
}

impl EngineConfig {
    /// Load config from the default path
    pub fn load() -> Result<Self> {
        Self::load_from(&engine_config_path())
    }

    /// Load config from a specific path; missing file means defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("Engine config not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&content)?;

        debug!("Loaded engine config from {:?}", path);
        Ok(config)
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&engine_config_path())
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, &content)?;
        Ok(())
    }
}
