//! Reconciler - rebuilds the notification schedule from domain data
//!
//! Domain data (lessons, gear, services) is the source of truth; OS
//! alarms and the event log are a disposable cache. After a backup
//! restore or reinstall the two can disagree, so on app start the
//! reconciler re-derives the desired schedule and garbage-collects
//! events whose domain items no longer exist. Idempotent scheduling
//! makes the whole pass safe to repeat, or to race with a user saving
//! a new lesson.

use chrono::{Duration, Utc};
use cue_core::{Category, EngineConfig, EventStatus, Result};
use cue_db::Database;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::{build_chains, LessonSource};
use crate::scheduler::Scheduler;
use crate::service::NotificationService;

/// Counters from one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Occurrences handed to the service layer that came back scheduled
    pub scheduled: u64,
    /// Occurrences rejected (past trigger, policy, idempotent no-ops
    /// still count as scheduled)
    pub skipped: u64,
    /// Orphaned or stale events cancelled
    pub cancelled: u64,
}

/// Rebuilds desired notification state from domain repositories
pub struct Reconciler {
    db: Database,
    service: NotificationService,
    scheduler: Scheduler,
    lessons: Arc<dyn LessonSource>,
    config: EngineConfig,
}

impl Reconciler {
    pub fn new(
        db: Database,
        service: NotificationService,
        scheduler: Scheduler,
        lessons: Arc<dyn LessonSource>,
        config: EngineConfig,
    ) -> Self {
        Self {
            db,
            service,
            scheduler,
            lessons,
            config,
        }
    }

    /// Re-derive the full schedule for every enabled category with a
    /// domain-driven source. A failure in one category is logged and
    /// does not stop the others, nor app start.
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let settings = self.db.settings().get().await?;
        if !settings.global_enabled {
            debug!("Notifications globally disabled, skipping reconciliation");
            return Ok(ReconcileReport::default());
        }

        let mut report = ReconcileReport::default();

        if settings.category_enabled(Category::Lessons) {
            if let Err(e) = self.reconcile_lessons(&mut report).await {
                warn!(category = %Category::Lessons, "Reconciliation failed: {}", e);
            }
        }

        info!(
            scheduled = report.scheduled,
            skipped = report.skipped,
            cancelled = report.cancelled,
            "Reconciliation complete"
        );
        Ok(report)
    }

    /// Regenerate lesson reminders within the horizon, then cancel
    /// events whose line items have disappeared.
    async fn reconcile_lessons(&self, report: &mut ReconcileReport) -> Result<()> {
        let items = self.lessons.get_all_with_items().await?;
        let chains = build_chains(&items);
        let horizon = Utc::now() + Duration::days(self.config.reconcile_horizon_days);

        for chain in &chains {
            for occurrence in &chain.occurrences {
                if occurrence.starts_at > horizon {
                    continue;
                }
                // Past occurrences are rejected by the service layer
                let outcome = self.service.send_lesson_reminder(occurrence).await;
                if outcome.scheduled {
                    report.scheduled += 1;
                } else {
                    report.skipped += 1;
                }
            }
        }

        // Garbage-collect events pointing at deleted line items
        for event in self.db.events().get_by_category(Category::Lessons).await? {
            if event.status != EventStatus::Scheduled {
                continue;
            }
            let alive = match event.metadata.line_item_id.as_deref() {
                Some(id) => self.lessons.get_line_item_by_id(id).await?.is_some(),
                None => false,
            };
            if !alive {
                debug!(key = %event.key, "Line item gone, cancelling orphaned event");
                self.scheduler.cancel_by_key(&event.key).await?;
                report.cancelled += 1;
            }
        }

        Ok(())
    }

    /// Cancel any scheduled event whose trigger time has already
    /// passed without an observed delivery. Missed alarms are treated
    /// as stale rather than left claiming to be scheduled.
    pub async fn cleanup_stale(&self) -> Result<u64> {
        let now = Utc::now();
        let past = self
            .db
            .events()
            .get_in_range(chrono::DateTime::UNIX_EPOCH, now, None)
            .await?;

        let mut cancelled = 0u64;
        for event in past {
            if event.status == EventStatus::Scheduled {
                self.scheduler.cancel_by_key(&event.key).await?;
                cancelled += 1;
            }
        }

        if cancelled > 0 {
            info!(cancelled, "Cleaned up stale notifications");
        }
        Ok(cancelled)
    }
}
