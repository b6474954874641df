//! Policy engine - decides whether a candidate notification may fire
//!
//! Checks run in a fixed order and short-circuit on the first failure:
//! global toggle, category toggle, daily/weekly caps (skipped for
//! critical priority), category cooldown, per-item cap. Rejections are
//! values, never errors.

use chrono::{DateTime, Duration, Local, NaiveTime, Utc};
use cue_core::{
    rule_for, Category, EngineConfig, EventMetadata, PolicyDecision, Priority, Result,
};
use cue_db::Database;
use tracing::debug;

/// A notification being considered for scheduling
#[derive(Debug, Clone)]
pub struct CandidateNotification {
    pub metadata: EventMetadata,
    pub trigger_at: DateTime<Utc>,
    pub priority: Priority,
}

/// Policy evaluation over stored settings and the event log
#[derive(Clone)]
pub struct PolicyEngine {
    db: Database,
    config: EngineConfig,
}

/// UTC bounds of the local calendar day containing `now`, inclusive
fn local_day_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let midnight = now
        .with_timezone(&Local)
        .date_naive()
        .and_time(NaiveTime::MIN);
    let start = midnight
        .and_local_timezone(Local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        // Midnight skipped by a DST transition; fall back to 24h ago
        .unwrap_or_else(|| now - Duration::days(1));
    let end = start + Duration::days(1) - Duration::milliseconds(1);
    (start, end)
}

impl PolicyEngine {
    pub fn new(db: Database, config: EngineConfig) -> Self {
        Self { db, config }
    }

    /// Evaluate whether `candidate` may be scheduled in `category`
    pub async fn can_send(
        &self,
        category: Category,
        candidate: &CandidateNotification,
    ) -> Result<PolicyDecision> {
        let settings = self.db.settings().get().await?;

        if !settings.global_enabled {
            return Ok(PolicyDecision::reject("Global notifications disabled"));
        }
        if !settings.category_enabled(category) {
            return Ok(PolicyDecision::reject(format!(
                "Category {} disabled",
                category
            )));
        }

        let rule = rule_for(category);
        let critical = candidate.priority == Priority::Critical || rule.always_critical;

        if !critical {
            if let Some(decision) = self.check_volume_caps(&settings).await? {
                return Ok(decision);
            }
        }

        if rule.cooldown_days > 0 {
            if let Some(previous) = self
                .db
                .events()
                .latest_matching(category, Some(&candidate.metadata), self.config.cooldown_scan_limit)
                .await?
            {
                let elapsed = (candidate.trigger_at - previous.trigger_at).num_days();
                if elapsed < rule.cooldown_days {
                    return Ok(PolicyDecision::reject(format!(
                        "Cooldown active for {}: {} of {} days elapsed",
                        category, elapsed, rule.cooldown_days
                    )));
                }
            }
        }

        if let Some(cap) = rule.max_per_item {
            if let Some(decision) = self.check_per_item_cap(category, candidate, cap).await? {
                return Ok(decision);
            }
        }

        debug!(category = %category, "Policy allows notification");
        Ok(PolicyDecision::allow())
    }

    /// Daily cap on today's local calendar day, then weekly cap on the
    /// trailing 7-day window ending today. Counts scheduled and
    /// delivered events across all categories.
    async fn check_volume_caps(
        &self,
        settings: &cue_core::NotificationSettings,
    ) -> Result<Option<PolicyDecision>> {
        let (day_start, day_end) = local_day_bounds(Utc::now());

        let todays = self.db.events().get_in_range(day_start, day_end, None).await?;
        let daily_count = todays
            .iter()
            .filter(|e| e.status.counts_toward_limits())
            .count() as i64;
        if daily_count >= settings.daily_limit {
            return Ok(Some(PolicyDecision::reject(format!(
                "Daily limit reached ({}/{})",
                daily_count, settings.daily_limit
            ))));
        }

        let week_start = day_start - Duration::days(6);
        let weeks = self.db.events().get_in_range(week_start, day_end, None).await?;
        let weekly_count = weeks
            .iter()
            .filter(|e| e.status.counts_toward_limits())
            .count() as i64;
        if weekly_count >= settings.weekly_limit {
            return Ok(Some(PolicyDecision::reject(format!(
                "Weekly limit reached ({}/{})",
                weekly_count, settings.weekly_limit
            ))));
        }

        Ok(None)
    }

    async fn check_per_item_cap(
        &self,
        category: Category,
        candidate: &CandidateNotification,
        cap: i64,
    ) -> Result<Option<PolicyDecision>> {
        let item_id = match candidate.metadata.policy_item_id() {
            Some(id) => id,
            None => return Ok(None),
        };

        let events = self.db.events().get_by_category(category).await?;
        let count = events
            .iter()
            .filter(|e| {
                e.status.counts_toward_limits() && e.metadata.policy_item_id() == Some(item_id)
            })
            .count() as i64;

        if count >= cap {
            return Ok(Some(PolicyDecision::reject(format!(
                "Per-item limit reached {}/{}",
                count, cap
            ))));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cue_core::{EventStatus, NotificationEvent, SettingsPatch};
    use tempfile::{tempdir, TempDir};
    use uuid::Uuid;

    async fn setup() -> (PolicyEngine, Database, TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::new(&dir.path().join("test.db")).await.unwrap();
        let engine = PolicyEngine::new(db.clone(), EngineConfig::default());
        (engine, db, dir)
    }

    fn candidate(metadata: EventMetadata, trigger_at: DateTime<Utc>) -> CandidateNotification {
        CandidateNotification {
            metadata,
            trigger_at,
            priority: Priority::Normal,
        }
    }

    async fn seed_event(
        db: &Database,
        category: Category,
        key: &str,
        trigger_at: DateTime<Utc>,
        metadata: EventMetadata,
    ) {
        let event = NotificationEvent {
            id: Uuid::new_v4().to_string(),
            category,
            key: key.to_string(),
            scheduled_at: Utc::now(),
            trigger_at,
            status: EventStatus::Scheduled,
            metadata,
            os_notification_id: Some("os".to_string()),
        };
        db.events().insert(&event).await.unwrap();
    }

    #[tokio::test]
    async fn test_global_disabled_rejects_everything() {
        let (engine, db, _dir) = setup().await;
        db.settings()
            .update(&SettingsPatch::global(false))
            .await
            .unwrap();

        for category in Category::ALL {
            let decision = engine
                .can_send(category, &candidate(EventMetadata::default(), Utc::now()))
                .await
                .unwrap();
            assert!(!decision.allowed);
            assert_eq!(
                decision.reason.as_deref(),
                Some("Global notifications disabled")
            );
        }
    }

    #[tokio::test]
    async fn test_category_disabled_rejects() {
        let (engine, db, _dir) = setup().await;
        db.settings()
            .update(&SettingsPatch::category(Category::Warranty, false))
            .await
            .unwrap();

        let decision = engine
            .can_send(
                Category::Warranty,
                &candidate(EventMetadata::with_gear("g1"), Utc::now()),
            )
            .await
            .unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.reason.as_deref(), Some("Category warranty disabled"));
    }

    #[tokio::test]
    async fn test_daily_limit() {
        let (engine, db, _dir) = setup().await;
        db.settings()
            .update(&SettingsPatch {
                daily_limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();

        // Two events triggering within minutes of now stay inside
        // today's local day.
        let now = Utc::now();
        for i in 0..2 {
            seed_event(
                &db,
                Category::Maintenance,
                &format!("maintenance|m{}|2026-08-30", i),
                now + Duration::minutes(i),
                EventMetadata::with_gear(format!("m{}", i)),
            )
            .await;
        }

        let decision = engine
            .can_send(
                Category::Maintenance,
                &candidate(EventMetadata::with_gear("m9"), now + Duration::minutes(30)),
            )
            .await
            .unwrap();
        assert!(!decision.allowed);
        assert!(decision.reason.unwrap().starts_with("Daily limit reached"));
    }

    #[tokio::test]
    async fn test_weekly_limit() {
        let (engine, db, _dir) = setup().await;
        db.settings()
            .update(&SettingsPatch {
                daily_limit: Some(100),
                weekly_limit: Some(3),
                ..Default::default()
            })
            .await
            .unwrap();

        let now = Utc::now();
        for i in 1..=3i64 {
            seed_event(
                &db,
                Category::Maintenance,
                &format!("maintenance|m{}|2026-08-2{}", i, i),
                now - Duration::days(i),
                EventMetadata::with_gear(format!("m{}", i)),
            )
            .await;
        }

        let decision = engine
            .can_send(
                Category::Maintenance,
                &candidate(EventMetadata::with_gear("m9"), now + Duration::minutes(5)),
            )
            .await
            .unwrap();
        assert!(!decision.allowed);
        assert!(decision.reason.unwrap().starts_with("Weekly limit reached"));
    }

    #[tokio::test]
    async fn test_critical_priority_bypasses_caps() {
        let (engine, db, _dir) = setup().await;
        db.settings()
            .update(&SettingsPatch {
                daily_limit: Some(0),
                weekly_limit: Some(0),
                ..Default::default()
            })
            .await
            .unwrap();

        // receipt_ready is always critical
        let decision = engine
            .can_send(
                Category::ReceiptReady,
                &candidate(EventMetadata::with_queue_item("q1"), Utc::now()),
            )
            .await
            .unwrap();
        assert!(decision.allowed);

        // Explicit critical priority also bypasses
        let c = CandidateNotification {
            metadata: EventMetadata::default(),
            trigger_at: Utc::now(),
            priority: Priority::Critical,
        };
        assert!(engine.can_send(Category::Lessons, &c).await.unwrap().allowed);

        // But caps still apply to normal priority
        let decision = engine
            .can_send(
                Category::Lessons,
                &candidate(EventMetadata::default(), Utc::now()),
            )
            .await
            .unwrap();
        assert!(!decision.allowed);
    }

    #[tokio::test]
    async fn test_critical_still_respects_toggles() {
        let (engine, db, _dir) = setup().await;
        db.settings()
            .update(&SettingsPatch::category(Category::ReceiptReady, false))
            .await
            .unwrap();

        let decision = engine
            .can_send(
                Category::ReceiptReady,
                &candidate(EventMetadata::with_queue_item("q1"), Utc::now()),
            )
            .await
            .unwrap();
        assert!(!decision.allowed);
    }

    #[tokio::test]
    async fn test_cooldown_boundary() {
        let (engine, db, _dir) = setup().await;

        // warranty cooldown is 7 days
        let prev_trigger = Utc::now() + Duration::days(1);
        seed_event(
            &db,
            Category::Warranty,
            "warranty|g1|2026-08-31",
            prev_trigger,
            EventMetadata::with_gear("g1"),
        )
        .await;

        // 6 days later: rejected
        let decision = engine
            .can_send(
                Category::Warranty,
                &candidate(EventMetadata::with_gear("g1"), prev_trigger + Duration::days(6)),
            )
            .await
            .unwrap();
        assert!(!decision.allowed);
        assert!(decision.reason.unwrap().contains("Cooldown"));

        // Exactly 7 days later: allowed
        let decision = engine
            .can_send(
                Category::Warranty,
                &candidate(EventMetadata::with_gear("g1"), prev_trigger + Duration::days(7)),
            )
            .await
            .unwrap();
        assert!(decision.allowed);
    }

    #[tokio::test]
    async fn test_cooldown_is_per_item_metadata() {
        let (engine, db, _dir) = setup().await;

        let prev_trigger = Utc::now() + Duration::days(1);
        seed_event(
            &db,
            Category::Warranty,
            "warranty|g1|2026-08-31",
            prev_trigger,
            EventMetadata::with_gear("g1"),
        )
        .await;

        // Different gear is unaffected by g1's cooldown
        let decision = engine
            .can_send(
                Category::Warranty,
                &candidate(EventMetadata::with_gear("g2"), prev_trigger + Duration::days(1)),
            )
            .await
            .unwrap();
        assert!(decision.allowed);
    }

    #[tokio::test]
    async fn test_per_item_cap() {
        let (engine, db, _dir) = setup().await;

        // warranty allows at most 2 per item; space them out past the
        // cooldown so only the cap is in play.
        let base = Utc::now() + Duration::days(1);
        seed_event(
            &db,
            Category::Warranty,
            "warranty|g1|2026-08-31",
            base,
            EventMetadata::with_gear("g1"),
        )
        .await;
        seed_event(
            &db,
            Category::Warranty,
            "warranty|g1|2026-09-10",
            base + Duration::days(10),
            EventMetadata::with_gear("g1"),
        )
        .await;

        let decision = engine
            .can_send(
                Category::Warranty,
                &candidate(EventMetadata::with_gear("g1"), base + Duration::days(20)),
            )
            .await
            .unwrap();
        assert!(!decision.allowed);
        assert_eq!(
            decision.reason.as_deref(),
            Some("Per-item limit reached 2/2")
        );
    }

    #[test]
    fn test_local_day_bounds_cover_now() {
        let now = Utc::now();
        let (start, end) = local_day_bounds(now);
        assert!(start <= now);
        assert!(now <= end);
        assert!(end - start < Duration::days(1) + Duration::seconds(1));
    }
}
