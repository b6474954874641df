//! Service layer - one send function per domain notification type
//!
//! Every function follows the same shape: compute the trigger from a
//! type-specific offset, reject past triggers outright, consult policy,
//! then schedule. Store and OS failures are downgraded to a
//! `SendOutcome` here; nothing below the UI boundary ever panics over
//! a notification.

use chrono::{DateTime, Duration, Utc};
use cue_core::{Category, EngineConfig, EventMetadata, Priority, SendOutcome};
use tracing::{debug, warn};

use crate::deeplink;
use crate::domain::LineItem;
use crate::policy::{CandidateNotification, PolicyEngine};
use crate::scheduler::{ScheduleRequest, Scheduler};

const PAST_TRIGGER_REASON: &str = "Trigger date is in the past or too soon";

/// Use-case entry points for every notification type
#[derive(Clone)]
pub struct NotificationService {
    policy: PolicyEngine,
    scheduler: Scheduler,
    config: EngineConfig,
}

impl NotificationService {
    pub fn new(policy: PolicyEngine, scheduler: Scheduler, config: EngineConfig) -> Self {
        Self {
            policy,
            scheduler,
            config,
        }
    }

    /// Remind about an upcoming lesson, ahead of its start time
    pub async fn send_lesson_reminder(&self, lesson: &LineItem) -> SendOutcome {
        let trigger_at = lesson.starts_at - Duration::minutes(self.config.lesson_lead_minutes);

        let mut metadata = EventMetadata::with_line_item(&lesson.id);
        metadata
            .extra
            .insert("student".to_string(), lesson.student.clone().into());
        metadata
            .extra
            .insert("focus".to_string(), lesson.focus.clone().into());

        self.dispatch(
            Category::Lessons,
            Priority::Normal,
            "Upcoming lesson".to_string(),
            format!(
                "{} for {} with {} starts in {} minutes",
                lesson.focus, lesson.student, lesson.provider, self.config.lesson_lead_minutes
            ),
            deeplink::education(&lesson.id),
            metadata,
            trigger_at,
        )
        .await
    }

    /// Remind that a warranty is about to expire
    pub async fn send_warranty_reminder(
        &self,
        gear_id: &str,
        gear_name: &str,
        expires_at: DateTime<Utc>,
    ) -> SendOutcome {
        let trigger_at = expires_at - Duration::days(self.config.warranty_lead_days);

        self.dispatch(
            Category::Warranty,
            Priority::Normal,
            "Warranty expiring soon".to_string(),
            format!(
                "The warranty for {} expires on {}",
                gear_name,
                expires_at.format("%Y-%m-%d")
            ),
            deeplink::gear_item(gear_id),
            EventMetadata::with_gear(gear_id),
            trigger_at,
        )
        .await
    }

    /// Prompt for due maintenance on a piece of gear
    pub async fn send_maintenance_prompt(
        &self,
        gear_id: &str,
        gear_name: &str,
        due_at: DateTime<Utc>,
    ) -> SendOutcome {
        self.dispatch(
            Category::Maintenance,
            Priority::Normal,
            "Maintenance due".to_string(),
            format!("{} is due for a check-up", gear_name),
            deeplink::gear_item(gear_id),
            EventMetadata::with_gear(gear_id),
            due_at,
        )
        .await
    }

    /// Nudge an inactive user back into the app
    pub async fn send_reengagement_prompt(&self, last_active_at: DateTime<Utc>) -> SendOutcome {
        let trigger_at = last_active_at + Duration::days(self.config.reengagement_delay_days);

        self.dispatch(
            Category::Reengagement,
            Priority::Normal,
            "Pick up where you left off".to_string(),
            "Your practice log misses you".to_string(),
            deeplink::home(),
            EventMetadata::default(),
            trigger_at,
        )
        .await
    }

    /// Remind about a service pickup, the day before it is ready
    pub async fn send_service_pickup_reminder(
        &self,
        service_id: &str,
        provider: &str,
        pickup_at: DateTime<Utc>,
    ) -> SendOutcome {
        let trigger_at = pickup_at - Duration::days(self.config.service_pickup_lead_days);

        self.dispatch(
            Category::Service,
            Priority::Normal,
            "Service pickup tomorrow".to_string(),
            format!(
                "Your gear is ready at {} on {}",
                provider,
                pickup_at.format("%Y-%m-%d")
            ),
            deeplink::service(service_id),
            EventMetadata::with_service(service_id),
            trigger_at,
        )
        .await
    }

    /// Tell the user a processed receipt is ready for review.
    /// Fires near-immediately, at critical priority.
    pub async fn send_receipt_ready_notification(&self, queue_item_id: &str) -> SendOutcome {
        let trigger_at = Utc::now() + Duration::seconds(self.config.receipt_ready_delay_secs);

        self.dispatch(
            Category::ReceiptReady,
            Priority::Critical,
            "Receipt ready".to_string(),
            "Your receipt has been processed and is ready for review".to_string(),
            deeplink::history_queue(),
            EventMetadata::with_queue_item(queue_item_id),
            trigger_at,
        )
        .await
    }

    /// Suggest filling in missing details for a piece of gear
    pub async fn send_gear_enrichment_prompt(
        &self,
        gear_id: &str,
        gear_name: &str,
    ) -> SendOutcome {
        let trigger_at = Utc::now() + Duration::hours(self.config.gear_enrichment_delay_hours);

        self.dispatch(
            Category::GearEnrichment,
            Priority::Normal,
            "Complete your gear profile".to_string(),
            format!("Add the missing details for {}", gear_name),
            deeplink::gear_item(gear_id),
            EventMetadata::with_gear(gear_id),
            trigger_at,
        )
        .await
    }

    /// Shared pipeline: past-date check, policy, schedule, downgrade
    /// any error to an outcome.
    #[allow(clippy::too_many_arguments)]
    async fn dispatch(
        &self,
        category: Category,
        priority: Priority,
        title: String,
        body: String,
        deep_link: String,
        metadata: EventMetadata,
        trigger_at: DateTime<Utc>,
    ) -> SendOutcome {
        // Deterministic rejection, no policy consulted
        if trigger_at <= Utc::now() {
            debug!(category = %category, trigger_at = %trigger_at, "Rejecting past trigger");
            return SendOutcome::rejected(PAST_TRIGGER_REASON);
        }

        let candidate = CandidateNotification {
            metadata: metadata.clone(),
            trigger_at,
            priority,
        };
        let decision = match self.policy.can_send(category, &candidate).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(category = %category, "Policy check failed: {}", e);
                return SendOutcome::rejected(e.to_string());
            }
        };
        if !decision.allowed {
            return SendOutcome::rejected(decision.reason.unwrap_or_default());
        }

        let request = ScheduleRequest {
            category,
            title,
            body,
            trigger_at,
            deep_link,
            metadata,
        };
        match self.scheduler.schedule(request).await {
            Ok(_) => SendOutcome::ok(),
            Err(e) => {
                warn!(category = %category, "Scheduling failed: {}", e);
                SendOutcome::rejected(e.to_string())
            }
        }
    }
}

/// Build the full engine stack over one database and alarm backend
pub fn build_service(
    db: cue_db::Database,
    alarms: std::sync::Arc<dyn cue_platform::AlarmBackend>,
    config: EngineConfig,
) -> NotificationService {
    let policy = PolicyEngine::new(db.clone(), config.clone());
    let scheduler = Scheduler::new(db, alarms);
    NotificationService::new(policy, scheduler, config)
}
