//! End-to-end pipeline tests over a real SQLite store and mock platform

use chrono::{Duration, Utc};
use cue_core::{Category, EngineConfig, SettingsPatch};
use cue_db::Database;
use cue_engine::{
    build_service, LineItem, NotificationService, PolicyEngine, Reconciler, Scheduler,
    StaticLessons,
};
use cue_platform::mock::MockAlarms;
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Stack {
    service: NotificationService,
    scheduler: Scheduler,
    alarms: MockAlarms,
    db: Database,
    _dir: TempDir,
}

async fn stack() -> Stack {
    init_tracing();
    let dir = tempdir().unwrap();
    let db = Database::new(&dir.path().join("cue.db")).await.unwrap();
    let alarms = MockAlarms::new();
    let config = EngineConfig::default();
    let service = build_service(db.clone(), Arc::new(alarms.clone()), config.clone());
    let scheduler = Scheduler::new(db.clone(), Arc::new(alarms.clone()));
    Stack {
        service,
        scheduler,
        alarms,
        db,
        _dir: dir,
    }
}

#[tokio::test]
async fn warranty_scenario_cooldown_and_per_item_cap() {
    let s = stack().await;
    let t0 = Utc::now() + Duration::days(35);

    // First reminder: allowed
    let outcome = s
        .service
        .send_warranty_reminder("g1", "Stratocaster", t0)
        .await;
    assert!(outcome.scheduled, "first reminder: {:?}", outcome.reason);

    // Ten days later: cooldown (7d) satisfied, per-item count is 1
    let outcome = s
        .service
        .send_warranty_reminder("g1", "Stratocaster", t0 + Duration::days(10))
        .await;
    assert!(outcome.scheduled, "second reminder: {:?}", outcome.reason);

    // Twenty days later: per-item cap of 2 is exhausted
    let outcome = s
        .service
        .send_warranty_reminder("g1", "Stratocaster", t0 + Duration::days(20))
        .await;
    assert!(!outcome.scheduled);
    assert_eq!(outcome.reason.as_deref(), Some("Per-item limit reached 2/2"));

    assert_eq!(s.alarms.live_count().await, 2);
}

#[tokio::test]
async fn daily_cap_rejects_the_overflow_notification() {
    let s = stack().await;
    s.db.settings()
        .update(&SettingsPatch {
            daily_limit: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();

    // Two receipt-ready events fire within seconds (critical, but they
    // still land in today's window and count toward later checks)
    for i in 0..2 {
        let outcome = s
            .service
            .send_receipt_ready_notification(&format!("q{}", i))
            .await;
        assert!(outcome.scheduled);
    }

    // A normal-priority send now trips the daily cap
    let outcome = s
        .service
        .send_maintenance_prompt("g1", "Amp", Utc::now() + Duration::minutes(10))
        .await;
    assert!(!outcome.scheduled);
    assert!(outcome.reason.unwrap().starts_with("Daily limit reached"));

    // Critical priority still goes through
    let outcome = s.service.send_receipt_ready_notification("q9").await;
    assert!(outcome.scheduled);
}

#[tokio::test]
async fn disabling_a_category_cancels_its_schedule() {
    let s = stack().await;

    let lesson = LineItem {
        id: "li-1".to_string(),
        student: "Ada".to_string(),
        focus: "guitar".to_string(),
        provider: "Melody School".to_string(),
        starts_at: Utc::now() + Duration::days(2),
    };
    assert!(s.service.send_lesson_reminder(&lesson).await.scheduled);
    assert!(s
        .service
        .send_warranty_reminder("g1", "Strat", Utc::now() + Duration::days(40))
        .await
        .scheduled);
    assert_eq!(s.alarms.live_count().await, 2);

    // The settings UI flips the toggle, then cancels the category
    s.db.settings()
        .update(&SettingsPatch::category(Category::Lessons, false))
        .await
        .unwrap();
    let cancelled = s.scheduler.cancel_by_category(Category::Lessons).await.unwrap();
    assert_eq!(cancelled, 1);
    assert_eq!(s.alarms.live_count().await, 1);

    // And new sends in that category are rejected
    let outcome = s.service.send_lesson_reminder(&lesson).await;
    assert_eq!(outcome.reason.as_deref(), Some("Category lessons disabled"));
}

#[tokio::test]
async fn reconcile_after_restore_keeps_log_consistent() {
    init_tracing();
    let dir = tempdir().unwrap();
    let db = Database::new(&dir.path().join("cue.db")).await.unwrap();
    db.settings()
        .update(&SettingsPatch {
            daily_limit: Some(100),
            weekly_limit: Some(100),
            ..Default::default()
        })
        .await
        .unwrap();

    let items = vec![
        LineItem {
            id: "li-1".to_string(),
            student: "Ada".to_string(),
            focus: "guitar".to_string(),
            provider: "Melody School".to_string(),
            starts_at: Utc::now() + Duration::days(3),
        },
        LineItem {
            id: "li-2".to_string(),
            student: "Ada".to_string(),
            focus: "guitar".to_string(),
            provider: "Melody School".to_string(),
            starts_at: Utc::now() + Duration::days(10),
        },
    ];
    let lessons = Arc::new(StaticLessons::new(items));
    let config = EngineConfig::default();

    // First boot: schedule everything
    let alarms = MockAlarms::new();
    let policy = PolicyEngine::new(db.clone(), config.clone());
    let scheduler = Scheduler::new(db.clone(), Arc::new(alarms.clone()));
    let service = NotificationService::new(policy, scheduler.clone(), config.clone());
    let reconciler = Reconciler::new(
        db.clone(),
        service,
        scheduler,
        lessons.clone(),
        config.clone(),
    );
    let report = reconciler.reconcile().await.unwrap();
    assert_eq!(report.scheduled, 2);
    assert_eq!(alarms.live_count().await, 2);

    // "Restore": DB rows survive, OS alarms are wiped
    let fresh_alarms = MockAlarms::new();
    let policy = PolicyEngine::new(db.clone(), config.clone());
    let scheduler = Scheduler::new(db.clone(), Arc::new(fresh_alarms.clone()));
    let service = NotificationService::new(policy, scheduler.clone(), config.clone());
    let reconciler = Reconciler::new(db.clone(), service, scheduler, lessons, config);

    let report = reconciler.reconcile().await.unwrap();
    // Rows claim "scheduled" with matching triggers, so regeneration is
    // an idempotent no-op per key; the event log stays consistent.
    assert_eq!(report.scheduled, 2);
    let events = db.events().get_by_category(Category::Lessons).await.unwrap();
    assert_eq!(events.len(), 2);
}
