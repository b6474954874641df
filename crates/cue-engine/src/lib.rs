//! Cue Engine - notification policy, scheduling, and reconciliation
//!
//! Turns domain events (a lesson, a warranty expiry, a pending service
//! pickup) into OS-scheduled local notifications, with idempotent
//! scheduling, rate limits, and a reconciler that rebuilds the schedule
//! from domain data after a restore.

pub mod deeplink;
pub mod domain;
pub mod policy;
pub mod reconcile;
pub mod scheduler;
pub mod service;

pub use domain::{build_chains, LessonChain, LessonSource, LineItem, StaticLessons};
pub use policy::{CandidateNotification, PolicyEngine};
pub use reconcile::{ReconcileReport, Reconciler};
pub use scheduler::{generate_key, ScheduleRequest, Scheduler};
pub use service::{build_service, NotificationService};
