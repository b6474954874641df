//! Cue Platform - narrow seams over the host OS
//!
//! The engine never talks to a platform API directly; it goes through
//! the traits here so policy and scheduling logic stay platform-agnostic
//! and testable against the in-memory backends in [`mock`].

pub mod alarm;
pub mod channels;
pub mod mock;
pub mod permission;

pub use alarm::{AlarmBackend, AlarmPayload};
pub use channels::{
    channel_specs, ChannelBackend, ChannelCapability, ChannelImportance, ChannelRegistrar,
    ChannelSpec,
};
pub use permission::{PermissionBackend, PermissionGateway, PermissionStatus};
