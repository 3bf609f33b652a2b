//! Core types for vaultsync
//!
//! This crate holds everything the sync engine and the CLI share:
//! - The [`SyncSettings`] record describing one synchronization target,
//!   with TOML load/save
//! - The [`Error`] taxonomy for command execution and configuration
//! - Progress reporting types ([`Direction`], [`ProgressEvent`]) and the
//!   operator-facing [`Notifier`] channel
//!
//! Settings are always passed into a run as a snapshot: a run never
//! re-reads configuration, so a concurrent settings edit cannot affect
//! a sync that is already in flight.

pub mod error;
pub mod notify;
pub mod progress;
pub mod settings;

pub use error::{Error, Result};
pub use notify::{Notifier, TracingNotifier};
pub use progress::{Direction, ProgressCallback, ProgressEvent};
pub use settings::SyncSettings;
