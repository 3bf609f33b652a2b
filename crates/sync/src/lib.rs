//! rsync orchestration for vaultsync
//!
//! This crate turns a [`vaultsync_core::SyncSettings`] snapshot into
//! running rsync processes:
//!
//! - [`command`] deterministically builds the exact rsync invocation
//!   for a direction, including WSL path translation — a pure function
//!   with no I/O
//! - [`executor`] runs built commands as child processes, scrapes
//!   percentage markers from their output, enforces output and
//!   wall-clock bounds, and sequences the pull phase before the push
//!   phase
//! - [`scheduler`] re-triggers a full sync cycle on a fixed period
//!
//! vaultsync never copies a file itself; rsync does all transfer,
//! checksumming, and deletion. This crate only controls how rsync is
//! invoked and how its textual output is interpreted.

pub mod command;
pub mod executor;
pub mod progress;
pub mod scheduler;
pub mod wsl;

pub use command::{RsyncCommand, build_rsync_command};
pub use executor::{ExecutorOptions, SyncExecutor};
pub use scheduler::{SyncScheduler, interval_from_minutes};
