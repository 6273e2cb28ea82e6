//! Durable registry of profiles, each owning an isolated storage directory.
//!
//! The registry lives in one directory as `profiles.json`, written through a
//! write-ahead `profiles-next.json` so that a crash never leaves a half-written
//! snapshot behind. Removed profiles keep their storage until
//! [`ProfileStore::collect`] deletes it after a grace period, and
//! [`ProfileStore::migrate`] adopts a legacy single-profile layout as profile
//! `0`.

pub mod command;
pub mod config;
pub mod current;
pub mod embedded;
pub mod error;
pub mod gc;
pub mod migrate;
pub mod model;
pub mod persist;
pub mod run;
pub mod statistics;
pub mod store;
pub mod utils;

pub use current::Current;
pub use error::{Error, Result};
pub use migrate::LegacyLayout;
pub use model::{GcEntry, Profile, Timestamp};
pub use statistics::GcReport;
pub use store::{CreateOptions, LATEST_VERSION, OLDEST_VERSION, OpenOptions, ProfileStore};
