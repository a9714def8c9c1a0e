//! SQLite persistence for the Seamark sync engine.
//!
//! One [`Database`] holds the connection and the access guard. Leaf table
//! wrappers in [`tables`] each own a single relation; [`UpdateAdapter`]
//! applies inbound batches and tile deletions across them, [`MergeAdapter`]
//! reads complete aggregates back, and [`TileSync`] wraps both with the
//! guard and watermark bookkeeping a sync client needs.

#![forbid(unsafe_code)]

mod config;
mod database;
mod error;
mod fs;
mod merge;
mod schema;
mod sync;
pub mod tables;
mod update;

pub use config::{ConfigError, JournalMode, LockingMode, StoreConfig};
pub use database::{ConnectionGuard, Database, OpenStoreError};
pub use error::{StepFailure, StoreError, Target, UpdateError};
pub use merge::MergeAdapter;
pub use schema::{SCHEMA_VERSION, SchemaError, initialise_schema};
pub use sync::TileSync;
pub use tables::Page;
pub use update::{ApplyReport, UpdateAdapter};
