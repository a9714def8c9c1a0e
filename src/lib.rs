//! Facade crate for the Seamark marker sync engine.
//!
//! This crate re-exports the core domain types and, behind the
//! `store-sqlite` feature, the SQLite store with its adapters and sync
//! session.

#![forbid(unsafe_code)]

pub use seamark_core::{
    AccessLock, AccessMode, AccessScope, KeyRange, LockStatus, Marker, MarkerId, MarkerMeta,
    MarkerRecord, MarkerType, MarkerUpdate, Rating, Review, ReviewId, ReviewRecord, ReviewUpdate,
    SpatialKey, SupportTables, Tile, TileCoord, TilePartition, TypeMask, Watermark, WatermarkMap,
};

#[cfg(feature = "store-sqlite")]
pub use seamark_store::{
    ApplyReport, Database, MergeAdapter, OpenStoreError, Page, StoreConfig, StoreError,
    TileSync, UpdateAdapter, UpdateError,
};
