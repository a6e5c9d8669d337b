//! Core types, errors, and utilities for the stashd archiving service.
//!
//! This crate provides the foundational types used across the workspace:
//!
//! - Configuration structures ([`Config`], [`WatchConfig`], [`ArchiveConfig`])
//! - Error types for configuration and path mapping
//! - The archive path mapper ([`PathMapper`]) shared by the writer and logger
//! - The per-file [`CompressionRecord`] emitted for every archived file
//! - Type aliases for `FxHashMap`/`FxHashSet` (faster than std)

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod hash;
pub mod mapping;
pub mod record;

pub use config::{ArchiveConfig, Config, WatchConfig};
pub use error::ConfigError;
pub use hash::{FxBuildHasher, FxHashMap, FxHashSet};
pub use mapping::{MapError, PathMapper};
pub use record::{kilobytes, CompressionRecord};
