//! Event dispatch and archive task orchestration.
//!
//! This crate is the control core of stashd. It ties the watch tree, the
//! archive writer, and the history log into one long-running pipeline:
//!
//! ```text
//! filesystem ─► WatchTree ─► Dispatcher ─┬─► register + reconcile (sync)
//!                                        └─► archive tasks (JoinSet)
//!                                              │
//!                                              ├─► compressed file
//!                                              └─► history record
//! ```
//!
//! # Concurrency model
//!
//! One loop owns the event stream and all dispatch state; archive tasks
//! run concurrently with the loop and with each other, serialized per
//! source path by the single-flight table. The loop never blocks on a
//! task; shutdown drains with a bounded grace period.
//!
//! # Entry points
//!
//! - [`Dispatcher`]: the live watch-and-archive service.
//! - [`sweep`]: one-shot archiving of the current tree.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod dispatcher;
pub mod error;
pub mod inflight;
pub mod reconcile;
pub mod stats;
pub mod sweep;
pub mod task;

pub use dispatcher::Dispatcher;
pub use error::ServiceError;
pub use stats::{ServiceSnapshot, ServiceStats};
pub use sweep::sweep;
