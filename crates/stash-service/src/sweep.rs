//! One-shot archiving of an existing tree.
//!
//! [`sweep`] pushes every file currently under the watched root through
//! the same compress-and-record pipeline the live service uses, without
//! watching anything. Useful for bringing the archive up to date before
//! starting the watcher, or as a standalone batch run.

use std::sync::Arc;

use tokio::task::JoinSet;

use stash_archive::HistoryLog;
use stash_core::{Config, ConfigError, PathMapper};

use crate::error::ServiceError;
use crate::reconcile;
use crate::stats::{ServiceSnapshot, ServiceStats};
use crate::task::{run_archive, TaskResult, TaskStatus};

/// Archives every file under the configured watched root once.
///
/// Files are processed concurrently; the scan yields each path exactly
/// once, so no per-path serialization is needed. Zero-byte files are
/// skipped by the usual policy.
///
/// # Errors
///
/// Fails only if the configured roots are missing; per-file failures are
/// logged and counted.
pub async fn sweep(config: &Config) -> Result<ServiceSnapshot, ServiceError> {
    let monitored_root = &config.archive.monitored_root;
    if !monitored_root.is_dir() {
        return Err(ConfigError::MissingDirectory(monitored_root.clone()).into());
    }
    let monitored_root = monitored_root.canonicalize_utf8()?;

    let archive_root = &config.archive.archive_root;
    if !archive_root.is_dir() {
        return Err(ConfigError::MissingDirectory(archive_root.clone()).into());
    }
    let archive_root = archive_root.canonicalize_utf8()?;

    let mapper = PathMapper::new(monitored_root.clone(), archive_root);
    let history = Arc::new(HistoryLog::new(config.archive.history_path.clone()));
    let stats = ServiceStats::new();

    let scan = reconcile::scan_tree(&monitored_root);
    tracing::info!(root = %monitored_root, files = scan.files.len(), "Sweeping tree");

    let mut tasks: JoinSet<TaskResult> = JoinSet::new();
    for source in scan.files {
        match mapper.destination(&source) {
            Ok(destination) => {
                let history = Arc::clone(&history);
                tasks.spawn(async move {
                    let status = run_archive(&source, &destination, &history).await;
                    TaskResult { source, status }
                });
            }
            Err(error) => {
                stats.record_failure();
                tracing::warn!(source = %source, %error, "Cannot map source to a destination");
            }
        }
    }

    while let Some(joined) = tasks.join_next().await {
        let result = match joined {
            Ok(result) => result,
            Err(join_error) => {
                tracing::debug!(%join_error, "Sweep task did not report back");
                continue;
            }
        };

        match result.status {
            TaskStatus::Archived {
                source_bytes,
                destination_bytes,
            } => {
                stats.record_archived(source_bytes, destination_bytes);
                tracing::info!(source = %result.source, "Archived");
            }
            TaskStatus::SkippedEmpty => stats.record_skipped_empty(),
            TaskStatus::Failed(error) => {
                stats.record_failure();
                tracing::error!(source = %result.source, %error, "Sweep task failed");
            }
            TaskStatus::Interrupted => stats.record_failure(),
        }
    }

    Ok(stats.snapshot())
}
