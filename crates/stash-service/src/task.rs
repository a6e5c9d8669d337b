//! The archive task body.
//!
//! One task archives one source path: compress on the blocking pool,
//! then append the history record. Tasks own no shared mutable state
//! beyond the history log handle, and their failures terminate the task
//! only; nothing here can take the dispatch loop down.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};

use stash_archive::{compress_file, ArchiveError, ArchiveOutcome, HistoryLog};
use stash_core::CompressionRecord;

/// How one archive task ended.
#[derive(Debug)]
pub enum TaskStatus {
    /// The source was compressed, persisted, and recorded.
    Archived {
        /// Size of the compressed source content, in bytes.
        source_bytes: u64,
        /// Size of the finished archive, in bytes.
        destination_bytes: u64,
    },

    /// The source was empty at processing time; skipped by policy.
    SkippedEmpty,

    /// The task failed; the error is terminal for this task only.
    Failed(ArchiveError),

    /// The blocking stage was cancelled before finishing.
    Interrupted,
}

/// The completion report handed back to the dispatch loop.
#[derive(Debug)]
pub struct TaskResult {
    /// The source path this task was responsible for.
    pub source: Utf8PathBuf,

    /// How the task ended.
    pub status: TaskStatus,
}

/// Archives one source file and appends its history record.
///
/// Runs the compression and the log append on the blocking pool in a
/// single hop; the record is only written after the destination is
/// durably in place.
pub async fn run_archive(
    source: &Utf8Path,
    destination: &Utf8Path,
    history: &Arc<HistoryLog>,
) -> TaskStatus {
    let task_source = source.to_owned();
    let task_destination = destination.to_owned();
    let history = Arc::clone(history);

    let joined = tokio::task::spawn_blocking(move || -> Result<ArchiveOutcome, ArchiveError> {
        let outcome = compress_file(&task_source, &task_destination)?;

        if let ArchiveOutcome::Archived {
            source_bytes,
            destination_bytes,
        } = outcome
        {
            history.append(&CompressionRecord {
                source: task_source,
                destination: task_destination,
                source_bytes,
                destination_bytes,
            })?;
        }

        Ok(outcome)
    })
    .await;

    match joined {
        Ok(Ok(ArchiveOutcome::Archived {
            source_bytes,
            destination_bytes,
        })) => TaskStatus::Archived {
            source_bytes,
            destination_bytes,
        },
        Ok(Ok(ArchiveOutcome::SkippedEmpty)) => TaskStatus::SkippedEmpty,
        Ok(Err(error)) => TaskStatus::Failed(error),
        Err(join_error) => {
            tracing::debug!(source = %source, %join_error, "Archive task interrupted");
            TaskStatus::Interrupted
        }
    }
}
