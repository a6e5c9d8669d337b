//! The event dispatch loop.
//!
//! One [`Dispatcher`] owns the whole pipeline for the lifetime of the
//! process: the watch tree, the path mapper, the history log handle, the
//! in-flight table, and the task group. It consumes the event channel in
//! delivery order and routes each event:
//!
//! ```text
//! WatchEvent::DirectoryCreated ──► register (sync) ──► reconcile scan
//! WatchEvent::FileWritten ───────► single-flight admit ──► JoinSet task
//! WatchEvent::TransportError ────► log, continue
//! ```
//!
//! Directory registration happens synchronously in the loop, before any
//! later event is examined, so an event sourced from inside a new
//! directory is never processed ahead of its registration. Archive tasks
//! run concurrently with the loop and with each other; the loop never
//! waits on one outside of shutdown.
//!
//! # Shutdown
//!
//! Cancelling the token (or the event channel closing) exits the loop
//! cleanly. In-flight tasks then get a bounded grace period to drain;
//! whatever is still running afterwards is aborted. No indefinite wait.

use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use stash_archive::HistoryLog;
use stash_core::{Config, ConfigError, PathMapper};
use stash_watcher::{PathFilter, Registration, WatchEvent, WatchTree};

use crate::error::ServiceError;
use crate::inflight::{Admission, InflightTable};
use crate::reconcile;
use crate::stats::{ServiceSnapshot, ServiceStats};
use crate::task::{run_archive, TaskResult, TaskStatus};

/// The watch-and-archive control loop.
///
/// # Examples
///
/// ```no_run
/// use stash_core::Config;
/// use stash_service::Dispatcher;
/// use stash_watcher::AcceptAll;
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() -> Result<(), stash_service::ServiceError> {
///     let config = Config::default();
///     let token = CancellationToken::new();
///
///     let dispatcher = Dispatcher::new(&config, AcceptAll)?;
///     let snapshot = dispatcher.run(token).await?;
///     println!("archived {} files", snapshot.archived);
///     Ok(())
/// }
/// ```
pub struct Dispatcher {
    /// The watch tree; exclusively owned, single consumer.
    watcher: WatchTree,

    /// Source-to-destination mapping over canonical roots.
    mapper: PathMapper,

    /// Shared history log, cloned into every archive task.
    history: Arc<HistoryLog>,

    /// Per-path single-flight admission.
    inflight: InflightTable,

    /// In-flight archive tasks.
    tasks: JoinSet<TaskResult>,

    /// Service counters.
    stats: ServiceStats,

    /// How long tasks may drain after shutdown before being aborted.
    grace: Duration,
}

impl Dispatcher {
    /// Builds the pipeline from validated configuration.
    ///
    /// The watched root and archive root are canonicalized here so that
    /// event paths, mapped destinations, and the watch set all agree.
    ///
    /// # Errors
    ///
    /// Every error from this constructor is a fatal-startup condition:
    /// the watcher could not be created, the watched root is missing or
    /// unwatchable, or the archive root is missing.
    pub fn new<F: PathFilter>(config: &Config, filter: F) -> Result<Self, ServiceError> {
        let watcher = WatchTree::new(
            &config.archive.monitored_root,
            config.watch.channel_capacity,
            filter,
        )?;

        let archive_root = &config.archive.archive_root;
        if !archive_root.is_dir() {
            return Err(ConfigError::MissingDirectory(archive_root.clone()).into());
        }
        let archive_root = archive_root.canonicalize_utf8()?;

        let mapper = PathMapper::new(watcher.root().to_owned(), archive_root);
        let history = Arc::new(HistoryLog::new(config.archive.history_path.clone()));

        Ok(Self {
            watcher,
            mapper,
            history,
            inflight: InflightTable::new(),
            tasks: JoinSet::new(),
            stats: ServiceStats::new(),
            grace: Duration::from_millis(config.watch.shutdown_grace_ms),
        })
    }

    /// Runs the dispatch loop until cancellation or channel close.
    ///
    /// Before consuming events, the watch set is seeded from the live
    /// tree so directories that existed at startup are covered. Files
    /// already present are not archived; only changes from here on are.
    ///
    /// Returns the final counters once in-flight work has drained or
    /// been aborted.
    ///
    /// # Errors
    ///
    /// Only startup seeding can fail; a running loop survives every
    /// per-event and per-task error.
    pub async fn run(mut self, token: CancellationToken) -> Result<ServiceSnapshot, ServiceError> {
        self.seed_watch_set();

        tracing::info!(
            root = %self.watcher.root(),
            archive = %self.mapper.archive_root(),
            "Service watching"
        );

        loop {
            tokio::select! {
                () = token.cancelled() => {
                    tracing::info!("Shutdown requested");
                    break;
                }
                event = self.watcher.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => {
                        tracing::warn!("Event channel closed, stopping");
                        break;
                    }
                },
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    self.handle_completion(joined);
                }
            }
        }

        self.drain().await;
        Ok(self.stats.snapshot())
    }

    /// Registers every directory already present under the root.
    fn seed_watch_set(&mut self) {
        let scan = reconcile::scan_tree(self.watcher.root());
        for dir in &scan.directories {
            self.register_directory(dir, false);
        }
        tracing::debug!(
            watched = self.watcher.watched_count(),
            "Watch set seeded from live tree"
        );
    }

    /// Routes one event; never fails.
    fn handle_event(&mut self, event: WatchEvent) {
        match event {
            WatchEvent::DirectoryCreated(dir) => self.register_directory(&dir, true),
            WatchEvent::FileWritten(path) => self.dispatch_file(path),
            WatchEvent::TransportError(message) => {
                self.stats.record_transport_error();
                tracing::warn!(%message, "Watch transport error");
            }
        }
    }

    /// Adds a directory to the watch set, then optionally reconciles.
    ///
    /// The reconciliation pass closes the window between a directory's
    /// creation and its registration: entries placed inside during that
    /// window produced no events, so the scan registers discovered
    /// subdirectories and replays discovered files as synthetic writes.
    fn register_directory(&mut self, dir: &Utf8Path, reconcile_contents: bool) {
        match self.watcher.register(dir) {
            Ok(Registration::Added) => self.stats.record_directory(),
            Ok(Registration::AlreadyWatched) => return,
            Err(error) => {
                tracing::warn!(
                    dir = %dir,
                    %error,
                    "Failed to register directory; its subtree will be unobserved"
                );
                return;
            }
        }

        if !reconcile_contents {
            return;
        }

        let scan = reconcile::scan_tree(dir);
        if scan.is_empty() {
            return;
        }

        tracing::debug!(
            dir = %dir,
            directories = scan.directories.len(),
            files = scan.files.len(),
            "Reconciling entries that raced registration"
        );
        for sub in &scan.directories {
            self.register_directory(sub, false);
        }
        for file in scan.files {
            self.dispatch_file(file);
        }
    }

    /// Admits a file event and spawns its archive task if none is running.
    fn dispatch_file(&mut self, source: Utf8PathBuf) {
        let destination = match self.mapper.destination(&source) {
            Ok(destination) => destination,
            Err(error) => {
                self.stats.record_failure();
                tracing::warn!(source = %source, %error, "Cannot map source to a destination");
                return;
            }
        };

        match self.inflight.admit(&source) {
            Admission::Spawn => self.spawn_archive(source, destination),
            Admission::Coalesced => {
                tracing::trace!(source = %source, "Write coalesced into in-flight task");
            }
        }
    }

    /// Spawns one archive task on the task group.
    fn spawn_archive(&mut self, source: Utf8PathBuf, destination: Utf8PathBuf) {
        let history = Arc::clone(&self.history);
        self.tasks.spawn(async move {
            let status = run_archive(&source, &destination, &history).await;
            TaskResult { source, status }
        });
    }

    /// Accounts for a finished task and spawns the rerun it may owe.
    fn handle_completion(&mut self, joined: Result<TaskResult, tokio::task::JoinError>) {
        let result = match joined {
            Ok(result) => result,
            Err(join_error) => {
                // Only shutdown aborts produce this; the task body itself
                // converts its own interruption into a TaskStatus.
                tracing::debug!(%join_error, "Archive task did not report back");
                return;
            }
        };

        match result.status {
            TaskStatus::Archived {
                source_bytes,
                destination_bytes,
            } => {
                self.stats.record_archived(source_bytes, destination_bytes);
                tracing::info!(
                    source = %result.source,
                    source_bytes,
                    destination_bytes,
                    "Archived"
                );
            }
            TaskStatus::SkippedEmpty => {
                self.stats.record_skipped_empty();
            }
            TaskStatus::Failed(error) => {
                self.stats.record_failure();
                tracing::error!(source = %result.source, %error, "Archive task failed");
            }
            TaskStatus::Interrupted => {
                self.stats.record_failure();
            }
        }

        if self.inflight.complete(&result.source) {
            // Writes arrived while the task ran; rerun to pick up the
            // newest content.
            match self.mapper.destination(&result.source) {
                Ok(destination) => self.spawn_archive(result.source, destination),
                Err(error) => {
                    self.inflight.release(&result.source);
                    tracing::warn!(source = %result.source, %error, "Cannot map rerun destination");
                }
            }
        }
    }

    /// Waits out in-flight tasks, aborting whatever outlives the grace
    /// period.
    async fn drain(&mut self) {
        if self.tasks.is_empty() {
            return;
        }

        tracing::info!(in_flight = self.tasks.len(), "Draining archive tasks");
        let grace = self.grace;
        if tokio::time::timeout(grace, self.drain_all()).await.is_err() {
            tracing::warn!(
                remaining = self.tasks.len(),
                "Grace period elapsed; aborting remaining tasks"
            );
            self.tasks.abort_all();
            while self.tasks.join_next().await.is_some() {}
        }
    }

    /// Joins every task, including reruns spawned by completions.
    async fn drain_all(&mut self) {
        while let Some(joined) = self.tasks.join_next().await {
            self.handle_completion(joined);
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("root", &self.watcher.root())
            .field("in_flight", &self.inflight.len())
            .finish_non_exhaustive()
    }
}
