//! Bounded-concurrency relocation of scanned files.
//!
//! Tasks are pulled from the scanner in batches of at most `concurrency`
//! items. Every task in a batch runs as its own tokio task; the batch is a
//! barrier, so batch N+1 is not pulled from the scanner, let alone started,
//! until every task of batch N has settled.
//!
//! Workers never touch shared counters. Each one returns a [`TaskOutcome`]
//! to the controlling flow, which owns the [`RunMetrics`].
//!
//! # Move semantics
//!
//! A move is a `rename`. When source and destination are on different
//! filesystems the file is copied and the source removed afterwards; if the
//! copy fails, the partial destination is removed and the source is left in
//! place. A cross-device move carries the source's access and modification
//! times over to the copy. Existing destination files are overwritten.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::fs_ops::{FileOps, LocalFs};
use crate::metrics::RunMetrics;
use crate::scanner::FileTask;

/// Files relocated concurrently per batch unless configured otherwise.
pub const DEFAULT_CONCURRENCY: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelocationMode {
    /// Relocate, removing the source.
    #[default]
    Move,
    /// Duplicate, keeping the source.
    Copy,
}

impl RelocationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelocationMode::Move => "move",
            RelocationMode::Copy => "copy",
        }
    }
}

impl fmt::Display for RelocationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a single file could not be relocated.
#[derive(Debug, thiserror::Error)]
pub enum RelocationError {
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not move {} -> {}: {source}", from.display(), to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not copy {} -> {}: {source}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Cross-device move copied the file but the source could not be deleted.
    #[error("Copied {} but could not remove it: {source}", path.display())]
    RemoveSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Terminal state of one task.
#[derive(Debug)]
pub enum TaskStatus {
    Succeeded,
    Failed(RelocationError),
    /// Dry run: reported, filesystem untouched.
    DryRun,
}

/// Completion message sent from a worker back to the controlling flow.
#[derive(Debug)]
pub struct TaskOutcome {
    pub task: FileTask,
    pub mode: RelocationMode,
    pub status: TaskStatus,
}

/// Relocates scanner output in fixed-size concurrent batches.
pub struct Relocator {
    ops: Arc<dyn FileOps>,
    mode: RelocationMode,
    dry_run: bool,
    concurrency: usize,
}

impl Relocator {
    /// A relocator on the local filesystem with the default batch width.
    pub fn new(mode: RelocationMode) -> Self {
        Self::with_file_ops(mode, Arc::new(LocalFs))
    }

    pub fn with_file_ops(mode: RelocationMode, ops: Arc<dyn FileOps>) -> Self {
        Self {
            ops,
            mode,
            dry_run: false,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sets the batch width; values below 1 are raised to 1.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Consumes `tasks` batch by batch and returns the run's metrics.
    ///
    /// `on_outcome` sees every settled task in completion order. `cancel` is
    /// checked before each batch; a cancelled run lets the current batch
    /// finish and reports `interrupted`.
    pub async fn relocate<I, F>(
        &self,
        tasks: I,
        cancel: &CancellationToken,
        mut on_outcome: F,
    ) -> RunMetrics
    where
        I: IntoIterator<Item = FileTask>,
        F: FnMut(&TaskOutcome),
    {
        let mut tasks = tasks.into_iter();
        let mut metrics = RunMetrics::default();
        let mut batch_number = 0usize;

        loop {
            if cancel.is_cancelled() {
                info!(batch = batch_number, "interrupted, not scheduling further batches");
                metrics.interrupted = true;
                break;
            }

            let batch: Vec<FileTask> = tasks.by_ref().take(self.concurrency).collect();
            if batch.is_empty() {
                break;
            }
            batch_number += 1;
            debug!(batch = batch_number, size = batch.len(), "starting batch");

            let mut join_set = JoinSet::new();
            for task in batch {
                metrics.record_emitted(task.kind);
                let ops = Arc::clone(&self.ops);
                let (mode, dry_run) = (self.mode, self.dry_run);
                join_set.spawn(async move { relocate_one(ops.as_ref(), task, mode, dry_run).await });
            }

            while let Some(joined) = join_set.join_next().await {
                match joined {
                    Ok(outcome) => {
                        metrics.record_outcome(&outcome);
                        on_outcome(&outcome);
                    }
                    Err(e) => {
                        error!(error = %e, "relocation task did not complete");
                        metrics.record_lost_task();
                    }
                }
            }
        }

        metrics
    }
}

async fn relocate_one(
    ops: &dyn FileOps,
    task: FileTask,
    mode: RelocationMode,
    dry_run: bool,
) -> TaskOutcome {
    if dry_run {
        return TaskOutcome {
            task,
            mode,
            status: TaskStatus::DryRun,
        };
    }

    let status = match perform(ops, &task, mode).await {
        Ok(()) => {
            debug!(%mode, source = %task.source.display(), destination = %task.destination.display(), "relocated");
            TaskStatus::Succeeded
        }
        Err(e) => {
            error!(
                %mode,
                source = %task.source.display(),
                destination = %task.destination.display(),
                error = %e,
                "relocation failed"
            );
            TaskStatus::Failed(e)
        }
    };
    TaskOutcome { task, mode, status }
}

async fn perform(
    ops: &dyn FileOps,
    task: &FileTask,
    mode: RelocationMode,
) -> Result<(), RelocationError> {
    if let Some(parent) = task.destination.parent() {
        ops.create_dir_all(parent)
            .await
            .map_err(|source| RelocationError::DirectoryCreationFailed {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    match mode {
        RelocationMode::Copy => ops
            .copy(&task.source, &task.destination)
            .await
            .map(|_| ())
            .map_err(|source| RelocationError::Copy {
                from: task.source.clone(),
                to: task.destination.clone(),
                source,
            }),
        RelocationMode::Move => move_file(ops, &task.source, &task.destination).await,
    }
}

async fn move_file(ops: &dyn FileOps, from: &Path, to: &Path) -> Result<(), RelocationError> {
    let move_error = |source: io::Error| RelocationError::Move {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    match ops.rename(from, to).await {
        Ok(()) => return Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!(source = %from.display(), "cross-device move, copying");
        }
        Err(e) => return Err(move_error(e)),
    }

    if let Err(e) = ops.copy(from, to).await {
        if let Err(cleanup) = ops.remove_file(to).await
            && cleanup.kind() != io::ErrorKind::NotFound
        {
            warn!(path = %to.display(), error = %cleanup, "could not remove partial copy");
        }
        return Err(move_error(e));
    }

    if let Err(e) = ops.copy_times(from, to).await {
        warn!(path = %to.display(), error = %e, "could not carry over file times");
    }

    ops.remove_file(from)
        .await
        .map_err(|source| RelocationError::RemoveSource {
            path: from.to_path_buf(),
            source,
        })
}
