//! Per-run outcome counters.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::media_type::MediaType;
use crate::relocator::{RelocationMode, TaskOutcome, TaskStatus};

/// Aggregate counters for one invocation.
///
/// Owned by the controlling flow; workers report back through
/// [`TaskOutcome`] values rather than touching the counters themselves.
/// In a dry run `moves`/`copies` count planned actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunMetrics {
    pub moves: usize,
    pub copies: usize,
    pub errors: usize,
    /// Tasks emitted by the scanner, per type.
    pub type_counts: BTreeMap<MediaType, usize>,
    /// Set when an interrupt stopped the run before the scan was exhausted.
    pub interrupted: bool,
}

impl RunMetrics {
    /// Counts a task handed over by the scanner.
    pub fn record_emitted(&mut self, kind: MediaType) {
        *self.type_counts.entry(kind).or_insert(0) += 1;
    }

    /// Folds a finished task into the counters.
    pub fn record_outcome(&mut self, outcome: &TaskOutcome) {
        match outcome.status {
            TaskStatus::Succeeded | TaskStatus::DryRun => match outcome.mode {
                RelocationMode::Move => self.moves += 1,
                RelocationMode::Copy => self.copies += 1,
            },
            TaskStatus::Failed(_) => self.errors += 1,
        }
    }

    /// Records a task whose worker died before reporting.
    pub fn record_lost_task(&mut self) {
        self.errors += 1;
    }

    pub fn emitted(&self) -> usize {
        self.type_counts.values().sum()
    }

    /// Tasks that reached a terminal state.
    pub fn settled(&self) -> usize {
        self.moves + self.copies + self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relocator::RelocationError;
    use crate::scanner::FileTask;
    use std::path::PathBuf;

    fn outcome(mode: RelocationMode, status: TaskStatus) -> TaskOutcome {
        TaskOutcome {
            task: FileTask {
                source: PathBuf::from("/src/a.jpg"),
                destination: PathBuf::from("/out/a.jpg"),
                kind: MediaType::Image,
            },
            mode,
            status,
        }
    }

    #[test]
    fn test_outcomes_tallied_by_mode() {
        let mut metrics = RunMetrics::default();
        metrics.record_outcome(&outcome(RelocationMode::Move, TaskStatus::Succeeded));
        metrics.record_outcome(&outcome(RelocationMode::Copy, TaskStatus::Succeeded));
        metrics.record_outcome(&outcome(RelocationMode::Copy, TaskStatus::DryRun));
        metrics.record_outcome(&outcome(
            RelocationMode::Move,
            TaskStatus::Failed(RelocationError::Move {
                from: PathBuf::from("/src/a.jpg"),
                to: PathBuf::from("/out/a.jpg"),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            }),
        ));

        assert_eq!(metrics.moves, 1);
        assert_eq!(metrics.copies, 2);
        assert_eq!(metrics.errors, 1);
        assert_eq!(metrics.settled(), 4);
    }

    #[test]
    fn test_type_counts() {
        let mut metrics = RunMetrics::default();
        metrics.record_emitted(MediaType::Video);
        metrics.record_emitted(MediaType::Image);
        metrics.record_emitted(MediaType::Image);

        assert_eq!(metrics.type_counts[&MediaType::Image], 2);
        assert_eq!(metrics.type_counts[&MediaType::Video], 1);
        assert_eq!(metrics.emitted(), 3);
    }

    #[test]
    fn test_serializes_type_names() {
        let mut metrics = RunMetrics::default();
        metrics.record_emitted(MediaType::Image);
        let json = serde_json::to_value(&metrics).unwrap();
        assert_eq!(json["type_counts"]["image"], 1);
        assert_eq!(json["interrupted"], false);
    }
}
