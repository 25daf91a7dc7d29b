// Retrace - Trace Replay Debugger
// Copyright (C) 2026 The Retrace contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Append-only snapshot history with per-transition change flags.
//!
//! The history owns every snapshot a session has observed, in execution
//! order, and keeps exactly one [`Transition`] per consecutive pair.
//! Snapshots are diffed once, at append time: the changed flags stored on
//! snapshot `i` always describe the transition from `i - 1` to `i` (the
//! first snapshot is bootstrapped with everything marked changed). Replay
//! only ever reads.

use retrace_common::types::{ConsoleLine, HeapItem, InputBufferInfo, Snapshot, StackFrame};
use tracing::debug;

use crate::diff::{diff_pair, mark_all_changed};

/// Marker for one consecutive snapshot pair, kept for timeline rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Index of the `next` snapshot of the pair
    pub state_index: usize,
    /// Line the transition departed from, i.e. the line executed
    pub line: u32,
    /// Source file the transition departed from
    pub source_file_uri: String,
}

/// A freshly computed diff between two arbitrary history positions.
///
/// The contained snapshot is a copy of the `to` snapshot with its changed
/// flags rewritten against the `from` snapshot; the history's own stored
/// flags are not touched.
#[derive(Debug, Clone)]
pub struct SnapshotDelta {
    /// Index the diff was computed against
    pub from_index: usize,
    /// Index the contained snapshot came from
    pub to_index: usize,
    /// Copy of the `to` snapshot with recomputed changed flags
    pub snapshot: Snapshot,
}

/// Everything a renderer needs about one history position
#[derive(Debug, Clone)]
pub struct TraceData {
    /// The position described
    pub state_index: usize,
    /// Console traffic of every snapshot up to and including the position
    pub console_lines: Vec<ConsoleLine>,
    /// Input-buffer bookkeeping at the position
    pub input_buffer_info: InputBufferInfo,
    /// Diff against the previously rendered position, where one exists
    pub delta: Option<SnapshotDelta>,
}

/// The append-only snapshot history of one debug session
#[derive(Debug, Clone, Default)]
pub struct TraceHistory {
    snapshots: Vec<Snapshot>,
    transitions: Vec<Transition>,
}

impl TraceHistory {
    /// An empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Append freshly delivered snapshots and diff each new consecutive
    /// pair exactly once.
    ///
    /// The first snapshot ever appended gets every flag forced to changed;
    /// each later snapshot is diffed against its immediate predecessor,
    /// including across append batches.
    pub fn append(&mut self, snapshots: Vec<Snapshot>) {
        if snapshots.is_empty() {
            return;
        }
        let was_empty = self.snapshots.is_empty();
        self.snapshots.extend(snapshots);
        if was_empty {
            mark_all_changed(&mut self.snapshots[0]);
        }
        while self.transitions.len() + 1 < self.snapshots.len() {
            let next_index = self.transitions.len() + 1;
            let (before, after) = self.snapshots.split_at_mut(next_index);
            let previous = &before[next_index - 1];
            let next = &mut after[0];
            diff_pair(previous, next);
            self.transitions.push(Transition {
                state_index: next_index,
                line: previous.line,
                source_file_uri: previous.source_file_uri.clone(),
            });
        }
        debug!(snapshots = self.snapshots.len(), "history extended");
    }

    /// Discard all recorded state
    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.transitions.clear();
    }

    /// Number of recorded snapshots
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether no snapshot has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Snapshot at a history position
    pub fn snapshot_at(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    /// The oldest recorded snapshot
    pub fn first_snapshot(&self) -> Option<&Snapshot> {
        self.snapshots.first()
    }

    /// Input-buffer bookkeeping at a history position
    pub fn input_buffer_info(&self, index: usize) -> Option<&InputBufferInfo> {
        self.snapshots.get(index).map(|snapshot| &snapshot.input_buffer_info)
    }

    /// All recorded transitions, in order
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Whether the position is the newest recorded snapshot
    pub fn is_live(&self, index: usize) -> bool {
        !self.snapshots.is_empty() && index + 1 == self.snapshots.len()
    }

    /// Whether recorded snapshots exist after the position
    pub fn is_replay(&self, index: usize) -> bool {
        index + 1 < self.snapshots.len()
    }

    /// Call stack at a history position
    pub fn stack_frames(&self, index: usize) -> Option<&[StackFrame]> {
        self.snapshots.get(index).map(|snapshot| snapshot.stack.as_slice())
    }

    /// Heap contents at a history position
    pub fn heap(&self, index: usize) -> Option<&[HeapItem]> {
        self.snapshots.get(index).map(|snapshot| snapshot.heap.as_slice())
    }

    /// Console traffic of every snapshot up to and including `index`
    pub fn console_lines(&self, index: usize) -> Vec<ConsoleLine> {
        self.snapshots
            .iter()
            .take(index + 1)
            .map(Snapshot::console_line)
            .collect()
    }

    /// Diff two arbitrary positions without touching stored flags.
    ///
    /// Backs backward navigation and jumps: the returned copy carries
    /// flags relative to `from` instead of the stored predecessor-relative
    /// ones.
    pub fn delta(&self, from: usize, to: usize) -> Option<SnapshotDelta> {
        let previous = self.snapshots.get(from)?;
        let mut snapshot = self.snapshots.get(to)?.clone();
        diff_pair(previous, &mut snapshot);
        Some(SnapshotDelta { from_index: from, to_index: to, snapshot })
    }

    /// Renderer bundle for a position, diffed against `previous` when
    /// given
    pub fn trace_data(&self, index: usize, previous: Option<usize>) -> Option<TraceData> {
        let snapshot = self.snapshots.get(index)?;
        Some(TraceData {
            state_index: index,
            console_lines: self.console_lines(index),
            input_buffer_info: snapshot.input_buffer_info.clone(),
            delta: previous.and_then(|from| self.delta(from, index)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SnapshotBuilder;
    use retrace_common::types::Value;

    fn counting_snapshot(line: u32, x: i64) -> Snapshot {
        SnapshotBuilder::new("Main", line)
            .local("x", "int", Value::primitive(x.to_string()))
            .build()
    }

    #[test]
    fn test_history_keeps_one_transition_per_pair() {
        let mut history = TraceHistory::new();
        history.append(vec![counting_snapshot(1, 0), counting_snapshot(2, 1)]);
        history.append(vec![counting_snapshot(3, 1)]);

        assert_eq!(history.len(), 3);
        assert_eq!(history.transitions().len(), 2);
        assert_eq!(history.transitions()[0].state_index, 1);
        assert_eq!(history.transitions()[1].state_index, 2);
    }

    #[test]
    fn test_transition_records_the_departed_line() {
        let mut history = TraceHistory::new();
        history.append(vec![counting_snapshot(1, 0), counting_snapshot(2, 1)]);
        history.append(vec![counting_snapshot(3, 1)]);

        // A transition marks the line that was executed, not the line
        // arrived at.
        assert_eq!(history.transitions()[0].line, 1);
        assert_eq!(history.transitions()[1].line, 2);
        assert_eq!(history.transitions()[0].source_file_uri, "Main.java");
    }

    #[test]
    fn test_first_snapshot_is_all_changed() {
        let mut history = TraceHistory::new();
        history.append(vec![counting_snapshot(1, 0)]);
        let first = history.snapshot_at(0).unwrap();
        assert!(first.stack[0].local_variables[0].changed);
    }

    #[test]
    fn test_flags_diffed_across_append_batches() {
        let mut history = TraceHistory::new();
        history.append(vec![counting_snapshot(1, 0)]);
        // Same value as the batch before: unchanged despite the batch gap.
        history.append(vec![counting_snapshot(2, 0), counting_snapshot(3, 5)]);

        assert!(!history.snapshot_at(1).unwrap().stack[0].local_variables[0].changed);
        assert!(history.snapshot_at(2).unwrap().stack[0].local_variables[0].changed);
    }

    #[test]
    fn test_delta_does_not_touch_stored_flags() {
        let mut history = TraceHistory::new();
        history.append(vec![counting_snapshot(1, 0), counting_snapshot(2, 0)]);

        // Stored flag of snapshot 1 is false (0 -> 0); a delta from a
        // hypothetical different predecessor must not overwrite it.
        let delta = history.delta(0, 1).unwrap();
        assert!(!delta.snapshot.stack[0].local_variables[0].changed);
        assert!(!history.snapshot_at(1).unwrap().stack[0].local_variables[0].changed);

        let mut history2 = TraceHistory::new();
        history2.append(vec![counting_snapshot(1, 9), counting_snapshot(2, 0)]);
        let delta = history2.delta(0, 1).unwrap();
        assert!(delta.snapshot.stack[0].local_variables[0].changed);
    }

    #[test]
    fn test_live_and_replay_positions() {
        let mut history = TraceHistory::new();
        history.append(vec![counting_snapshot(1, 0), counting_snapshot(2, 1)]);
        assert!(history.is_replay(0));
        assert!(!history.is_live(0));
        assert!(history.is_live(1));
        assert!(!history.is_replay(1));
    }

    #[test]
    fn test_console_lines_accumulate_up_to_position() {
        let mut history = TraceHistory::new();
        history.append(vec![
            SnapshotBuilder::new("Main", 1).output("a\n").build(),
            SnapshotBuilder::new("Main", 2).output("b\n").build(),
            SnapshotBuilder::new("Main", 3).output("c\n").build(),
        ]);
        let lines = history.console_lines(1);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].output, "a\n");
        assert_eq!(lines[1].output, "b\n");
    }

    #[test]
    fn test_clear_discards_everything() {
        let mut history = TraceHistory::new();
        history.append(vec![counting_snapshot(1, 0)]);
        history.clear();
        assert!(history.is_empty());
        assert!(history.transitions().is_empty());
        // A fresh first snapshot is bootstrapped again.
        history.append(vec![counting_snapshot(1, 0)]);
        assert!(history.snapshot_at(0).unwrap().stack[0].local_variables[0].changed);
    }
}
