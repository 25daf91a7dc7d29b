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

//! Stepping intents and their target-reached predicates.

use retrace_common::types::Snapshot;

use crate::protocol::EngineCommand;

/// A stepping intent.
///
/// Each variant owns the predicate deciding whether a candidate snapshot
/// satisfies the intent. The same predicate is used in both modes: replay
/// scans recorded history forward until it holds, live forwards the task
/// to the execution engine, which steps until it holds (or the debuggee
/// ends).
///
/// Callers evaluate the predicate only on snapshots strictly after the
/// task's start snapshot; the start itself never counts as reaching the
/// target, which is what stops `RunToLine` from matching the line the
/// debuggee is already suspended at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepTask {
    /// Bootstrap pseudo-task for the very first snapshot of a session;
    /// immediately reached
    Start,
    /// Any forward movement reaches the target
    StepInto,
    /// Reached once the stack is back at or shallower than the depth the
    /// step started from
    StepOver {
        /// Stack depth when the step was requested
        reference_depth: usize,
    },
    /// Reached once the stack is strictly shallower than the depth the
    /// step started from
    StepOut {
        /// Stack depth when the step was requested
        reference_depth: usize,
    },
    /// Reached when the given line of the given class is active
    RunToLine {
        /// Target source line
        line: u32,
        /// Fully qualified class the line belongs to
        class_name: String,
    },
    /// Never reached by predicate; the task runs until the engine reports
    /// termination
    RunToEnd,
}

impl StepTask {
    /// Whether `candidate` satisfies this stepping intent.
    ///
    /// `candidate` must not be the snapshot the task started from.
    pub fn target_reached(&self, candidate: &Snapshot) -> bool {
        match self {
            Self::Start | Self::StepInto => true,
            Self::StepOver { reference_depth } => candidate.stack_depth() <= *reference_depth,
            Self::StepOut { reference_depth } => candidate.stack_depth() < *reference_depth,
            Self::RunToLine { line, class_name } => {
                candidate.line == *line
                    && candidate.top_frame().is_some_and(|frame| frame.class_name == *class_name)
            }
            Self::RunToEnd => false,
        }
    }

    /// The wire command requesting this task from an execution engine
    pub fn to_command(&self) -> EngineCommand {
        match self {
            Self::Start | Self::StepInto => EngineCommand::StepInto,
            Self::StepOver { reference_depth } => {
                EngineCommand::StepOver { reference_stack_depth: *reference_depth }
            }
            Self::StepOut { reference_depth } => {
                EngineCommand::StepOut { reference_stack_depth: *reference_depth }
            }
            Self::RunToLine { line, class_name } => {
                EngineCommand::RunToLine { line: *line, class_name: class_name.clone() }
            }
            Self::RunToEnd => EngineCommand::RunToEnd,
        }
    }
}
