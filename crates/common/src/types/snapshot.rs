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

//! Raw execution snapshots and the step-result envelope delivering them.

use serde::{Deserialize, Serialize};

use crate::types::{HeapId, HeapItem, LoadedClass, StackFrame};

/// Bookkeeping on how far the debuggee has consumed its input buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputBufferInfo {
    /// Input already consumed
    pub past: String,
    /// Buffered input not yet consumed
    pub future: String,
    /// Whether the input stream has been closed
    pub done: bool,
    /// Most recently parsed value
    pub latest_value: String,
    /// Name of the read method that produced `latest_value`
    pub latest_method: String,
    /// False when input tracing failed and the fields above are unreliable
    pub trace_success: bool,
}

impl InputBufferInfo {
    /// Bookkeeping for a program that has not read any input yet
    pub fn empty() -> Self {
        Self {
            past: String::new(),
            future: String::new(),
            done: false,
            latest_value: "no value".into(),
            latest_method: "no method called".into(),
            trace_success: true,
        }
    }

    /// Bookkeeping when input tracing failed
    pub fn failed() -> Self {
        Self { trace_success: false, ..Self::empty() }
    }
}

impl Default for InputBufferInfo {
    fn default() -> Self {
        Self::empty()
    }
}

/// Console traffic attributed to a single snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleLine {
    /// Stdin consumed since the previous snapshot
    pub input: String,
    /// Stdout produced since the previous snapshot
    pub output: String,
    /// Stderr produced since the previous snapshot
    pub error: String,
}

/// One raw observation of program state at a micro-step.
///
/// Snapshots are produced by the execution engine and never mutated after
/// creation, with one exception: the changed flags on contained [`Var`]s
/// and array elements, which the engine crate's differ rewrites exactly
/// once when the snapshot becomes the `next` half of a transition.
///
/// The stack is ordered innermost-first, matching the engine's delivery
/// order; components that need stable frame numbering across push/pop
/// renumber logically from the outermost end.
///
/// [`Var`]: crate::types::Var
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// URI of the source file the active line belongs to
    pub source_file_uri: String,
    /// Currently active source line
    pub line: u32,
    /// Call stack, innermost frame first
    pub stack: Vec<StackFrame>,
    /// Heap items reachable at observation time
    pub heap: Vec<HeapItem>,
    /// Loaded classes with their static fields
    pub loaded_classes: Vec<LoadedClass>,
    /// Stdout produced since the previous snapshot
    #[serde(default)]
    pub output: String,
    /// Stderr produced since the previous snapshot
    #[serde(default)]
    pub error: String,
    /// Stdin consumed since the previous snapshot
    #[serde(default)]
    pub input: String,
    /// Input-buffer bookkeeping at observation time
    #[serde(default)]
    pub input_buffer_info: InputBufferInfo,
}

impl Snapshot {
    /// Number of frames on the call stack
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Innermost stack frame, if the stack is non-empty
    pub fn top_frame(&self) -> Option<&StackFrame> {
        self.stack.first()
    }

    /// Look up a heap item by id
    pub fn find_heap_item(&self, id: HeapId) -> Option<&HeapItem> {
        self.heap.iter().find(|item| item.id() == id)
    }

    /// Console traffic attributed to this snapshot
    pub fn console_line(&self) -> ConsoleLine {
        ConsoleLine {
            input: self.input.clone(),
            output: self.output.clone(),
            error: self.error.clone(),
        }
    }
}

/// Everything an execution engine returns for one step request.
///
/// A result with no snapshots and `is_waiting_for_input` set means the
/// step is incomplete: the debuggee blocked on stdin mid-step, and the
/// step resumes once input is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    /// Snapshots recorded during the step, in execution order
    pub trace_states: Vec<Snapshot>,
    /// Whether the debuggee is blocked on stdin
    #[serde(default)]
    pub is_waiting_for_input: bool,
    /// Whether the debuggee is still running
    #[serde(rename = "isVMRunning", default)]
    pub is_vm_running: bool,
}

impl StepResult {
    /// A result carrying a single snapshot
    pub fn single(snapshot: Snapshot) -> Self {
        Self { trace_states: vec![snapshot], is_waiting_for_input: false, is_vm_running: true }
    }

    /// Combine two partial results of the same logical step
    pub fn merge(self, next: Self) -> Self {
        let mut trace_states = self.trace_states;
        trace_states.extend(next.trace_states);
        Self {
            trace_states,
            is_waiting_for_input: self.is_waiting_for_input || next.is_waiting_for_input,
            is_vm_running: self.is_vm_running && next.is_vm_running,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(line: u32) -> Snapshot {
        Snapshot {
            source_file_uri: "Main.java".into(),
            line,
            stack: vec![],
            heap: vec![],
            loaded_classes: vec![],
            output: String::new(),
            error: String::new(),
            input: String::new(),
            input_buffer_info: InputBufferInfo::empty(),
        }
    }

    #[test]
    fn test_step_result_merge() {
        let running = StepResult::single(snapshot(1));
        let finished = StepResult {
            trace_states: vec![snapshot(2), snapshot(3)],
            is_waiting_for_input: true,
            is_vm_running: false,
        };
        let merged = running.merge(finished);
        assert_eq!(merged.trace_states.len(), 3);
        assert!(merged.is_waiting_for_input);
        assert!(!merged.is_vm_running);
    }

    #[test]
    fn test_step_result_wire_shape() {
        let result = StepResult::single(snapshot(4));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["traceStates"][0]["line"], 4);
        assert_eq!(json["isVMRunning"], true);
        assert_eq!(json["isWaitingForInput"], false);
    }
}
