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

//! Test fixtures: a snapshot builder and a scripted in-memory engine.
//!
//! Compiled into the crate (not behind `cfg(test)`) so integration tests
//! and downstream crates can drive a [`DebugSession`] without a real
//! debuggee process.
//!
//! [`DebugSession`]: crate::session::DebugSession

use std::collections::HashSet;

use retrace_common::types::{
    ArrayElement, HeapArray, HeapId, HeapItem, HeapObject, HeapString, InputBufferInfo, LoadedClass,
    Snapshot, StackFrame, StepResult, Value, Var,
};

use crate::{
    error::EngineError,
    protocol::{EngineCommand, EngineRequest, EngineResponse},
    session::ExecutionEngine,
    task::StepTask,
};

/// Fluent builder for hand-made snapshots.
///
/// Starts with a single `main` frame of the given class; `push_frame`
/// stacks callees on top (the stack is innermost-first). Variable and
/// heap helpers always target the innermost frame.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    snapshot: Snapshot,
}

impl SnapshotBuilder {
    /// A snapshot suspended in `class_name.main` at `line`
    pub fn new(class_name: &str, line: u32) -> Self {
        let snapshot = Snapshot {
            source_file_uri: format!("{class_name}.java"),
            line,
            stack: vec![frame(class_name, "main", line)],
            heap: Vec::new(),
            loaded_classes: Vec::new(),
            output: String::new(),
            error: String::new(),
            input: String::new(),
            input_buffer_info: InputBufferInfo::empty(),
        };
        Self { snapshot }
    }

    /// Push a callee frame; the snapshot's active line moves with it
    pub fn push_frame(mut self, class_name: &str, method: &str, line: u32) -> Self {
        self.snapshot.stack.insert(0, frame(class_name, method, line));
        self.snapshot.line = line;
        self
    }

    /// Add a local variable to the innermost frame
    pub fn local(mut self, name: &str, ty: &str, value: Value) -> Self {
        let innermost = self.snapshot.stack.first_mut().unwrap();
        innermost.local_variables.push(Var::new(name, ty, value));
        self
    }

    /// Add a static field, creating the loaded class on first use
    pub fn static_field(mut self, class_name: &str, name: &str, value: Value) -> Self {
        let class = match self
            .snapshot
            .loaded_classes
            .iter_mut()
            .find(|class| class.class_name == class_name)
        {
            Some(class) => class,
            None => {
                self.snapshot.loaded_classes.push(LoadedClass {
                    class_name: class_name.into(),
                    static_fields: Vec::new(),
                });
                self.snapshot.loaded_classes.last_mut().unwrap()
            }
        };
        class.static_fields.push(Var::new(name, "int", value));
        self
    }

    /// Add a heap object with the given named fields
    pub fn object_with_fields(
        mut self,
        id: u64,
        ty: &str,
        fields: Vec<(&str, &str, Value)>,
    ) -> Self {
        self.snapshot.heap.push(HeapItem::Object(HeapObject {
            id: HeapId(id),
            ty: ty.into(),
            faked: false,
            fields: fields
                .into_iter()
                .map(|(name, ty, value)| Var::new(name, ty, value))
                .collect(),
        }));
        self
    }

    /// Add an int array with the given element values
    pub fn int_array(mut self, id: u64, values: &[i64]) -> Self {
        self.snapshot.heap.push(HeapItem::Array(HeapArray {
            id: HeapId(id),
            ty: "int[]".into(),
            faked: false,
            elements: values
                .iter()
                .enumerate()
                .map(|(index, value)| ArrayElement {
                    array_id: HeapId(id),
                    ty: "int".into(),
                    value: Value::primitive(value.to_string()),
                    index,
                    changed: false,
                })
                .collect(),
        }));
        self
    }

    /// Add a heap string together with its backing char array.
    ///
    /// Backing elements carry char codes as primitive text, the way
    /// engines report characters.
    pub fn string(mut self, id: u64, content: &str, backing_id: u64) -> Self {
        self.snapshot.heap.push(HeapItem::Str(HeapString {
            id: HeapId(id),
            ty: "String".into(),
            faked: false,
            string: content.into(),
            viz_string: content.into(),
            char_arr: Var::new("value", "char[]", Value::reference(backing_id)),
        }));
        self.snapshot.heap.push(HeapItem::Array(HeapArray {
            id: HeapId(backing_id),
            ty: "char[]".into(),
            faked: false,
            elements: content
                .chars()
                .enumerate()
                .map(|(index, ch)| ArrayElement {
                    array_id: HeapId(backing_id),
                    ty: "char".into(),
                    value: Value::primitive((ch as u32).to_string()),
                    index,
                    changed: false,
                })
                .collect(),
        }));
        self
    }

    /// Set the stdout attributed to this snapshot
    pub fn output(mut self, text: &str) -> Self {
        self.snapshot.output = text.into();
        self
    }

    /// Set the stdin consumed by this snapshot
    pub fn input(mut self, text: &str) -> Self {
        self.snapshot.input = text.into();
        self
    }

    /// Finish and return the snapshot
    pub fn build(self) -> Snapshot {
        self.snapshot
    }
}

fn frame(class_name: &str, method: &str, line: u32) -> StackFrame {
    StackFrame {
        line,
        class_name: class_name.into(),
        method: method.into(),
        signature: "()V".into(),
        display_signature: format!("void {method}()"),
        generic_signature: None,
        local_variables: Vec::new(),
        condition_values: Vec::new(),
        array_access_values: Vec::new(),
        this_ref: None,
        internal: false,
    }
}

/// An in-memory execution engine replaying a pre-recorded tape.
///
/// Each request consumes snapshots from the tape one at a time until the
/// requested task's target predicate holds, the tape ends (debuggee
/// terminated), or a scripted wait point is hit (debuggee blocked on
/// stdin; the interrupted task resumes on the next `INPUT` request).
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    tape: Vec<Snapshot>,
    cursor: usize,
    wait_before: HashSet<usize>,
    pending: Option<StepTask>,
    /// Added to every response's correlation id; non-zero simulates a
    /// misbehaving engine
    pub response_id_skew: u64,
    /// Every request received, in order
    pub requests: Vec<EngineRequest>,
    connected: bool,
    terminated: bool,
}

impl ScriptedEngine {
    /// An engine that will play back the given snapshots in order
    pub fn new(tape: Vec<Snapshot>) -> Self {
        Self { tape, ..Default::default() }
    }

    /// Block on stdin immediately before delivering tape index `index`
    pub fn wait_for_input_before(mut self, index: usize) -> Self {
        self.wait_before.insert(index);
        self
    }

    /// Whether [`ExecutionEngine::terminate`] has been called
    pub fn terminated(&self) -> bool {
        self.terminated
    }

    fn run(&mut self, task: StepTask) -> StepResult {
        let mut delivered = Vec::new();
        loop {
            if self.cursor >= self.tape.len() {
                return StepResult {
                    trace_states: delivered,
                    is_waiting_for_input: false,
                    is_vm_running: false,
                };
            }
            if self.wait_before.remove(&self.cursor) {
                self.pending = Some(task);
                return StepResult {
                    trace_states: delivered,
                    is_waiting_for_input: true,
                    is_vm_running: true,
                };
            }
            let snapshot = self.tape[self.cursor].clone();
            self.cursor += 1;
            let reached = task.target_reached(&snapshot);
            delivered.push(snapshot);
            if reached {
                return StepResult {
                    trace_states: delivered,
                    is_waiting_for_input: false,
                    is_vm_running: true,
                };
            }
        }
    }
}

impl ExecutionEngine for ScriptedEngine {
    async fn connect(&mut self) -> Result<(), EngineError> {
        self.connected = true;
        Ok(())
    }

    async fn request(&mut self, request: EngineRequest) -> Result<EngineResponse, EngineError> {
        if !self.connected {
            return Err(EngineError::Transport("not connected".into()));
        }
        self.requests.push(request.clone());
        let task = match &request.command {
            EngineCommand::StepInto => StepTask::StepInto,
            EngineCommand::StepOver { reference_stack_depth } => {
                StepTask::StepOver { reference_depth: *reference_stack_depth }
            }
            EngineCommand::StepOut { reference_stack_depth } => {
                StepTask::StepOut { reference_depth: *reference_stack_depth }
            }
            EngineCommand::RunToLine { line, class_name } => {
                StepTask::RunToLine { line: *line, class_name: class_name.clone() }
            }
            EngineCommand::RunToEnd => StepTask::RunToEnd,
            EngineCommand::Input { .. } => self.pending.take().ok_or_else(|| {
                EngineError::Protocol("input sent while not blocked on stdin".into())
            })?,
        };
        let result = self.run(task);
        Ok(EngineResponse { id: request.id + self.response_id_skew, result })
    }

    async fn terminate(&mut self) -> Result<(), EngineError> {
        self.terminated = true;
        self.connected = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_engine_steps_one_snapshot_per_step_into() {
        let tape = vec![
            SnapshotBuilder::new("Main", 1).build(),
            SnapshotBuilder::new("Main", 2).build(),
        ];
        let mut engine = ScriptedEngine::new(tape);
        engine.connect().await.unwrap();

        let response = engine
            .request(EngineRequest { id: 1, command: EngineCommand::StepInto })
            .await
            .unwrap();
        assert_eq!(response.result.trace_states.len(), 1);
        assert_eq!(response.result.trace_states[0].line, 1);
        assert!(response.result.is_vm_running);
    }

    #[tokio::test]
    async fn test_scripted_engine_reports_termination_at_tape_end() {
        let mut engine = ScriptedEngine::new(vec![SnapshotBuilder::new("Main", 1).build()]);
        engine.connect().await.unwrap();

        let response = engine
            .request(EngineRequest { id: 1, command: EngineCommand::RunToEnd })
            .await
            .unwrap();
        assert_eq!(response.result.trace_states.len(), 1);
        assert!(!response.result.is_vm_running);
    }

    #[tokio::test]
    async fn test_wait_point_interrupts_and_input_resumes() {
        let tape = vec![
            SnapshotBuilder::new("Main", 1).build(),
            SnapshotBuilder::new("Main", 2).build(),
        ];
        let mut engine = ScriptedEngine::new(tape).wait_for_input_before(1);
        engine.connect().await.unwrap();

        // Running to the end stops at the wait point.
        let response = engine
            .request(EngineRequest { id: 1, command: EngineCommand::RunToEnd })
            .await
            .unwrap();
        assert_eq!(response.result.trace_states.len(), 1);
        assert!(response.result.is_waiting_for_input);
        assert!(response.result.is_vm_running);

        // Input resumes the interrupted run.
        let response = engine
            .request(EngineRequest { id: 2, command: EngineCommand::Input { text: "7\n".into() } })
            .await
            .unwrap();
        assert_eq!(response.result.trace_states.len(), 1);
        assert!(!response.result.is_vm_running);
    }
}
