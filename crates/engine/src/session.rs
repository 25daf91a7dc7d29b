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

//! The debug session state machine and its live/replay stepping loop.
//!
//! A session owns one [`ExecutionEngine`], one [`TraceHistory`], a cursor
//! into that history, and an undo stack of previous cursor positions.
//! Stepping forward first scans recorded history for a snapshot satisfying
//! the task (replay, no engine involved); only when the scan runs off the
//! live edge is the task forwarded to the engine. Stepping backward never
//! touches the engine at all.
//!
//! Caller misuse (stepping while the engine is busy, input when none is
//! expected, step-back on an empty undo stack) is answered with
//! [`StepOutcome::Ignored`] rather than an error; genuine failures are
//! [`EngineError`]s.

use std::future::Future;

use auto_impl::auto_impl;
use retrace_common::types::Snapshot;
use tracing::{debug, warn};

use crate::{
    error::{EngineError, MAX_STACK_DEPTH},
    history::{TraceData, TraceHistory},
    protocol::{EngineCommand, EngineRequest, EngineResponse, RequestId},
    task::StepTask,
};

/// Asynchronous boundary to whatever executes and observes the debuggee.
///
/// One request at a time: the session never issues a second request while
/// one is outstanding, and matches responses to requests by correlation
/// id. Implementations only need to move [`EngineRequest`]s in and
/// [`EngineResponse`]s out; process management and transport framing are
/// theirs to define.
#[auto_impl(&mut, Box)]
pub trait ExecutionEngine {
    /// Establish the connection to the engine
    fn connect(&mut self) -> impl Future<Output = Result<(), EngineError>>;

    /// Execute one command and return its response
    fn request(
        &mut self,
        request: EngineRequest,
    ) -> impl Future<Output = Result<EngineResponse, EngineError>>;

    /// Tear the engine down; the debuggee stops observing
    fn terminate(&mut self) -> impl Future<Output = Result<(), EngineError>>;
}

/// Lifecycle states of a debug session.
///
/// The predicate methods below are the interface the rest of the session
/// works against; the enum itself only names the distinguishable
/// combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No engine connection
    Initial,
    /// Connection being established
    Connecting,
    /// Connected, no debuggee launched
    Connected,
    /// Launch request outstanding
    Compiling,
    /// Debuggee suspended, ready for commands
    Running,
    /// A step request is outstanding
    Waiting,
    /// Debuggee blocked on stdin
    InputExpected,
    /// Debuggee terminated; history remains navigable
    Done,
}

impl SessionState {
    /// Whether an engine connection exists
    pub fn is_connected(&self) -> bool {
        !matches!(self, Self::Initial | Self::Connecting)
    }

    /// Whether a request is outstanding and commands must wait
    pub fn is_talking(&self) -> bool {
        matches!(self, Self::Connecting | Self::Compiling | Self::Waiting)
    }

    /// Whether a debuggee launch is in progress
    pub fn is_compiling(&self) -> bool {
        matches!(self, Self::Compiling)
    }

    /// Whether a debuggee has been launched at some point
    pub fn is_compiled(&self) -> bool {
        matches!(self, Self::Running | Self::Waiting | Self::InputExpected | Self::Done)
    }

    /// Whether the debuggee process is still alive
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running | Self::Waiting | Self::InputExpected)
    }

    /// Whether the debuggee is blocked on stdin
    pub fn is_input_expected(&self) -> bool {
        matches!(self, Self::InputExpected)
    }
}

/// What a forward or backward step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The target was found in recorded history; no engine traffic
    Replayed {
        /// New cursor position
        position: usize,
    },
    /// The engine executed the step and the history grew
    Stepped {
        /// New cursor position
        position: usize,
    },
    /// The debuggee blocked on stdin mid-step; send input to resume
    AwaitingInput,
    /// The request made no sense in the current state and was dropped
    Ignored,
}

/// One debug session: engine, history, cursor, and undo stack
#[derive(Debug)]
pub struct DebugSession<E> {
    engine: E,
    history: TraceHistory,
    position: usize,
    undo_stack: Vec<usize>,
    state: SessionState,
    next_request_id: RequestId,
    pending_task: Option<StepTask>,
    max_stack_depth: usize,
}

impl<E: ExecutionEngine> DebugSession<E> {
    /// A fresh session over an unconnected engine
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            history: TraceHistory::new(),
            position: 0,
            undo_stack: Vec::new(),
            state: SessionState::Initial,
            next_request_id: 1,
            pending_task: None,
            max_stack_depth: MAX_STACK_DEPTH,
        }
    }

    /// Override the runaway-recursion limit, mainly for tests
    pub fn with_max_stack_depth(mut self, limit: usize) -> Self {
        self.max_stack_depth = limit;
        self
    }

    /// Connect to the execution engine
    pub async fn connect(&mut self) -> Result<(), EngineError> {
        if self.state != SessionState::Initial {
            debug!(state = ?self.state, "connect ignored");
            return Ok(());
        }
        self.state = SessionState::Connecting;
        match self.engine.connect().await {
            Ok(()) => {
                self.state = SessionState::Connected;
                debug!("engine connected");
                Ok(())
            }
            Err(err) => {
                self.state = SessionState::Initial;
                Err(err)
            }
        }
    }

    /// Launch the debuggee and record its first snapshot.
    ///
    /// Discards any previous trace; relaunching from `Done` starts over.
    pub async fn launch(&mut self) -> Result<StepOutcome, EngineError> {
        if !self.state.is_connected() || self.state.is_talking() {
            debug!(state = ?self.state, "launch ignored");
            return Ok(StepOutcome::Ignored);
        }
        self.discard_trace();
        self.state = SessionState::Compiling;
        self.request_step(StepTask::Start).await
    }

    /// Step forward according to `task`, replaying history when possible
    pub async fn step(&mut self, task: StepTask) -> Result<StepOutcome, EngineError> {
        if !self.step_forward_enabled() {
            debug!(state = ?self.state, ?task, "step ignored");
            return Ok(StepOutcome::Ignored);
        }

        // Replay scan: walk recorded snapshots strictly after the cursor.
        // The live edge itself is a legal landing spot.
        let mut candidate = self.position;
        let mut reached = false;
        while candidate + 1 < self.history.len() {
            candidate += 1;
            // In bounds by the loop condition.
            let snapshot = self.history.snapshot_at(candidate).unwrap();
            if task.target_reached(snapshot) {
                reached = true;
                break;
            }
        }
        if reached {
            self.undo_stack.push(self.position);
            self.position = candidate;
            debug!(position = candidate, "step satisfied from history");
            return Ok(StepOutcome::Replayed { position: candidate });
        }

        // Past the live edge the engine has to run, which it cannot while
        // blocked on stdin.
        if self.state.is_input_expected() {
            debug!("step past the live edge ignored while input is expected");
            return Ok(StepOutcome::Ignored);
        }

        self.state = SessionState::Waiting;
        self.request_step(task).await
    }

    /// Deliver stdin text, resuming the step interrupted by an input wait
    pub async fn input(&mut self, text: &str) -> Result<StepOutcome, EngineError> {
        if !self.state.is_input_expected() || self.pending_task.is_none() || text.is_empty() {
            debug!(state = ?self.state, "input ignored");
            return Ok(StepOutcome::Ignored);
        }
        self.state = SessionState::Waiting;
        let id = self.fresh_request_id();
        let request = EngineRequest { id, command: EngineCommand::Input { text: text.into() } };
        let response = match self.engine.request(request).await {
            Ok(response) => response,
            Err(err) => {
                self.discard_trace();
                self.state = SessionState::Connected;
                return Err(err);
            }
        };
        self.handle_step_response(id, response).await
    }

    /// Move the cursor back to where it was before the last committed step
    pub fn step_back(&mut self) -> StepOutcome {
        if self.state.is_talking() {
            debug!(state = ?self.state, "step back ignored while talking");
            return StepOutcome::Ignored;
        }
        let Some(previous) = self.undo_stack.pop() else {
            debug!("step back ignored, nothing to undo");
            return StepOutcome::Ignored;
        };
        self.position = previous;
        StepOutcome::Replayed { position: previous }
    }

    /// Discard the recorded trace and return to `Connected`
    pub fn reset(&mut self) {
        if !self.state.is_connected() {
            debug!(state = ?self.state, "reset ignored");
            return;
        }
        self.discard_trace();
        self.state = SessionState::Connected;
    }

    /// Terminate the engine and return to `Initial`
    pub async fn disconnect(&mut self) -> Result<(), EngineError> {
        if self.state.is_connected() {
            self.engine.terminate().await?;
        }
        self.discard_trace();
        self.state = SessionState::Initial;
        Ok(())
    }

    /// One micro-step
    pub async fn step_into(&mut self) -> Result<StepOutcome, EngineError> {
        self.step(StepTask::StepInto).await
    }

    /// Step without descending into calls made by the current line
    pub async fn step_over(&mut self) -> Result<StepOutcome, EngineError> {
        let reference_depth = self.current_stack_depth();
        self.step(StepTask::StepOver { reference_depth }).await
    }

    /// Run until the current method returns
    pub async fn step_out(&mut self) -> Result<StepOutcome, EngineError> {
        let reference_depth = self.current_stack_depth();
        self.step(StepTask::StepOut { reference_depth }).await
    }

    /// Run until `line` of the currently active class is hit
    pub async fn run_to_line(&mut self, line: u32) -> Result<StepOutcome, EngineError> {
        let class_name = self
            .current_snapshot()
            .and_then(Snapshot::top_frame)
            .map(|frame| frame.class_name.clone())
            .unwrap_or_default();
        self.step(StepTask::RunToLine { line, class_name }).await
    }

    /// Run until the debuggee terminates
    pub async fn run_to_end(&mut self) -> Result<StepOutcome, EngineError> {
        self.step(StepTask::RunToEnd).await
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The recorded history
    pub fn history(&self) -> &TraceHistory {
        &self.history
    }

    /// The underlying engine
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Current cursor position within the history
    pub fn current_index(&self) -> usize {
        self.position
    }

    /// Snapshot under the cursor
    pub fn current_snapshot(&self) -> Option<&Snapshot> {
        self.history.snapshot_at(self.position)
    }

    /// Number of positions that can be stepped back through
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// The step interrupted by an input wait, if any
    pub fn pending_task(&self) -> Option<&StepTask> {
        self.pending_task.as_ref()
    }

    /// Whether the cursor sits on the newest recorded snapshot
    pub fn is_live(&self) -> bool {
        self.history.is_live(self.position)
    }

    /// Whether the debuggee has terminated and the cursor has nothing
    /// ahead of it
    pub fn has_reached_end(&self) -> bool {
        self.state.is_compiled()
            && !self.state.is_running()
            && !self.history.is_replay(self.position)
    }

    /// Whether a forward step would do anything right now
    pub fn step_forward_enabled(&self) -> bool {
        if self.state.is_talking() {
            return false;
        }
        self.state.is_running()
            || (self.state.is_compiled() && self.history.is_replay(self.position))
    }

    /// Whether a backward step would do anything right now
    pub fn step_back_enabled(&self) -> bool {
        !self.state.is_talking() && !self.undo_stack.is_empty()
    }

    /// Renderer bundle for the cursor position, diffed against the
    /// position a step back would land on
    pub fn current_trace_data(&self) -> Option<TraceData> {
        self.history.trace_data(self.position, self.undo_stack.last().copied())
    }

    fn current_stack_depth(&self) -> usize {
        self.current_snapshot().map(Snapshot::stack_depth).unwrap_or(0)
    }

    fn fresh_request_id(&mut self) -> RequestId {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    fn discard_trace(&mut self) {
        self.history.clear();
        self.undo_stack.clear();
        self.position = 0;
        self.pending_task = None;
    }

    async fn request_step(&mut self, task: StepTask) -> Result<StepOutcome, EngineError> {
        let id = self.fresh_request_id();
        let request = EngineRequest { id, command: task.to_command() };
        self.pending_task = Some(task);
        let response = match self.engine.request(request).await {
            Ok(response) => response,
            Err(err) => {
                self.discard_trace();
                self.state = SessionState::Connected;
                return Err(err);
            }
        };
        self.handle_step_response(id, response).await
    }

    /// Fold one engine response into history, cursor, and state
    async fn handle_step_response(
        &mut self,
        request_id: RequestId,
        response: EngineResponse,
    ) -> Result<StepOutcome, EngineError> {
        if response.id != request_id {
            warn!(expected = request_id, got = response.id, "correlation id mismatch");
            self.discard_trace();
            self.state = SessionState::Connected;
            return Err(EngineError::CorrelationMismatch {
                expected: request_id,
                got: response.id,
            });
        }

        let result = response.result;
        if let Some(depth) = result.trace_states.iter().map(Snapshot::stack_depth).max() {
            if depth > self.max_stack_depth {
                warn!(depth, limit = self.max_stack_depth, "stack depth limit exceeded");
                if let Err(err) = self.engine.terminate().await {
                    warn!(%err, "engine termination after runaway recursion failed");
                }
                self.discard_trace();
                self.state = SessionState::Connected;
                return Err(EngineError::StackDepthExceeded {
                    depth,
                    limit: self.max_stack_depth,
                });
            }
        }

        if result.is_waiting_for_input {
            // Step incomplete: record what arrived, keep the task pending,
            // and leave cursor and undo stack for the completion.
            self.history.append(result.trace_states);
            self.state = SessionState::InputExpected;
            debug!("debuggee blocked on stdin mid-step");
            return Ok(StepOutcome::AwaitingInput);
        }

        let vm_running = result.is_vm_running;
        if !result.trace_states.is_empty() {
            if !self.history.is_empty() {
                self.undo_stack.push(self.position);
            }
            self.history.append(result.trace_states);
            self.position = self.history.len() - 1;
        }
        self.pending_task = None;
        self.state = if vm_running { SessionState::Running } else { SessionState::Done };
        debug!(position = self.position, running = vm_running, "step committed");
        Ok(StepOutcome::Stepped { position: self.position })
    }
}
