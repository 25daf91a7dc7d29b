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

//! End-to-end session behavior against a scripted engine.

use retrace_engine::{
    error::EngineError,
    session::{DebugSession, SessionState, StepOutcome},
    testing::{ScriptedEngine, SnapshotBuilder},
};

fn line_tape(lines: &[u32]) -> Vec<retrace_common::types::Snapshot> {
    lines.iter().map(|&line| SnapshotBuilder::new("Main", line).build()).collect()
}

async fn launched(tape: Vec<retrace_common::types::Snapshot>) -> DebugSession<ScriptedEngine> {
    let mut session = DebugSession::new(ScriptedEngine::new(tape));
    session.connect().await.unwrap();
    let outcome = session.launch().await.unwrap();
    assert!(matches!(outcome, StepOutcome::Stepped { position: 0 }));
    session
}

#[tokio::test]
async fn test_launch_records_first_snapshot() {
    let session = launched(line_tape(&[1, 2, 3])).await;
    assert_eq!(session.state(), SessionState::Running);
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.current_index(), 0);
    assert_eq!(session.current_snapshot().unwrap().line, 1);
    assert!(session.is_live());
}

#[tokio::test]
async fn test_commands_before_connect_are_ignored() {
    let mut session = DebugSession::new(ScriptedEngine::new(line_tape(&[1])));
    assert!(matches!(session.launch().await.unwrap(), StepOutcome::Ignored));
    assert!(matches!(session.step_into().await.unwrap(), StepOutcome::Ignored));
    assert!(matches!(session.input("x\n").await.unwrap(), StepOutcome::Ignored));
    assert!(matches!(session.step_back(), StepOutcome::Ignored));
    assert_eq!(session.state(), SessionState::Initial);
}

#[tokio::test]
async fn test_live_steps_grow_history_and_track_the_edge() {
    let mut session = launched(line_tape(&[1, 2, 3])).await;

    assert!(matches!(session.step_into().await.unwrap(), StepOutcome::Stepped { position: 1 }));
    assert!(matches!(session.step_into().await.unwrap(), StepOutcome::Stepped { position: 2 }));
    assert_eq!(session.history().len(), 3);
    assert!(session.is_live());
    assert!(session.current_index() < session.history().len());

    // Tape exhausted: the next step reports termination without snapshots.
    assert!(matches!(session.step_into().await.unwrap(), StepOutcome::Stepped { position: 2 }));
    assert_eq!(session.state(), SessionState::Done);
    assert!(session.has_reached_end());
    assert!(!session.step_forward_enabled());
}

#[tokio::test]
async fn test_replay_never_grows_history_or_talks_to_the_engine() {
    let mut session = launched(line_tape(&[1, 2, 3, 4])).await;
    session.run_to_end().await.unwrap();
    assert_eq!(session.history().len(), 4);
    let requests_so_far = session.engine().requests.len();

    assert!(matches!(session.step_back(), StepOutcome::Replayed { position: 0 }));
    assert!(matches!(session.step_into().await.unwrap(), StepOutcome::Replayed { position: 1 }));
    assert!(matches!(session.step_into().await.unwrap(), StepOutcome::Replayed { position: 2 }));

    assert_eq!(session.history().len(), 4);
    assert_eq!(session.engine().requests.len(), requests_so_far);
    assert!(session.current_index() < session.history().len());
}

#[tokio::test]
async fn test_undo_stack_is_lifo() {
    let mut session = launched(line_tape(&[1, 2, 3, 4])).await;
    session.step_into().await.unwrap();
    session.step_into().await.unwrap();
    session.step_into().await.unwrap();
    assert_eq!(session.undo_depth(), 3);

    assert!(matches!(session.step_back(), StepOutcome::Replayed { position: 2 }));
    assert!(matches!(session.step_back(), StepOutcome::Replayed { position: 1 }));
    assert!(matches!(session.step_back(), StepOutcome::Replayed { position: 0 }));
    assert!(matches!(session.step_back(), StepOutcome::Ignored));
    assert_eq!(session.undo_depth(), 0);
}

#[tokio::test]
async fn test_run_to_line_scans_strictly_forward() {
    // Line 3 occurs twice; standing on its first occurrence must find the
    // second, never re-match the current position.
    let mut session = launched(line_tape(&[1, 3, 5, 3])).await;
    session.run_to_end().await.unwrap();
    session.step_back();
    assert_eq!(session.current_index(), 0);

    assert!(matches!(
        session.run_to_line(3).await.unwrap(),
        StepOutcome::Replayed { position: 1 }
    ));
    assert!(matches!(
        session.run_to_line(3).await.unwrap(),
        StepOutcome::Replayed { position: 3 }
    ));
}

#[tokio::test]
async fn test_input_wait_pauses_and_input_resumes_the_step() {
    let tape = vec![
        SnapshotBuilder::new("Main", 1).build(),
        SnapshotBuilder::new("Main", 2).output("enter n: ").build(),
        SnapshotBuilder::new("Main", 3).input("5\n").build(),
    ];
    let engine = ScriptedEngine::new(tape).wait_for_input_before(2);
    let mut session = DebugSession::new(engine);
    session.connect().await.unwrap();
    session.launch().await.unwrap();

    let outcome = session.run_to_end().await.unwrap();
    assert!(matches!(outcome, StepOutcome::AwaitingInput));
    assert_eq!(session.state(), SessionState::InputExpected);
    // The partial snapshot is recorded even though the step is incomplete.
    assert_eq!(session.history().len(), 2);

    // Past the live edge the engine would have to run; blocked on stdin
    // that is refused.
    assert!(matches!(session.run_to_end().await.unwrap(), StepOutcome::Ignored));
    // Empty input is refused too.
    assert!(matches!(session.input("").await.unwrap(), StepOutcome::Ignored));

    let outcome = session.input("5\n").await.unwrap();
    assert!(matches!(outcome, StepOutcome::Stepped { position: 2 }));
    assert_eq!(session.state(), SessionState::Done);
    assert_eq!(session.history().len(), 3);
    assert_eq!(session.current_snapshot().unwrap().input, "5\n");
}

#[tokio::test]
async fn test_correlation_mismatch_is_a_protocol_error() {
    let mut engine = ScriptedEngine::new(line_tape(&[1, 2]));
    engine.response_id_skew = 1;
    let mut session = DebugSession::new(engine);
    session.connect().await.unwrap();

    let err = session.launch().await.unwrap_err();
    assert!(matches!(err, EngineError::CorrelationMismatch { .. }));
    assert!(!err.is_fatal());
    // The trace is discarded and the session is back to a usable state.
    assert_eq!(session.state(), SessionState::Connected);
    assert!(session.history().is_empty());
    assert_eq!(session.undo_depth(), 0);
}

#[tokio::test]
async fn test_runaway_recursion_terminates_the_engine() {
    let deep = SnapshotBuilder::new("Main", 1)
        .push_frame("Main", "recurse", 5)
        .push_frame("Main", "recurse", 5)
        .build();
    let mut session =
        DebugSession::new(ScriptedEngine::new(vec![deep])).with_max_stack_depth(2);
    session.connect().await.unwrap();

    let err = session.launch().await.unwrap_err();
    assert!(matches!(err, EngineError::StackDepthExceeded { depth: 3, limit: 2 }));
    assert!(err.is_fatal());
    assert!(session.engine().terminated());
    assert!(session.history().is_empty());
    assert_eq!(session.state(), SessionState::Connected);
}

#[tokio::test]
async fn test_reset_discards_history_atomically() {
    let mut session = launched(line_tape(&[1, 2, 3])).await;
    session.step_into().await.unwrap();
    assert_eq!(session.history().len(), 2);
    assert_eq!(session.undo_depth(), 1);

    session.reset();
    assert_eq!(session.state(), SessionState::Connected);
    assert!(session.history().is_empty());
    assert_eq!(session.undo_depth(), 0);
    assert_eq!(session.current_index(), 0);
    assert!(!session.engine().terminated());

    // A fresh launch starts a fresh trace.
    session.launch().await.unwrap();
    assert_eq!(session.history().len(), 1);
}

#[tokio::test]
async fn test_disconnect_terminates_and_returns_to_initial() {
    let mut session = launched(line_tape(&[1])).await;
    session.disconnect().await.unwrap();
    assert_eq!(session.state(), SessionState::Initial);
    assert!(session.engine().terminated());
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn test_trace_data_carries_console_and_delta() {
    let tape = vec![
        SnapshotBuilder::new("Main", 1).output("hello\n").build(),
        SnapshotBuilder::new("Main", 2).output("world\n").build(),
    ];
    let mut session = launched(tape).await;
    session.step_into().await.unwrap();

    let data = session.current_trace_data().unwrap();
    assert_eq!(data.state_index, 1);
    assert_eq!(data.console_lines.len(), 2);
    assert_eq!(data.console_lines[1].output, "world\n");
    let delta = data.delta.unwrap();
    assert_eq!(delta.from_index, 0);
    assert_eq!(delta.to_index, 1);
}
