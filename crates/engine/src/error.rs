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

//! Error taxonomy of the replay engine.
//!
//! Only genuine failures surface as errors: transport trouble, protocol
//! violations by the execution engine, and the fatal stack-depth limit.
//! Caller misuse (stepping while disconnected, unsolicited input) is a
//! defensive no-op reported through
//! [`StepOutcome::Ignored`](crate::session::StepOutcome::Ignored), never
//! an error.

use thiserror::Error;

/// Maximum call-stack depth the session tolerates before declaring the
/// debuggee runaway and terminating the engine
pub const MAX_STACK_DEPTH: usize = 100;

/// Failures surfaced by a debug session or its execution engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// The connection to the execution engine failed or dropped
    #[error("engine transport error: {0}")]
    Transport(String),

    /// The engine sent a malformed or unexpected response; the session
    /// discards its trace and resets to `Connected`
    #[error("engine protocol error: {0}")]
    Protocol(String),

    /// A response carried a correlation id that does not match the
    /// outstanding request
    #[error("response correlation id {got} does not match request id {expected}")]
    CorrelationMismatch {
        /// Id of the outstanding request
        expected: u64,
        /// Id carried by the response
        got: u64,
    },

    /// A delivered snapshot exceeded the stack-depth limit; fatal, the
    /// engine process is terminated and the session resets
    #[error("maximum stack depth ({limit}) exceeded: snapshot has {depth} frames")]
    StackDepthExceeded {
        /// Observed stack depth
        depth: usize,
        /// The configured limit
        limit: usize,
    },
}

impl EngineError {
    /// Whether the error requires terminating the engine process
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::StackDepthExceeded { .. })
    }
}
