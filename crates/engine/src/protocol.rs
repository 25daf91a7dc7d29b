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

//! Execution-engine request/response wire types.
//!
//! The engine is an opaque service: the session sends one command at a
//! time and receives the snapshots that command produced. Requests and
//! responses are matched by an explicit correlation id issued per request;
//! a response whose id does not match the outstanding request is a
//! protocol error.
//!
//! Transport framing (sockets, processes) is deliberately not part of this
//! crate; anything that can move these JSON shapes back and forth can act
//! as an engine.

use serde::{Deserialize, Serialize};

use retrace_common::types::StepResult;

/// Correlation id of an engine request
pub type RequestId = u64;

/// A single command understood by execution engines.
///
/// Serialized with a `task` discriminator in SCREAMING_CASE, the shape
/// debugger backends conventionally speak.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "task")]
pub enum EngineCommand {
    /// Advance by one micro-step
    #[serde(rename = "STEP_INTO")]
    StepInto,
    /// Run until the stack is back at or above `reference_stack_depth`
    #[serde(rename = "STEP_OVER", rename_all = "camelCase")]
    StepOver {
        /// Stack depth at the time the step was requested
        reference_stack_depth: usize,
    },
    /// Run until the stack is strictly above `reference_stack_depth`
    #[serde(rename = "STEP_OUT", rename_all = "camelCase")]
    StepOut {
        /// Stack depth at the time the step was requested
        reference_stack_depth: usize,
    },
    /// Run until the given line of the given class is active
    #[serde(rename = "RUN_TO_LINE", rename_all = "camelCase")]
    RunToLine {
        /// Target source line
        line: u32,
        /// Fully qualified class the line belongs to
        class_name: String,
    },
    /// Run until the debuggee terminates
    #[serde(rename = "RUN_TO_END")]
    RunToEnd,
    /// Deliver stdin text to a debuggee blocked on input
    #[serde(rename = "INPUT")]
    Input {
        /// The input text, newline included if intended
        text: String,
    },
}

/// An engine command tagged with its correlation id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineRequest {
    /// Correlation id, echoed by the matching response
    pub id: RequestId,
    /// The command to execute
    #[serde(flatten)]
    pub command: EngineCommand,
}

/// The engine's answer to one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineResponse {
    /// Correlation id of the request this answers
    pub id: RequestId,
    /// Snapshots produced plus run/input status
    #[serde(flatten)]
    pub result: StepResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_wire_tags() {
        let json = serde_json::to_value(EngineCommand::StepOver { reference_stack_depth: 2 })
            .unwrap();
        assert_eq!(json["task"], "STEP_OVER");
        assert_eq!(json["referenceStackDepth"], 2);

        let json = serde_json::to_value(EngineCommand::RunToLine {
            line: 14,
            class_name: "Main".into(),
        })
        .unwrap();
        assert_eq!(json["task"], "RUN_TO_LINE");
        assert_eq!(json["className"], "Main");
    }

    #[test]
    fn test_request_flattens_command() {
        let request =
            EngineRequest { id: 3, command: EngineCommand::Input { text: "7\n".into() } };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["task"], "INPUT");
        assert_eq!(json["text"], "7\n");

        let back: EngineRequest = serde_json::from_value(json).unwrap();
        assert_eq!(back, request);
    }
}
