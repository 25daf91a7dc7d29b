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

//! Retrace engine - debug session and trace replay core.
//!
//! This crate maintains an append-only history of raw execution snapshots
//! and drives stepping over it in two modes: replay (re-walking recorded
//! snapshots without touching the execution engine) and live (forwarding a
//! step task to the engine and appending what comes back). For every pair
//! of consecutive snapshots it computes per-entity changed flags, and for
//! any snapshot it can build the cycle-safe heap reachability graph used
//! for incremental rendering.

pub mod diff;
pub use diff::*;

pub mod error;
pub use error::*;

pub mod graph;
pub use graph::*;

pub mod history;
pub use history::*;

pub mod protocol;
pub use protocol::*;

pub mod session;
pub use session::*;

pub mod task;
pub use task::*;

pub mod testing;
