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

//! Core data types shared across Retrace components.
//!
//! Everything in here mirrors the JSON wire shapes produced by execution
//! engines: snapshots, stack frames, heap items, and tagged values. The
//! types are raw observations; derived data (changed flags aside) lives in
//! the engine crate.

mod heap;
mod snapshot;
mod stack;
mod value;

pub use heap::*;
pub use snapshot::*;
pub use stack::*;
pub use value::*;
