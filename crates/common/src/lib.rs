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

//! Retrace common - shared functionality for Retrace components
//!
//! This crate provides the raw execution data model shared by the replay
//! engine and any rendering client: snapshots, values, heap items, stack
//! frames, and the step-result envelope delivered by execution engines.

/// Common types used throughout Retrace including snapshots, values, and heap items
pub mod types;

/// Logging setup and utilities for consistent logging across Retrace components
pub mod logging;

pub use logging::*;
