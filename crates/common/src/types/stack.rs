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

//! Stack frames and per-class static state.

use serde::{Deserialize, Serialize};

use crate::types::{HeapId, Var};

/// A boolean condition evaluated so far in a frame.
///
/// Instrumented programs report every declared condition (loop guards,
/// if-conditions) together with its most recent outcome. The id is only
/// unique within one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionValue {
    /// Condition id within its source file
    pub id: u32,
    /// Source text of the condition
    pub expression: String,
    /// Most recent outcome
    pub value: bool,
    /// Whether the condition has been evaluated at all yet
    pub evaluated: bool,
}

/// An array-index access evaluated so far in a frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayAccessValue {
    /// Evaluated index per dimension
    pub index_values: Vec<i64>,
    /// Whether the access has been evaluated at all yet
    pub evaluated: bool,
    /// Id of the accessed array
    #[serde(rename = "arrayObjectID")]
    pub array_object_id: HeapId,
}

/// One frame of the call stack at observation time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    /// Line the frame is currently suspended at
    pub line: u32,
    /// Fully qualified class declaring the method
    #[serde(rename = "class")]
    pub class_name: String,
    /// Method name
    pub method: String,
    /// JNI-style method signature
    pub signature: String,
    /// Human-readable signature, e.g. `Person[] children(int i)`
    pub display_signature: String,
    /// Generic signature where one exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generic_signature: Option<String>,
    /// Local variables visible in the frame, parameters included
    pub local_variables: Vec<Var>,
    /// Declared conditions evaluated so far
    #[serde(default)]
    pub condition_values: Vec<ConditionValue>,
    /// Array-index accesses evaluated so far
    #[serde(default)]
    pub array_access_values: Vec<ArrayAccessValue>,
    /// `this` of the frame, absent in static methods
    #[serde(rename = "this", default, skip_serializing_if = "Option::is_none")]
    pub this_ref: Option<HeapId>,
    /// Whether the frame belongs to internal (filtered) code
    #[serde(default)]
    pub internal: bool,
}

/// A loaded class with its static fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedClass {
    /// Fully qualified class name
    #[serde(rename = "class")]
    pub class_name: String,
    /// Static fields in declaration order
    pub static_fields: Vec<Var>,
}
