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

//! Tagged value representation for variables, fields, and array slots.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Process-unique identifier of a heap item.
///
/// Assigned by the execution engine when the item is first observed and
/// stable for the lifetime of the debugged process.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct HeapId(pub u64);

impl fmt::Display for HeapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for HeapId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// The value slot of a variable, field, or array element.
///
/// Execution engines report every value in one of three shapes: a textual
/// primitive, a reference to a heap item by id, or null. Equality and
/// change semantics differ per variant; the engine crate's differ owns
/// those rules rather than `PartialEq` here, which is plain structural
/// equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Value {
    /// A primitive rendered as text by the engine (ints, chars, floats, ...)
    #[serde(rename = "PrimitiveVal", rename_all = "camelCase")]
    Primitive {
        /// Canonical textual representation used for comparisons
        primitive_value: String,
        /// Optional long-form representation shown on demand (e.g. full
        /// float mantissa when `primitive_value` is truncated)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    /// A reference to the heap item with the given id
    #[serde(rename = "ReferenceVal")]
    Reference {
        /// Target heap item id
        reference: HeapId,
    },
    /// The null reference
    #[serde(rename = "NullVal")]
    Null,
}

impl Value {
    /// Shorthand for a primitive value without a display title
    pub fn primitive(text: impl Into<String>) -> Self {
        Self::Primitive { primitive_value: text.into(), title: None }
    }

    /// Shorthand for a reference value
    pub fn reference(id: impl Into<HeapId>) -> Self {
        Self::Reference { reference: id.into() }
    }

    /// Target heap id if this is a reference
    pub fn as_reference(&self) -> Option<HeapId> {
        match self {
            Self::Reference { reference } => Some(*reference),
            _ => None,
        }
    }

    /// Whether this is the null reference
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}
