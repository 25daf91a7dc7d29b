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

//! Heap items and the variables that point at them.

use serde::{Deserialize, Serialize};

use crate::types::{HeapId, Value};

/// A named variable slot: local variable, static field, or object field.
///
/// `changed` is inert raw data as far as this crate is concerned; the
/// engine's differ is the only writer, and it rewrites the flag exactly
/// once per snapshot transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Var {
    /// Variable or field name
    pub name: String,
    /// Declared type name
    #[serde(rename = "type")]
    pub ty: String,
    /// Current value
    pub value: Value,
    /// Whether the value differs from the previous snapshot
    #[serde(default)]
    pub changed: bool,
}

impl Var {
    /// Create a variable with an unset changed flag
    pub fn new(name: impl Into<String>, ty: impl Into<String>, value: Value) -> Self {
        Self { name: name.into(), ty: ty.into(), value, changed: false }
    }
}

/// One slot of a heap array.
///
/// Array elements are keyed by `(array_id, index)` rather than by name,
/// and carry their own changed flag independent of the owning array's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayElement {
    /// Id of the owning array
    pub array_id: HeapId,
    /// Declared element type name
    #[serde(rename = "type")]
    pub ty: String,
    /// Current value
    pub value: Value,
    /// Position within the array
    pub index: usize,
    /// Whether the value differs from the previous snapshot
    #[serde(default)]
    pub changed: bool,
}

/// An array on the heap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeapArray {
    /// Process-unique id
    pub id: HeapId,
    /// Declared type name (e.g. `int[]`)
    #[serde(rename = "type")]
    pub ty: String,
    /// Whether this item was synthesized after falling out of scope
    pub faked: bool,
    /// Elements in index order
    pub elements: Vec<ArrayElement>,
}

/// A string on the heap, together with its backing char array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeapString {
    /// Process-unique id
    pub id: HeapId,
    /// Declared type name
    #[serde(rename = "type")]
    pub ty: String,
    /// Whether this item was synthesized after falling out of scope
    pub faked: bool,
    /// Full string content, used for change detection
    pub string: String,
    /// Possibly shortened content for display
    pub viz_string: String,
    /// The backing char array, a reference-valued variable
    pub char_arr: Var,
}

/// A plain object on the heap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeapObject {
    /// Process-unique id
    pub id: HeapId,
    /// Declared type name
    #[serde(rename = "type")]
    pub ty: String,
    /// Whether this item was synthesized after falling out of scope
    pub faked: bool,
    /// Instance fields; static fields live on [`LoadedClass`](crate::types::LoadedClass)
    pub fields: Vec<Var>,
}

/// Anything reachable on the heap: an array, a string, or an object.
///
/// The `faked` flag marks items that existed before the currently visible
/// execution window and had to be synthesized when a frame holding the
/// only live reference was popped; without it, objects the program already
/// held would appear out of thin air when stepping out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum HeapItem {
    /// An array with element slots
    #[serde(rename = "HeapArray")]
    Array(HeapArray),
    /// A string plus its backing char array
    #[serde(rename = "HeapString")]
    Str(HeapString),
    /// An object with named fields
    #[serde(rename = "HeapObject")]
    Object(HeapObject),
}

impl HeapItem {
    /// Process-unique id of this item
    pub fn id(&self) -> HeapId {
        match self {
            Self::Array(array) => array.id,
            Self::Str(string) => string.id,
            Self::Object(object) => object.id,
        }
    }

    /// Declared type name of this item
    pub fn type_name(&self) -> &str {
        match self {
            Self::Array(array) => &array.ty,
            Self::Str(string) => &string.ty,
            Self::Object(object) => &object.ty,
        }
    }

    /// Whether this item was synthesized after falling out of scope
    pub fn faked(&self) -> bool {
        match self {
            Self::Array(array) => array.faked,
            Self::Str(string) => string.faked,
            Self::Object(object) => object.faked,
        }
    }

    /// Copy of this item with the `faked` flag set
    pub fn copy_as_faked(&self) -> Self {
        let mut copy = self.clone();
        match &mut copy {
            Self::Array(array) => array.faked = true,
            Self::Str(string) => string.faked = true,
            Self::Object(object) => object.faked = true,
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heap_item_wire_tags() {
        let item = HeapItem::Object(HeapObject {
            id: HeapId(1),
            ty: "Node".into(),
            faked: false,
            fields: vec![Var::new("next", "Node", Value::Null)],
        });
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["kind"], "HeapObject");
        assert_eq!(json["fields"][0]["type"], "Node");

        let back: HeapItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_copy_as_faked() {
        let item = HeapItem::Array(HeapArray {
            id: HeapId(9),
            ty: "int[]".into(),
            faked: false,
            elements: vec![],
        });
        let faked = item.copy_as_faked();
        assert!(faked.faked());
        assert!(!item.faked());
        assert_eq!(faked.id(), item.id());
    }
}
