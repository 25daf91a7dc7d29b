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

//! Changed-flag computation between two consecutive snapshots.
//!
//! [`diff_pair`] is the only writer of the changed flags carried by
//! variables, fields, and array elements: it resets and rewrites the
//! flags of the `next` snapshot exactly once against its predecessor.
//! Matching keys are chosen to stay stable while leaf frames are pushed
//! and popped: locals match by (logical frame depth from the outermost
//! end, name), statics by (declaring class, name), object fields by
//! (owner id, name), array elements by (array id, index), and string
//! backing arrays by name.

use std::collections::HashMap;

use retrace_common::types::{HeapItem, Snapshot, Value, Var};

/// Compute the changed flags of `next` against `previous`.
///
/// Mutates only the changed flags of `next`; every other field of both
/// snapshots is left untouched.
pub fn diff_pair(previous: &Snapshot, next: &mut Snapshot) {
    diff_locals(previous, next);
    diff_statics(previous, next);
    diff_object_fields(previous, next);
    diff_string_char_arrays(previous, next);
    diff_array_elements(previous, next);
}

/// Force every local, static, and object field of a snapshot to changed.
///
/// Bootstrap rule for the first snapshot of a fresh history: there is no
/// meaningful previous state to compare against, so everything counts as
/// newly appeared.
pub fn mark_all_changed(snapshot: &mut Snapshot) {
    for frame in &mut snapshot.stack {
        for var in &mut frame.local_variables {
            var.changed = true;
        }
    }
    for class in &mut snapshot.loaded_classes {
        for field in &mut class.static_fields {
            field.changed = true;
        }
    }
    for item in &mut snapshot.heap {
        if let HeapItem::Object(object) = item {
            for field in &mut object.fields {
                field.changed = true;
            }
        }
    }
}

/// The per-Value-kind change rule, applied previous→next.
///
/// References resolve both sides against their own heaps: one dangling
/// side is a change, two dangling sides are not, differing item kinds
/// are, and same-kind items compare by id (objects, arrays) or content
/// (strings). Element-level differences are deliberately not folded into
/// an array's own flag; elements carry independent flags keyed by
/// (array id, index).
pub fn value_changed(
    previous: &Value,
    previous_heap: &[HeapItem],
    next: &Value,
    next_heap: &[HeapItem],
) -> bool {
    match (previous, next) {
        (Value::Null, Value::Null) => false,
        (
            Value::Primitive { primitive_value: prev_text, .. },
            Value::Primitive { primitive_value: next_text, .. },
        ) => prev_text != next_text,
        (Value::Reference { reference: prev_id }, Value::Reference { reference: next_id }) => {
            let prev_item = previous_heap.iter().find(|item| item.id() == *prev_id);
            let next_item = next_heap.iter().find(|item| item.id() == *next_id);
            match (prev_item, next_item) {
                (None, None) => false,
                (None, Some(_)) | (Some(_), None) => true,
                (Some(HeapItem::Object(prev)), Some(HeapItem::Object(next))) => {
                    prev.id != next.id
                }
                (Some(HeapItem::Str(prev)), Some(HeapItem::Str(next))) => {
                    prev.string != next.string
                }
                (Some(HeapItem::Array(prev)), Some(HeapItem::Array(next))) => prev.id != next.id,
                (Some(_), Some(_)) => true,
            }
        }
        // Kind changed, e.g. Null -> Reference
        _ => true,
    }
}

fn diff_locals(previous: &Snapshot, next: &mut Snapshot) {
    // Logical frame numbering from the outermost end keeps a variable's
    // key stable while calls are pushed and popped above it.
    let mut previous_locals: HashMap<(usize, &str), &Var> = HashMap::new();
    for (logical, frame) in previous.stack.iter().rev().enumerate() {
        for var in &frame.local_variables {
            previous_locals.insert((logical, var.name.as_str()), var);
        }
    }

    let previous_depth = previous.stack.len();
    let next_depth = next.stack.len();
    let Snapshot { stack, heap, .. } = next;
    let next_heap: &[HeapItem] = heap;

    for (logical, frame) in stack.iter_mut().rev().enumerate() {
        for var in &mut frame.local_variables {
            var.changed = match previous_locals.get(&(logical, var.name.as_str())) {
                Some(previous_var) => {
                    value_changed(&previous_var.value, &previous.heap, &var.value, next_heap)
                }
                None => true,
            };
        }
    }

    // A grown stack means the innermost frame is a fresh call: its locals
    // are parameters, not comparable to anything in the previous state.
    if next_depth > previous_depth {
        if let Some(frame) = stack.first_mut() {
            for var in &mut frame.local_variables {
                var.changed = true;
            }
        }
    }
}

fn diff_statics(previous: &Snapshot, next: &mut Snapshot) {
    let mut previous_statics: HashMap<(&str, &str), &Var> = HashMap::new();
    for class in &previous.loaded_classes {
        for field in &class.static_fields {
            previous_statics.insert((class.class_name.as_str(), field.name.as_str()), field);
        }
    }

    let Snapshot { loaded_classes, heap, .. } = next;
    let next_heap: &[HeapItem] = heap;

    for class in loaded_classes.iter_mut() {
        for field in &mut class.static_fields {
            field.changed =
                match previous_statics.get(&(class.class_name.as_str(), field.name.as_str())) {
                    Some(previous_field) => value_changed(
                        &previous_field.value,
                        &previous.heap,
                        &field.value,
                        next_heap,
                    ),
                    None => true,
                };
        }
    }
}

fn diff_object_fields(previous: &Snapshot, next: &mut Snapshot) {
    let mut previous_fields: HashMap<(u64, &str), &Var> = HashMap::new();
    for item in &previous.heap {
        if let HeapItem::Object(object) = item {
            for field in &object.fields {
                previous_fields.insert((object.id.0, field.name.as_str()), field);
            }
        }
    }

    // Field values may reference the very heap being rewritten, so decide
    // first and write flags afterwards.
    let mut decisions: Vec<(usize, usize, bool)> = Vec::new();
    for (item_idx, item) in next.heap.iter().enumerate() {
        let HeapItem::Object(object) = item else { continue };
        for (field_idx, field) in object.fields.iter().enumerate() {
            let changed = match previous_fields.get(&(object.id.0, field.name.as_str())) {
                Some(previous_field) => {
                    value_changed(&previous_field.value, &previous.heap, &field.value, &next.heap)
                }
                None => true,
            };
            decisions.push((item_idx, field_idx, changed));
        }
    }
    for (item_idx, field_idx, changed) in decisions {
        if let HeapItem::Object(object) = &mut next.heap[item_idx] {
            object.fields[field_idx].changed = changed;
        }
    }
}

fn diff_string_char_arrays(previous: &Snapshot, next: &mut Snapshot) {
    let mut previous_arrays: HashMap<&str, &Var> = HashMap::new();
    for item in &previous.heap {
        if let HeapItem::Str(string) = item {
            previous_arrays.insert(string.char_arr.name.as_str(), &string.char_arr);
        }
    }

    let mut decisions: Vec<(usize, bool)> = Vec::new();
    for (item_idx, item) in next.heap.iter().enumerate() {
        let HeapItem::Str(string) = item else { continue };
        let changed = match previous_arrays.get(string.char_arr.name.as_str()) {
            Some(previous_arr) => {
                value_changed(&previous_arr.value, &previous.heap, &string.char_arr.value, &next.heap)
            }
            None => true,
        };
        decisions.push((item_idx, changed));
    }
    for (item_idx, changed) in decisions {
        if let HeapItem::Str(string) = &mut next.heap[item_idx] {
            string.char_arr.changed = changed;
        }
    }
}

fn diff_array_elements(previous: &Snapshot, next: &mut Snapshot) {
    let mut previous_elements: HashMap<(u64, usize), &Value> = HashMap::new();
    for item in &previous.heap {
        if let HeapItem::Array(array) = item {
            for element in &array.elements {
                previous_elements.insert((array.id.0, element.index), &element.value);
            }
        }
    }

    let mut decisions: Vec<(usize, usize, bool)> = Vec::new();
    for (item_idx, item) in next.heap.iter().enumerate() {
        let HeapItem::Array(array) = item else { continue };
        for (element_idx, element) in array.elements.iter().enumerate() {
            let changed = match previous_elements.get(&(element.array_id.0, element.index)) {
                Some(previous_value) => {
                    value_changed(previous_value, &previous.heap, &element.value, &next.heap)
                }
                None => true,
            };
            decisions.push((item_idx, element_idx, changed));
        }
    }
    for (item_idx, element_idx, changed) in decisions {
        if let HeapItem::Array(array) = &mut next.heap[item_idx] {
            array.elements[element_idx].changed = changed;
        }
    }
}
