//! Live form data tree and its change channel.

use serde_json::{Map, Value};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::{DocError, DocResult};
use crate::form::FormState;
use crate::path::{FieldPath, Segment};

/// Owns the nested data built from form input. Every mutation bumps a revision
/// on a watch channel exactly once.
#[derive(Debug)]
pub struct FormDataStore {
    data: Value,
    changes: watch::Sender<u64>,
}

impl Default for FormDataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FormDataStore {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            data: Value::Object(Map::new()),
            changes,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.changes.borrow()
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        match &self.data {
            Value::Object(map) => map.is_empty(),
            Value::Null => true,
            _ => false,
        }
    }

    /// Decode `path` and store `raw` there as a string, creating containers on the way.
    pub fn set_value(&mut self, path: &str, raw: impl Into<String>) -> DocResult<FieldPath> {
        let path = FieldPath::parse(path)?;
        self.set_at(&path, Value::String(raw.into()))?;
        Ok(path)
    }

    /// Store `value` at `path`. Paths past the depth or item limits are rejected untouched.
    pub fn set_at(&mut self, path: &FieldPath, value: Value) -> DocResult<()> {
        path.check_limits()?;
        let mut walked = FieldPath::root();
        assign(&mut self.data, path.segments(), &mut walked, value);
        debug!(%path, "bound value");
        self.mark_changed();
        Ok(())
    }

    /// Drop element `index` from the sequence at `array_path`, shifting later elements down.
    pub fn remove_index(&mut self, array_path: &FieldPath, index: usize) -> bool {
        let removed = match array_path.lookup_mut(&mut self.data) {
            Some(Value::Array(items)) if index < items.len() => {
                items.remove(index);
                true
            }
            _ => false,
        };
        if removed {
            debug!(array = %array_path, index, "removed data element");
            self.mark_changed();
        }
        removed
    }

    /// Swap in a whole data tree (import, sample, example).
    pub fn replace(&mut self, data: Value) {
        self.data = data;
        self.mark_changed();
    }

    pub fn reset(&mut self) {
        self.replace(Value::Object(Map::new()));
    }

    pub fn mark_changed(&self) {
        self.changes.send_modify(|revision| *revision += 1);
    }

    /// The bound tree, or a flat `path -> value` map scanned from the mounted
    /// inputs when nothing has been bound yet.
    pub fn form_data(&self, form: &FormState) -> Value {
        if self.is_empty() {
            Value::Object(form.flat_values())
        } else {
            self.data.clone()
        }
    }
}

fn assign(slot: &mut Value, segments: &[Segment], walked: &mut FieldPath, value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *slot = value;
        return;
    };
    match head {
        Segment::Key(name) => {
            if !slot.is_object() {
                report_mismatch(walked, "object", slot);
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(map) = slot {
                let child = map
                    .entry(name.clone())
                    .or_insert_with(|| placeholder(rest));
                *walked = walked.key(name);
                assign(child, rest, walked, value);
            }
        }
        Segment::Index(index) => {
            if !slot.is_array() {
                let empty_placeholder = slot.as_object().is_some_and(Map::is_empty);
                if !empty_placeholder {
                    report_mismatch(walked, "array", slot);
                }
                *slot = Value::Array(Vec::new());
            }
            if let Value::Array(items) = slot {
                while items.len() <= *index {
                    items.push(Value::Object(Map::new()));
                }
                *walked = walked.index(*index);
                assign(&mut items[*index], rest, walked, value);
            }
        }
    }
}

fn placeholder(rest: &[Segment]) -> Value {
    match rest.first() {
        Some(Segment::Index(_)) => Value::Array(Vec::new()),
        Some(Segment::Key(_)) => Value::Object(Map::new()),
        None => Value::Null,
    }
}

fn report_mismatch(at: &FieldPath, expected: &str, found: &Value) {
    let error = DocError::SchemaMismatch {
        path: at.to_string(),
        reason: format!("expected {expected}, found {}", value_kind(found)),
    };
    warn!(%error, "replacing container");
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
