//! # Content Document
//!
//! The nested content of every section of the page being edited, keyed by
//! section id. No schema is enforced here; each section form owns the shape
//! of its own subtree.
//!
//! Documents are values: every write produces a new `Document` and leaves the
//! receiver untouched, so consumers can detect changes by comparing the old
//! and new value.
//!
//! ## Path writes
//!
//! ```text
//! set({}, "items.0.title", "x")  →  { items: [ { title: "x" } ] }
//! set({}, "items.title",   "x")  →  { items: { title: "x" } }
//! set({ a: 5 }, "a.b", 1)        →  { a: 5 }   (aborted, logged)
//! ```

use crate::mutations::MutationError;
use crate::path::{FieldPath, Segment};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key of the style-default entry merged one level deeper than the others
pub const COLORS_KEY: &str = "colors";

/// Most `null` slots a single write may pad an array with
pub const MAX_ARRAY_PADDING: usize = 1024;

/// Section-keyed content tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    sections: Map<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON value; anything but an object yields an empty document
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(sections) => Self { sections },
            _ => Self::default(),
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.sections)
    }

    pub fn section(&self, key: &str) -> Option<&Value> {
        self.sections.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Read the value at a dot path
    pub fn get(&self, path: &str) -> Option<&Value> {
        let path = FieldPath::parse(path).ok()?;
        let (first, rest) = path.segments().split_first()?;
        let mut current = self.sections.get(first.as_key())?;
        for segment in rest {
            current = match (current, segment) {
                (Value::Object(map), segment) => map.get(segment.as_key())?,
                (Value::Array(items), Segment::Index { index, .. }) => items.get(*index)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Write `value` at `path`, returning the updated document.
    ///
    /// A write that would have to descend through a primitive is aborted:
    /// the diagnostic is logged and an unchanged copy of `self` is returned.
    pub fn set(&self, path: &str, value: Value) -> Document {
        let result = FieldPath::parse(path).and_then(|path| self.try_set(&path, value));
        match result {
            Ok(doc) => doc,
            Err(err) => {
                tracing::warn!("[Document] write to '{}' aborted: {}", path, err);
                self.clone()
            }
        }
    }

    /// Fallible form of [`Document::set`]
    pub fn try_set(&self, path: &FieldPath, value: Value) -> Result<Document, MutationError> {
        let mut sections = self.sections.clone();
        let segments = path.segments();
        let (first, rest) = match segments.split_first() {
            Some(split) => split,
            None => {
                return Err(MutationError::InvalidPath {
                    path: path.to_string(),
                    reason: "path is empty".to_string(),
                })
            }
        };

        if rest.is_empty() {
            sections.insert(first.as_key().to_string(), value);
            return Ok(Document { sections });
        }

        let slot = sections
            .entry(first.as_key().to_string())
            .or_insert(Value::Null);
        prepare_container(slot, &rest[0], path, 0)?;
        write_below(slot, rest, value, path)?;

        Ok(Document { sections })
    }

    /// Replace (or drop, with `None`) a whole section entry
    pub fn with_section(&self, key: &str, value: Option<Value>) -> Document {
        let mut sections = self.sections.clone();
        match value {
            Some(value) => {
                sections.insert(key.to_string(), value);
            }
            None => {
                sections.remove(key);
            }
        }
        Document { sections }
    }

    /// Shallow-merge style defaults into a section; `colors` merges one level
    /// deeper so user colors not named by the defaults survive.
    pub fn merge_style_defaults(&self, key: &str, defaults: &Map<String, Value>) -> Document {
        let mut entry = match self.sections.get(key) {
            Some(Value::Object(existing)) => existing.clone(),
            Some(Value::Null) | None => Map::new(),
            Some(other) => {
                tracing::warn!(
                    "[Document] section '{}' is not an object ({}), replacing with defaults",
                    key,
                    kind_name(other)
                );
                Map::new()
            }
        };

        for (name, default) in defaults {
            if name == COLORS_KEY {
                if let (Some(Value::Object(colors)), Value::Object(default_colors)) =
                    (entry.get_mut(name), default)
                {
                    for (color, value) in default_colors {
                        colors.insert(color.clone(), value.clone());
                    }
                    continue;
                }
            }
            entry.insert(name.clone(), default.clone());
        }

        self.with_section(key, Some(Value::Object(entry)))
    }
}

fn empty_container(for_index: bool) -> Value {
    if for_index {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Make `slot` a container for `next`: missing (null) slots become an array
/// when `next` is an index, an object otherwise. Primitives abort the write.
fn prepare_container(
    slot: &mut Value,
    next: &Segment,
    path: &FieldPath,
    depth: usize,
) -> Result<(), MutationError> {
    if slot.is_null() {
        *slot = empty_container(next.is_index());
        return Ok(());
    }
    if slot.is_object() || slot.is_array() {
        return Ok(());
    }
    Err(MutationError::PrimitiveCollision {
        path: path.to_string(),
        at: prefix(path, depth),
        found: kind_name(slot).to_string(),
    })
}

fn prefix(path: &FieldPath, depth: usize) -> String {
    path.segments()[..=depth]
        .iter()
        .map(Segment::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

/// Walk `segments` below the container `root` and assign the last one.
/// `segments` is non-empty and `root` is already an object or array.
fn write_below(
    root: &mut Value,
    segments: &[Segment],
    value: Value,
    path: &FieldPath,
) -> Result<(), MutationError> {
    let offset = path.segments().len() - segments.len();
    let (last, parents) = match segments.split_last() {
        Some(split) => split,
        None => return Ok(()),
    };

    let mut current = root;
    for (i, segment) in parents.iter().enumerate() {
        let slot = child_slot(current, segment, path)?;
        prepare_container(slot, &segments[i + 1], path, offset + i)?;
        current = slot;
    }

    let slot = child_slot(current, last, path)?;
    *slot = value;
    Ok(())
}

fn child_slot<'a>(
    container: &'a mut Value,
    segment: &Segment,
    path: &FieldPath,
) -> Result<&'a mut Value, MutationError> {
    match container {
        Value::Object(map) => Ok(map
            .entry(segment.as_key().to_string())
            .or_insert(Value::Null)),
        Value::Array(items) => match segment {
            Segment::Index { index, .. } => {
                let index = *index;
                let len = items.len();
                if index >= len {
                    let out_of_range = || MutationError::IndexOutOfRange {
                        path: path.to_string(),
                        index,
                        len,
                    };
                    if index - len > MAX_ARRAY_PADDING {
                        return Err(out_of_range());
                    }
                    let new_len = index.checked_add(1).ok_or_else(out_of_range)?;
                    items.resize(new_len, Value::Null);
                }
                Ok(&mut items[index])
            }
            Segment::Key(key) => Err(MutationError::KeyOnArray {
                path: path.to_string(),
                key: key.clone(),
            }),
        },
        other => Err(MutationError::PrimitiveCollision {
            path: path.to_string(),
            at: segment.to_string(),
            found: kind_name(other).to_string(),
        }),
    }
}
