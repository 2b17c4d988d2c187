//! # Document Mutations
//!
//! Every write to the content document is expressed as a [`Mutation`] and
//! funneled through [`Mutation::apply`]. Forms never touch the document
//! directly.
//!
//! ## Mutation Semantics
//!
//! ### SetValue
//! - Writes one value at a dot path, creating missing containers
//! - Last write wins at the leaf, no merge attempts
//! - Aborts (document unchanged) when the path crosses a primitive
//!
//! ### MergeStyleDefaults
//! - Shallow merge of presentation defaults into a section
//! - `colors` merged one level deeper
//!
//! ### RestoreSection
//! - Replaces a whole section with a snapshot, or removes it
//! - Used as the inverse of the other mutations for undo

use crate::document::Document;
use crate::path::FieldPath;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Document write commands
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Mutation {
    /// Overwrite the value at a path
    SetValue { path: FieldPath, value: Value },

    /// Merge catalog style defaults into a section entry
    MergeStyleDefaults {
        section: String,
        defaults: Map<String, Value>,
    },

    /// Replace a section with a snapshot (`None` removes it)
    RestoreSection {
        section: String,
        snapshot: Option<Value>,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Path '{path}' crosses a {found} at '{at}'")]
    PrimitiveCollision {
        path: String,
        at: String,
        found: String,
    },

    #[error("Path '{path}' uses key '{key}' on an array")]
    KeyOnArray { path: String, key: String },

    #[error("Path '{path}' writes index {index} into an array of length {len}")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },
}

impl Mutation {
    /// Convenience constructor parsing the path
    pub fn set(path: &str, value: Value) -> Result<Self, MutationError> {
        Ok(Mutation::SetValue {
            path: FieldPath::parse(path)?,
            value,
        })
    }

    /// Top-level document key this mutation writes under
    pub fn section_key(&self) -> String {
        match self {
            Mutation::SetValue { path, .. } => path.section_key(),
            Mutation::MergeStyleDefaults { section, .. } => section.clone(),
            Mutation::RestoreSection { section, .. } => section.clone(),
        }
    }

    /// Apply to `doc`, producing the next document. `doc` is left untouched.
    pub fn apply(&self, doc: &Document) -> Result<Document, MutationError> {
        match self {
            Mutation::SetValue { path, value } => doc.try_set(path, value.clone()),

            Mutation::MergeStyleDefaults { section, defaults } => {
                Ok(doc.merge_style_defaults(section, defaults))
            }

            Mutation::RestoreSection { section, snapshot } => {
                Ok(doc.with_section(section, snapshot.clone()))
            }
        }
    }

    /// Inverse for undo: restore the touched section as it is in `doc`
    pub fn to_inverse(&self, doc: &Document) -> Mutation {
        let section = self.section_key();
        let snapshot = doc.section(&section).cloned();
        Mutation::RestoreSection { section, snapshot }
    }

    /// Debug name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::SetValue { .. } => "SetValue",
            Mutation::MergeStyleDefaults { .. } => "MergeStyleDefaults",
            Mutation::RestoreSection { .. } => "RestoreSection",
        }
    }
}

/// Result of funneling a mutation through a session
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    /// The document changed under `section`
    Applied { section: String, version: u64 },

    /// The write was aborted; the document is unchanged
    Aborted(MutationError),
}

impl MutationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, MutationOutcome::Applied { .. })
    }
}
