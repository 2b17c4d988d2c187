//! # Undo/Redo Stack
//!
//! Tracks document mutation history.
//!
//! ## Design
//!
//! - Each mutation records its inverse (a snapshot of the touched section)
//!   before being applied
//! - Undo applies the inverses and moves the batch to the redo stack
//! - Redo reapplies the original mutations
//! - New mutations clear the redo stack
//! - Batches group several mutations into one undo step
//!
//! The stack never owns the document; undo and redo take the current value
//! and return the next one, leaving storage to the caller.

use crate::document::Document;
use crate::mutations::{Mutation, MutationError};
use std::collections::BTreeSet;

/// A group of mutations that should be undone/redone together
#[derive(Debug, Clone)]
pub struct MutationBatch {
    /// The mutations in this batch (in application order)
    pub mutations: Vec<Mutation>,

    /// The inverse mutations (in reverse order for undo)
    pub inverses: Vec<Mutation>,

    pub description: Option<String>,
}

impl MutationBatch {
    pub fn single(mutation: Mutation, inverse: Mutation) -> Self {
        Self {
            mutations: vec![mutation],
            inverses: vec![inverse],
            description: None,
        }
    }

    /// Top-level sections the batch touches
    pub fn sections(&self) -> Vec<String> {
        self.mutations
            .iter()
            .map(Mutation::section_key)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Result of an undo or redo step
#[derive(Debug, Clone, PartialEq)]
pub struct Replay {
    pub document: Document,
    /// Sections whose content changed
    pub sections: Vec<String>,
}

/// Undo/redo stack for document editing
#[derive(Debug)]
pub struct UndoStack {
    undo_stack: Vec<MutationBatch>,
    redo_stack: Vec<MutationBatch>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    current_batch: Option<MutationBatch>,
}

impl UndoStack {
    /// Create a new undo stack with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            current_batch: None,
        }
    }

    /// Apply a mutation to `doc` and record it for undo
    pub fn apply(
        &mut self,
        mutation: &Mutation,
        doc: &Document,
    ) -> Result<Document, MutationError> {
        let inverse = mutation.to_inverse(doc);
        let next = mutation.apply(doc)?;
        self.record(mutation.clone(), inverse);
        Ok(next)
    }

    /// Record a mutation that was already applied elsewhere
    pub fn record(&mut self, mutation: Mutation, inverse: Mutation) {
        if let Some(batch) = &mut self.current_batch {
            batch.mutations.push(mutation);
            // Inverses go in reverse order
            batch.inverses.insert(0, inverse);
        } else {
            self.push_batch(MutationBatch::single(mutation, inverse));
        }
    }

    /// Start a batch of mutations (will be undone/redone together)
    pub fn begin_batch(&mut self) {
        self.current_batch = Some(MutationBatch {
            mutations: Vec::new(),
            inverses: Vec::new(),
            description: None,
        });
    }

    /// End the current batch and push it to the undo stack
    pub fn end_batch(&mut self) {
        if let Some(batch) = self.current_batch.take() {
            if !batch.mutations.is_empty() {
                self.push_batch(batch);
            }
        }
    }

    pub fn set_batch_description(&mut self, description: impl Into<String>) {
        if let Some(batch) = &mut self.current_batch {
            batch.description = Some(description.into());
        }
    }

    fn push_batch(&mut self, batch: MutationBatch) {
        self.undo_stack.push(batch);

        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        // New action invalidates the future
        self.redo_stack.clear();
    }

    /// Undo the most recent batch against `doc`
    pub fn undo(&mut self, doc: &Document) -> Result<Option<Replay>, MutationError> {
        let batch = match self.undo_stack.pop() {
            Some(batch) => batch,
            None => return Ok(None),
        };

        let document = match replay(&batch.inverses, doc) {
            Ok(document) => document,
            Err(err) => {
                self.undo_stack.push(batch);
                return Err(err);
            }
        };

        let sections = batch.sections();
        self.redo_stack.push(batch);
        Ok(Some(Replay { document, sections }))
    }

    /// Redo the most recently undone batch against `doc`
    pub fn redo(&mut self, doc: &Document) -> Result<Option<Replay>, MutationError> {
        let batch = match self.redo_stack.pop() {
            Some(batch) => batch,
            None => return Ok(None),
        };

        let document = match replay(&batch.mutations, doc) {
            Ok(document) => document,
            Err(err) => {
                self.redo_stack.push(batch);
                return Err(err);
            }
        };

        let sections = batch.sections();
        self.undo_stack.push(batch);
        Ok(Some(Replay { document, sections }))
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear all undo/redo history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current_batch = None;
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack
            .last()
            .and_then(|batch| batch.description.as_deref())
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

fn replay(mutations: &[Mutation], doc: &Document) -> Result<Document, MutationError> {
    mutations
        .iter()
        .try_fold(doc.clone(), |current, mutation| mutation.apply(&current))
}
