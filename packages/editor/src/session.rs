//! # Edit Session
//!
//! One user's editing surface over a project. Wires the flows together:
//!
//! - form edit → [`Mutation`] → document store → page writer
//! - structural action → order manager → structure store → mirrors
//! - undo/redo → inverse mutations → document store → page writer
//!
//! The session owns the debounce timer and the undo history; both are reset
//! on [`EditSession::close`].

use crate::catalog::{Catalog, CatalogEntry};
use crate::config::EditorConfig;
use crate::document::Document;
use crate::errors::EditorError;
use crate::manager::{SectionChange, SectionOrderManager};
use crate::model::Page;
use crate::mutations::{Mutation, MutationError, MutationOutcome};
use crate::order::{SectionOrder, VisibilityMap};
use crate::stores::{DocumentStore, PageStore, StoreError};
use crate::structure::{PageOrderMirror, Structure, StructureMirror, StructureStore, StructureView};
use crate::undo_stack::{Replay, UndoStack};
use crate::writer::{PageWriter, WriteOutcome};
use serde_json::Value;
use sitekit_common::PageId;
use std::sync::Arc;

/// What happens to an unwritten section edit when the page goes away
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlushPolicy {
    /// Write it to the outgoing page first
    Flush,
    /// Drop it
    #[default]
    Discard,
}

/// Single edit session
pub struct EditSession {
    /// Unique session identifier
    pub id: String,

    config: EditorConfig,
    documents: Arc<dyn DocumentStore>,
    pages: Arc<dyn PageStore>,
    structure: Arc<StructureStore>,
    manager: SectionOrderManager,
    writer: PageWriter,
    undo: UndoStack,

    /// Project-wide order, used by pages without their own
    project_order: SectionOrder,
    version: u64,
    closed: bool,
}

impl EditSession {
    /// Open a session. `initial` is the project-wide structure; the active
    /// page's own order replaces it when the page has one.
    pub fn new(
        id: impl Into<String>,
        config: EditorConfig,
        catalog: Arc<Catalog>,
        documents: Arc<dyn DocumentStore>,
        pages: Arc<dyn PageStore>,
        initial: Structure,
    ) -> Self {
        let pinned = config.pinned_section.clone();
        let project_order = SectionOrder::from_ids(initial.order.iter().cloned(), &pinned);

        let order = match pages.active_page() {
            Some(page) => normalized(page.effective_order(&project_order), &config),
            None => project_order.clone(),
        };

        let structure = Arc::new(StructureStore::new(Structure::new(order, initial.visibility)));
        structure.add_mirror(Arc::new(PageOrderMirror::new(pages.clone())));

        let manager =
            SectionOrderManager::new(catalog, structure.clone(), documents.clone(), pinned);
        let writer = PageWriter::new(
            documents.clone(),
            pages.clone(),
            structure.persisted(),
            config.quiet_interval(),
        );
        let undo = UndoStack::with_max_levels(config.undo_levels);

        let id = id.into();
        tracing::info!("[EditSession] {} opened", id);

        Self {
            id,
            config,
            documents,
            pages,
            structure,
            manager,
            writer,
            undo,
            project_order,
            version: 0,
            closed: false,
        }
    }

    /// Register another container that keeps its own copy of the structure
    pub fn add_mirror(&self, mirror: Arc<dyn StructureMirror>) {
        self.structure.add_mirror(mirror);
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn document(&self) -> Document {
        self.documents.document()
    }

    pub fn order(&self) -> SectionOrder {
        self.structure.order()
    }

    pub fn visibility(&self) -> VisibilityMap {
        self.structure.visibility()
    }

    pub fn preview(&self) -> StructureView {
        self.structure.preview()
    }

    pub fn persisted(&self) -> StructureView {
        self.structure.persisted()
    }

    pub fn active_page(&self) -> Option<Page> {
        self.pages.active_page()
    }

    /// Number of document mutations applied in this session
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Section waiting to be written to the active page
    pub fn pending_write(&self) -> Option<String> {
        self.writer.pending().map(|id| id.to_string())
    }

    // ------------------------------------------------------------------
    // Document edits
    // ------------------------------------------------------------------

    /// Funnel a mutation into the document. Aborted writes leave the
    /// document as it was and record nothing.
    pub fn apply(&mut self, mutation: Mutation) -> Result<MutationOutcome, EditorError> {
        self.ensure_open()?;

        let mut inverse: Option<Result<Mutation, MutationError>> = None;
        self.documents.update_document(&mut |doc: &Document| match mutation.apply(doc) {
            Ok(next) => {
                inverse = Some(Ok(mutation.to_inverse(doc)));
                next
            }
            Err(err) => {
                inverse = Some(Err(err));
                doc.clone()
            }
        });

        match inverse {
            Some(Ok(inverse)) => Ok(self.applied(mutation, inverse)),
            Some(Err(err)) => {
                tracing::warn!("[EditSession] {} aborted: {}", mutation.name(), err);
                Ok(MutationOutcome::Aborted(err))
            }
            None => Err(StoreError::Unavailable(
                "document store skipped the update".to_string(),
            )
            .into()),
        }
    }

    /// Write `value` at a dot path
    pub fn set(&mut self, path: &str, value: Value) -> Result<MutationOutcome, EditorError> {
        self.ensure_open()?;
        match Mutation::set(path, value) {
            Ok(mutation) => self.apply(mutation),
            Err(err) => {
                tracing::warn!("[EditSession] rejected path '{}': {}", path, err);
                Ok(MutationOutcome::Aborted(err))
            }
        }
    }

    fn applied(&mut self, mutation: Mutation, inverse: Mutation) -> MutationOutcome {
        let section = mutation.section_key();
        self.undo.record(mutation, inverse);
        self.writer.section_changed(&section);
        self.version += 1;
        MutationOutcome::Applied {
            section,
            version: self.version,
        }
    }

    /// Group the following edits into one undo step
    pub fn begin_batch(&mut self, description: impl Into<String>) {
        self.undo.begin_batch();
        self.undo.set_batch_description(description);
    }

    pub fn end_batch(&mut self) {
        self.undo.end_batch();
    }

    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    /// Undo the last edit step; `false` when there is nothing to undo
    pub fn undo(&mut self) -> Result<bool, EditorError> {
        self.ensure_open()?;
        let replay = self.undo.undo(&self.documents.document())?;
        Ok(self.replayed(replay))
    }

    /// Redo the last undone step; `false` when there is nothing to redo
    pub fn redo(&mut self) -> Result<bool, EditorError> {
        self.ensure_open()?;
        let replay = self.undo.redo(&self.documents.document())?;
        Ok(self.replayed(replay))
    }

    fn replayed(&mut self, replay: Option<Replay>) -> bool {
        let replay = match replay {
            Some(replay) => replay,
            None => return false,
        };
        self.documents.replace_document(replay.document);
        for section in &replay.sections {
            self.writer.section_changed(section);
        }
        self.version += 1;
        true
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    pub fn add_section(&mut self, id: &str) -> Result<SectionChange, EditorError> {
        self.ensure_open()?;
        let change = self.manager.add_section(id)?;
        if let SectionChange::AppliedWithStyle { merge, inverse } = &change {
            self.applied(merge.clone(), inverse.clone());
        }
        Ok(change)
    }

    pub fn remove_section(&mut self, id: &str) -> Result<SectionChange, EditorError> {
        self.ensure_open()?;
        Ok(self.manager.remove_section(id)?)
    }

    pub fn reorder(&mut self, source: &str, target: &str) -> Result<SectionChange, EditorError> {
        self.ensure_open()?;
        Ok(self.manager.reorder(source, target)?)
    }

    pub fn set_visibility(
        &mut self,
        id: &str,
        visible: bool,
    ) -> Result<SectionChange, EditorError> {
        self.ensure_open()?;
        Ok(self.manager.set_visibility(id, visible)?)
    }

    pub fn toggle_visibility(&mut self, id: &str) -> Result<SectionChange, EditorError> {
        self.ensure_open()?;
        Ok(self.manager.toggle_visibility(id)?)
    }

    pub fn addable_sections(&self) -> Vec<CatalogEntry> {
        self.manager.addable_sections()
    }

    // ------------------------------------------------------------------
    // Pages
    // ------------------------------------------------------------------

    /// Make `id` the active page and load its order
    pub fn switch_page(&mut self, id: &PageId, policy: FlushPolicy) -> Result<Page, EditorError> {
        self.ensure_open()?;
        self.settle(policy);

        let page = self.pages.activate_page(id)?;
        let order = normalized(page.effective_order(&self.project_order), &self.config);
        self.structure
            .load(Structure::new(order, self.structure.visibility()));

        tracing::info!("[EditSession] {} switched to page {}", self.id, page.id);
        Ok(page)
    }

    /// Write the pending section now
    pub fn flush(&self) -> Option<WriteOutcome> {
        self.writer.flush()
    }

    /// Tear down: settle the pending write and drop the history
    pub fn close(&mut self, policy: FlushPolicy) {
        if self.closed {
            return;
        }
        self.settle(policy);
        self.undo.clear();
        self.closed = true;
        tracing::info!("[EditSession] {} closed", self.id);
    }

    fn settle(&self, policy: FlushPolicy) {
        match policy {
            FlushPolicy::Flush => {
                self.writer.flush();
            }
            FlushPolicy::Discard => self.writer.cancel(),
        }
    }

    fn ensure_open(&self) -> Result<(), EditorError> {
        if self.closed {
            Err(EditorError::SessionClosed)
        } else {
            Ok(())
        }
    }
}

fn normalized(order: &SectionOrder, config: &EditorConfig) -> SectionOrder {
    SectionOrder::from_ids(order.iter().cloned(), &config.pinned_section)
}
