//! # Structure Store
//!
//! Section order and visibility, shared by the live preview and the persisted
//! project.
//!
//! ```text
//!            set_order / set_visibility
//!                       ↓
//! ┌─────────────────────────────────────────────┐
//! │ StructureStore (single authoritative value) │
//! └─────────────────────────────────────────────┘
//!        ↓ watch                     ↓ fan-out
//!  StructureView ("preview",   StructureMirror (containers that
//!  "persisted", ...)           keep their own copy: project file,
//!                              active page order)
//! ```
//!
//! Every write computes the next value once and publishes it before pushing
//! it to the mirrors, so all views observe the same value. Mirrors receive
//! the value as-is; there is no arbitration between them.

use crate::model::PagePatch;
use crate::order::{SectionOrder, VisibilityMap};
use crate::stores::{PageStore, StoreError};
use sitekit_common::SectionId;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;

/// Order and visibility together
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Structure {
    pub order: SectionOrder,
    pub visibility: VisibilityMap,
}

impl Structure {
    pub fn new(order: SectionOrder, visibility: VisibilityMap) -> Self {
        Self { order, visibility }
    }
}

/// A container that keeps its own copy of the structure
pub trait StructureMirror: Send + Sync {
    fn name(&self) -> &str;

    fn mirror_order(&self, order: &SectionOrder) -> Result<(), StoreError>;

    fn mirror_visibility(&self, visibility: &VisibilityMap) -> Result<(), StoreError>;
}

/// Authoritative structure state
pub struct StructureStore {
    sender: watch::Sender<Structure>,
    mirrors: RwLock<Vec<Arc<dyn StructureMirror>>>,
}

impl StructureStore {
    pub fn new(initial: Structure) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            sender,
            mirrors: RwLock::new(Vec::new()),
        }
    }

    pub fn add_mirror(&self, mirror: Arc<dyn StructureMirror>) {
        tracing::debug!("[StructureStore] mirror registered: {}", mirror.name());
        self.mirrors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(mirror);
    }

    pub fn snapshot(&self) -> Structure {
        self.sender.borrow().clone()
    }

    pub fn order(&self) -> SectionOrder {
        self.sender.borrow().order.clone()
    }

    pub fn visibility(&self) -> VisibilityMap {
        self.sender.borrow().visibility.clone()
    }

    /// Read-only projection that observes every write
    pub fn view(&self, label: &'static str) -> StructureView {
        StructureView {
            label,
            receiver: self.sender.subscribe(),
        }
    }

    pub fn preview(&self) -> StructureView {
        self.view("preview")
    }

    pub fn persisted(&self) -> StructureView {
        self.view("persisted")
    }

    /// Publish a new order and push it to every mirror
    pub fn set_order(&self, order: SectionOrder) -> Result<(), StoreError> {
        self.sender.send_modify(|s| s.order = order.clone());
        self.fan_out(|mirror| mirror.mirror_order(&order))
    }

    /// Publish `updater(current visibility)` and push it to every mirror
    pub fn set_visibility<F>(&self, updater: F) -> Result<VisibilityMap, StoreError>
    where
        F: FnOnce(&mut VisibilityMap),
    {
        let mut next = self.visibility();
        updater(&mut next);
        self.sender.send_modify(|s| s.visibility = next.clone());
        self.fan_out(|mirror| mirror.mirror_visibility(&next))?;
        Ok(next)
    }

    /// Replace the published structure without touching the mirrors
    /// (loading state that already came from them)
    pub fn load(&self, structure: Structure) {
        self.sender.send_replace(structure);
    }

    fn fan_out<F>(&self, mut push: F) -> Result<(), StoreError>
    where
        F: FnMut(&dyn StructureMirror) -> Result<(), StoreError>,
    {
        let mirrors = self
            .mirrors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mut first_error = None;
        for mirror in &mirrors {
            if let Err(err) = push(mirror.as_ref()) {
                tracing::warn!("[StructureStore] mirror '{}' failed: {}", mirror.name(), err);
                if first_error.is_none() {
                    first_error = Some(StoreError::Mirror {
                        name: mirror.name().to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Read-only view of a [`StructureStore`]
#[derive(Clone)]
pub struct StructureView {
    label: &'static str,
    receiver: watch::Receiver<Structure>,
}

impl StructureView {
    pub fn current(&self) -> Structure {
        self.receiver.borrow().clone()
    }

    pub fn order(&self) -> SectionOrder {
        self.receiver.borrow().order.clone()
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.receiver.borrow().visibility.is_visible(id)
    }

    /// Ids in order that are currently shown
    pub fn visible_sections(&self) -> Vec<SectionId> {
        let structure = self.receiver.borrow();
        structure
            .order
            .iter()
            .filter(|id| structure.visibility.is_visible(id.as_str()))
            .cloned()
            .collect()
    }

    /// Whether a write happened since this view last marked it seen
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    /// Wait for the next write
    pub async fn changed(&mut self) -> Structure {
        if self.receiver.changed().await.is_err() {
            tracing::debug!("[StructureView] {} store dropped", self.label);
        }
        self.receiver.borrow_and_update().clone()
    }
}

/// Keeps the active page's own section list in step with the order
pub struct PageOrderMirror {
    pages: Arc<dyn PageStore>,
}

impl PageOrderMirror {
    pub fn new(pages: Arc<dyn PageStore>) -> Self {
        Self { pages }
    }
}

impl StructureMirror for PageOrderMirror {
    fn name(&self) -> &str {
        "active-page"
    }

    fn mirror_order(&self, order: &SectionOrder) -> Result<(), StoreError> {
        match self.pages.active_page() {
            Some(page) => {
                self.pages
                    .update_page(&page.id, PagePatch::sections(order.clone()))?;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn mirror_visibility(&self, _visibility: &VisibilityMap) -> Result<(), StoreError> {
        Ok(())
    }
}
