//! # Store Contracts
//!
//! The engine never owns persistence. It talks to two collaborators:
//!
//! - [`DocumentStore`]: holds the content document, supports functional
//!   updates so path writes compose with concurrent external updates
//! - [`PageStore`]: the page list and the active page pointer
//!
//! `MemoryDocumentStore` and `MemoryPageStore` are plain in-memory versions;
//! the workspace crate provides a file-backed implementation of both.

use crate::document::Document;
use crate::model::{Page, PagePatch};
use sitekit_common::PageId;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Page not found: {0}")]
    PageNotFound(PageId),

    #[error("Page already exists: {0}")]
    DuplicatePage(PageId),

    #[error("Mirror '{name}' failed: {reason}")]
    Mirror { name: String, reason: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Holder of the canonical content document
pub trait DocumentStore: Send + Sync {
    /// Current document
    fn document(&self) -> Document;

    /// Replace the document with `updater(previous)`; returns the new value
    fn update_document(&self, updater: &mut dyn FnMut(&Document) -> Document) -> Document;

    /// Replace the document outright
    fn replace_document(&self, document: Document) {
        self.update_document(&mut |_: &Document| document.clone());
    }
}

/// Holder of the project's pages
pub trait PageStore: Send + Sync {
    fn list_pages(&self) -> Vec<Page>;

    fn active_page(&self) -> Option<Page>;

    /// Make `id` the active page
    fn activate_page(&self, id: &PageId) -> Result<Page, StoreError>;

    fn update_page(&self, id: &PageId, patch: PagePatch) -> Result<Page, StoreError>;

    fn add_page(&self, page: Page) -> Result<(), StoreError>;

    fn remove_page(&self, id: &PageId) -> Result<Page, StoreError>;
}

/// In-memory document store with a version counter
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    inner: RwLock<(Document, u64)>,
}

impl MemoryDocumentStore {
    pub fn new(document: Document) -> Self {
        Self {
            inner: RwLock::new((document, 0)),
        }
    }

    /// Number of updates applied so far
    pub fn version(&self) -> u64 {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).1
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn document(&self) -> Document {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .0
            .clone()
    }

    fn update_document(&self, updater: &mut dyn FnMut(&Document) -> Document) -> Document {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let next = updater(&guard.0);
        guard.0 = next.clone();
        guard.1 += 1;
        next
    }
}

#[derive(Debug, Default)]
struct PageState {
    pages: Vec<Page>,
    active: Option<PageId>,
}

/// In-memory page store
#[derive(Debug, Default)]
pub struct MemoryPageStore {
    state: RwLock<PageState>,
}

impl MemoryPageStore {
    pub fn new(pages: Vec<Page>) -> Self {
        let active = pages.first().map(|p| p.id.clone());
        Self {
            state: RwLock::new(PageState { pages, active }),
        }
    }

    /// Drop the active page pointer (page closed)
    pub fn close_active(&self) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .active = None;
    }
}

impl PageStore for MemoryPageStore {
    fn list_pages(&self) -> Vec<Page> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .pages
            .clone()
    }

    fn active_page(&self) -> Option<Page> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let active = state.active.as_ref()?;
        state.pages.iter().find(|p| &p.id == active).cloned()
    }

    fn activate_page(&self, id: &PageId) -> Result<Page, StoreError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let page = state
            .pages
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| StoreError::PageNotFound(id.clone()))?;
        state.active = Some(id.clone());
        Ok(page)
    }

    fn update_page(&self, id: &PageId, patch: PagePatch) -> Result<Page, StoreError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let page = state
            .pages
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| StoreError::PageNotFound(id.clone()))?;
        page.apply_patch(patch);
        Ok(page.clone())
    }

    fn add_page(&self, page: Page) -> Result<(), StoreError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.pages.iter().any(|p| p.id == page.id) {
            return Err(StoreError::DuplicatePage(page.id));
        }
        state.pages.push(page);
        Ok(())
    }

    fn remove_page(&self, id: &PageId) -> Result<Page, StoreError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let index = state
            .pages
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| StoreError::PageNotFound(id.clone()))?;
        if state.active.as_ref() == Some(id) {
            state.active = None;
        }
        Ok(state.pages.remove(index))
    }
}
