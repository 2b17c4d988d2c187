//! # Debounced Page Writer
//!
//! Copies a changed section from the document into the active page's stored
//! section data once edits have gone quiet.
//!
//! ```text
//! section_changed("hero") ──▶ pending = hero, generation += 1
//!        │                     abort previous timer
//!        ▼
//!   sleep(quiet) ──▶ generation still current?
//!                        ├─ no  ─▶ drop
//!                        └─ yes ─▶ same active page? section on page?
//!                                     └─ yes ─▶ page.section_data[hero] = doc[hero]
//! ```
//!
//! Only the latest change is kept: a change to a different section before the
//! timer fires replaces the pending one. Callers never await the write;
//! [`PageWriter::flush`] writes the pending section immediately.

use crate::model::PagePatch;
use crate::stores::{DocumentStore, PageStore, StoreError};
use crate::structure::StructureView;
use sitekit_common::{PageId, SectionId};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Why a pending write did not reach the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The active page changed after the edit was made
    PageChanged,
    NoActivePage,
    /// The section is not in the page's effective order
    NotOnPage,
    /// The document has no entry for the section
    NoContent,
}

/// What happened to a pending write
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    Written { page: PageId, section: SectionId },
    Dropped { section: SectionId, reason: DropReason },
    Failed(StoreError),
}

#[derive(Debug, Clone)]
struct PendingWrite {
    section: SectionId,
    /// Active page when the edit was made
    page: Option<PageId>,
}

#[derive(Default)]
struct WriterState {
    generation: u64,
    pending: Option<PendingWrite>,
    task: Option<JoinHandle<()>>,
}

impl WriterState {
    /// Invalidate the timer and hand back whatever was pending
    fn supersede(&mut self) -> Option<PendingWrite> {
        self.generation += 1;
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.pending.take()
    }
}

struct WriterTargets {
    documents: Arc<dyn DocumentStore>,
    pages: Arc<dyn PageStore>,
    structure: StructureView,
}

impl WriterTargets {
    fn write(&self, pending: PendingWrite) -> WriteOutcome {
        let section = pending.section;
        let dropped = |reason| WriteOutcome::Dropped {
            section: section.clone(),
            reason,
        };

        let page = match self.pages.active_page() {
            Some(page) => page,
            None => return dropped(DropReason::NoActivePage),
        };
        if pending.page.as_ref() != Some(&page.id) {
            return dropped(DropReason::PageChanged);
        }

        let live_order = self.structure.order();
        if !page.effective_order(&live_order).contains(section.as_str()) {
            return dropped(DropReason::NotOnPage);
        }

        let snapshot = match self.documents.document().section(section.as_str()) {
            Some(value) => value.clone(),
            None => return dropped(DropReason::NoContent),
        };

        match self
            .pages
            .update_page(&page.id, PagePatch::section_snapshot(section.clone(), snapshot))
        {
            Ok(_) => WriteOutcome::Written {
                page: page.id,
                section,
            },
            Err(err) => WriteOutcome::Failed(err),
        }
    }
}

/// Debounces section writes into the active page
pub struct PageWriter {
    targets: Arc<WriterTargets>,
    quiet: Duration,
    runtime: Option<Handle>,
    state: Arc<Mutex<WriterState>>,
}

impl PageWriter {
    /// Binds to the current tokio runtime if there is one. Without a runtime
    /// edits stay pending until [`PageWriter::flush`].
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        pages: Arc<dyn PageStore>,
        structure: StructureView,
        quiet: Duration,
    ) -> Self {
        Self {
            targets: Arc::new(WriterTargets {
                documents,
                pages,
                structure,
            }),
            quiet,
            runtime: Handle::try_current().ok(),
            state: Arc::new(Mutex::new(WriterState::default())),
        }
    }

    pub fn quiet_interval(&self) -> Duration {
        self.quiet
    }

    /// Section waiting for its timer
    pub fn pending(&self) -> Option<SectionId> {
        self.lock()
            .pending
            .as_ref()
            .map(|pending| pending.section.clone())
    }

    /// Record a change under `section` and restart the quiet timer
    pub fn section_changed(&self, section: &str) {
        let pending = PendingWrite {
            section: SectionId::from(section),
            page: self.targets.pages.active_page().map(|page| page.id),
        };

        let mut state = self.lock();
        if let Some(previous) = state.supersede() {
            if previous.section != pending.section {
                tracing::debug!(
                    "[PageWriter] '{}' superseded by '{}'",
                    previous.section,
                    pending.section
                );
            }
        }
        state.pending = Some(pending);

        let runtime = match self.runtime.clone().or_else(|| Handle::try_current().ok()) {
            Some(runtime) => runtime,
            None => {
                tracing::warn!("[PageWriter] no runtime; '{}' waits for flush", section);
                return;
            }
        };

        let generation = state.generation;
        let quiet = self.quiet;
        let shared = Arc::clone(&self.state);
        let targets = Arc::clone(&self.targets);
        state.task = Some(runtime.spawn(async move {
            tokio::time::sleep(quiet).await;

            let pending = {
                let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
                if state.generation != generation {
                    tracing::debug!("[PageWriter] stale timer {} ignored", generation);
                    return;
                }
                state.task = None;
                state.pending.take()
            };

            if let Some(pending) = pending {
                log_outcome(&targets.write(pending));
            }
        }));
    }

    /// Write the pending section now
    pub fn flush(&self) -> Option<WriteOutcome> {
        let pending = self.lock().supersede()?;
        let outcome = self.targets.write(pending);
        log_outcome(&outcome);
        Some(outcome)
    }

    /// Drop the pending write
    pub fn cancel(&self) {
        if let Some(pending) = self.lock().supersede() {
            tracing::debug!("[PageWriter] pending write for '{}' cancelled", pending.section);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, WriterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for PageWriter {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn log_outcome(outcome: &WriteOutcome) {
    match outcome {
        WriteOutcome::Written { page, section } => {
            tracing::debug!("[PageWriter] wrote '{}' to page {}", section, page)
        }
        WriteOutcome::Dropped { section, reason } => {
            tracing::debug!("[PageWriter] dropped '{}': {:?}", section, reason)
        }
        WriteOutcome::Failed(err) => tracing::warn!("[PageWriter] write failed: {}", err),
    }
}
