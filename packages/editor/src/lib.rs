//! # Sitekit Editor
//!
//! Section editing engine for the site builder.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ forms / menus / drag handles                │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ EditSession                                 │
//! │  - Mutation → DocumentStore (path writes)   │
//! │  - SectionOrderManager → StructureStore     │
//! │  - UndoStack (inverse mutations)            │
//! │  - PageWriter (debounced page snapshots)    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ DocumentStore / PageStore / mirrors         │
//! │ (memory here, project file in workspace)    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Document is source of truth**: page snapshots are derived copies
//! 2. **Commands, not in-place edits**: every write is a [`Mutation`]
//! 3. **One structure value**: preview and persisted views read the same store
//! 4. **Rejected actions change nothing**: no partial state on failure
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sitekit_editor::{Catalog, EditSession, EditorConfig, FlushPolicy};
//!
//! let mut session = EditSession::new(
//!     "client-1",
//!     EditorConfig::default(),
//!     Arc::new(Catalog::standard()),
//!     documents,
//!     pages,
//!     structure,
//! );
//!
//! session.set("hero.title", json!("Welcome"))?;
//! session.add_section("pricing")?;
//! session.reorder("pricing", "hero")?;
//!
//! session.close(FlushPolicy::Flush);
//! ```

mod catalog;
mod config;
mod document;
mod errors;
mod manager;
mod model;
mod mutations;
mod order;
mod path;
mod session;
mod stores;
mod structure;
mod undo_stack;
mod writer;

pub use catalog::{Catalog, CatalogEntry, CatalogError, PRESENTATION_KEYS};
pub use config::{EditorConfig, DEFAULT_CONFIG_NAME};
pub use document::{Document, COLORS_KEY, MAX_ARRAY_PADDING};
pub use errors::EditorError;
pub use manager::{Rejection, SectionChange, SectionOrderManager};
pub use model::{Page, PagePatch, Project};
pub use mutations::{Mutation, MutationError, MutationOutcome};
pub use order::{SectionOrder, VisibilityMap};
pub use path::{FieldPath, Segment};
pub use session::{EditSession, FlushPolicy};
pub use stores::{DocumentStore, MemoryDocumentStore, MemoryPageStore, PageStore, StoreError};
pub use structure::{PageOrderMirror, Structure, StructureMirror, StructureStore, StructureView};
pub use undo_stack::{MutationBatch, Replay, UndoStack};
pub use writer::{DropReason, PageWriter, WriteOutcome};

// Re-export common types for convenience
pub use sitekit_common::{PageId, SectionId};
