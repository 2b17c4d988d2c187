//! # Section Order Manager
//!
//! Structural actions on the page: add, remove, drag reorder and visibility
//! toggles. Every action re-validates against the catalog and the current
//! order, whatever the caller already checked, because menus, drag handles
//! and keyboard shortcuts all reach it independently.
//!
//! Rejected actions leave every store untouched and report why.
//!
//! ```text
//! absent ──add──▶ present & visible ◀──toggle──▶ present & hidden
//!   ▲                     │                             │
//!   └──────remove─────────┴─────────────────────────────┘
//! ```

use crate::catalog::{Catalog, CatalogEntry};
use crate::document::Document;
use crate::mutations::Mutation;
use crate::order::SectionOrder;
use crate::stores::{DocumentStore, StoreError};
use crate::structure::StructureStore;
use sitekit_common::SectionId;
use std::sync::Arc;
use thiserror::Error;

/// Why a structural action was refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("'{0}' is not in the catalog")]
    UnknownSection(SectionId),

    #[error("'{0}' is already on the page")]
    AlreadyPresent(SectionId),

    #[error("'{0}' can only appear once and is already on the page")]
    SingletonPresent(SectionId),

    #[error("'{0}' is not on the page")]
    NotPresent(SectionId),

    #[error("'{0}' is pinned to the end of the page")]
    PinnedSection(SectionId),

    #[error("'{0}' was dropped onto itself")]
    SameSection(SectionId),
}

/// Result of a structural action
#[derive(Debug, Clone, PartialEq)]
pub enum SectionChange {
    Applied,

    /// Section added and the catalog style defaults merged into the document.
    /// Carries the merge and the mutation that undoes it.
    AppliedWithStyle { merge: Mutation, inverse: Mutation },

    Rejected(Rejection),
}

impl SectionChange {
    pub fn is_applied(&self) -> bool {
        !matches!(self, SectionChange::Rejected(_))
    }
}

/// Owner of the section order
pub struct SectionOrderManager {
    catalog: Arc<Catalog>,
    structure: Arc<StructureStore>,
    documents: Arc<dyn DocumentStore>,
    pinned: SectionId,
}

impl SectionOrderManager {
    pub fn new(
        catalog: Arc<Catalog>,
        structure: Arc<StructureStore>,
        documents: Arc<dyn DocumentStore>,
        pinned: SectionId,
    ) -> Self {
        Self {
            catalog,
            structure,
            documents,
            pinned,
        }
    }

    pub fn order(&self) -> SectionOrder {
        self.structure.order()
    }

    /// Add `id` before the pinned tail, show it, and merge its style defaults
    pub fn add_section(&self, id: &str) -> Result<SectionChange, StoreError> {
        let current = self.structure.order();
        let entry = match self.catalog.check_addable(&current, id) {
            Ok(entry) => entry,
            Err(rejection) => return Ok(reject("add", rejection)),
        };

        let next = match current.with_inserted(entry.id.clone(), &self.pinned) {
            Some(next) => next,
            None => return Ok(reject("add", Rejection::AlreadyPresent(entry.id.clone()))),
        };

        self.structure.set_order(next)?;
        let section = entry.id.clone();
        self.structure.set_visibility(|v| v.set(section, true))?;
        tracing::debug!("[OrderManager] added '{}'", entry.id);

        let defaults = match &entry.default_style {
            Some(defaults) => defaults.clone(),
            None => return Ok(SectionChange::Applied),
        };

        let merge = Mutation::MergeStyleDefaults {
            section: entry.id.to_string(),
            defaults,
        };
        let mut inverse = None;
        self.documents.update_document(&mut |doc: &Document| {
            inverse = Some(merge.to_inverse(doc));
            match merge.apply(doc) {
                Ok(next) => next,
                Err(err) => {
                    tracing::warn!("[OrderManager] style merge for '{}' aborted: {}", id, err);
                    doc.clone()
                }
            }
        });

        Ok(match inverse {
            Some(inverse) => SectionChange::AppliedWithStyle { merge, inverse },
            None => SectionChange::Applied,
        })
    }

    /// Take `id` off the page and hide it. Its content stays in the document.
    pub fn remove_section(&self, id: &str) -> Result<SectionChange, StoreError> {
        if !self.catalog.contains(id) {
            return Ok(reject("remove", Rejection::UnknownSection(SectionId::from(id))));
        }

        let next = match self.structure.order().without(id) {
            Some(next) => next,
            None => return Ok(reject("remove", Rejection::NotPresent(SectionId::from(id)))),
        };

        self.structure.set_order(next)?;
        self.structure
            .set_visibility(|v| v.set(SectionId::from(id), false))?;
        tracing::debug!("[OrderManager] removed '{}'", id);
        Ok(SectionChange::Applied)
    }

    /// Drag `source` onto `target`; `source` lands immediately before it
    pub fn reorder(&self, source: &str, target: &str) -> Result<SectionChange, StoreError> {
        let current = self.structure.order();

        for id in [source, target] {
            if id == self.pinned.as_str() {
                return Ok(reject("reorder", Rejection::PinnedSection(self.pinned.clone())));
            }
            if !current.contains(id) {
                return Ok(reject("reorder", Rejection::NotPresent(SectionId::from(id))));
            }
        }
        if source == target {
            return Ok(reject("reorder", Rejection::SameSection(SectionId::from(source))));
        }

        match current.reordered(source, target, &self.pinned) {
            Some(next) => {
                if next != current {
                    self.structure.set_order(next)?;
                }
                tracing::debug!("[OrderManager] moved '{}' before '{}'", source, target);
                Ok(SectionChange::Applied)
            }
            None => Ok(reject("reorder", Rejection::NotPresent(SectionId::from(source)))),
        }
    }

    /// Show or hide a section that is on the page
    pub fn set_visibility(&self, id: &str, visible: bool) -> Result<SectionChange, StoreError> {
        if !self.structure.order().contains(id) {
            return Ok(reject("visibility", Rejection::NotPresent(SectionId::from(id))));
        }
        self.structure
            .set_visibility(|v| v.set(SectionId::from(id), visible))?;
        Ok(SectionChange::Applied)
    }

    pub fn toggle_visibility(&self, id: &str) -> Result<SectionChange, StoreError> {
        let visible = self.structure.visibility().is_visible(id);
        self.set_visibility(id, !visible)
    }

    /// Catalog entries that can be added right now, in catalog order
    pub fn addable_sections(&self) -> Vec<CatalogEntry> {
        let order = self.structure.order();
        self.catalog.addable(&order).cloned().collect()
    }
}

fn reject(action: &str, rejection: Rejection) -> SectionChange {
    tracing::debug!("[OrderManager] {} rejected: {}", action, rejection);
    SectionChange::Rejected(rejection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::VisibilityMap;
    use crate::stores::MemoryDocumentStore;
    use crate::structure::Structure;
    use serde_json::json;

    fn setup(
        ids: &[&str],
        doc: Document,
    ) -> (
        SectionOrderManager,
        Arc<StructureStore>,
        Arc<MemoryDocumentStore>,
    ) {
        let pinned = SectionId::from("footer");
        let structure = Arc::new(StructureStore::new(Structure::new(
            SectionOrder::from_ids(ids.iter().copied(), &pinned),
            VisibilityMap::new(),
        )));
        let documents = Arc::new(MemoryDocumentStore::new(doc));
        let manager = SectionOrderManager::new(
            Arc::new(Catalog::standard()),
            structure.clone(),
            documents.clone(),
            pinned,
        );
        (manager, structure, documents)
    }

    fn names(order: &SectionOrder) -> Vec<String> {
        order.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_add_inserts_before_footer_and_shows() {
        let (manager, structure, _) = setup(&["hero", "footer"], Document::new());

        let change = manager.add_section("faq").unwrap();
        assert_eq!(change, SectionChange::Applied);
        assert_eq!(names(&structure.order()), vec!["hero", "faq", "footer"]);
        assert_eq!(structure.visibility().get("faq"), Some(true));
    }

    #[test]
    fn test_add_singleton_twice_is_rejected() {
        let (manager, structure, _) = setup(&["hero", "footer"], Document::new());
        let before = structure.snapshot();

        let change = manager.add_section("footer").unwrap();
        assert_eq!(
            change,
            SectionChange::Rejected(Rejection::SingletonPresent(SectionId::from("footer")))
        );
        assert_eq!(structure.snapshot(), before);
    }

    #[test]
    fn test_add_unknown_is_rejected() {
        let (manager, structure, _) = setup(&["hero"], Document::new());
        let change = manager.add_section("marquee").unwrap();
        assert!(!change.is_applied());
        assert_eq!(names(&structure.order()), vec!["hero"]);
    }

    #[test]
    fn test_add_merges_style_defaults_and_keeps_content() {
        let existing = Document::from_value(json!({
            "hero": {
                "title": "Welcome back",
                "colors": { "background": "#000", "custom": "#abc" }
            }
        }));
        let (manager, _, documents) = setup(&["footer"], existing.clone());

        let change = manager.add_section("hero").unwrap();
        let doc = documents.document();

        assert_eq!(doc.get("hero.title"), Some(&json!("Welcome back")));
        assert_eq!(doc.get("hero.layout"), Some(&json!("centered")));
        assert_eq!(doc.get("hero.colors.background"), Some(&json!("#0f172a")));
        assert_eq!(doc.get("hero.colors.custom"), Some(&json!("#abc")));

        match change {
            SectionChange::AppliedWithStyle { inverse, .. } => {
                assert_eq!(inverse.apply(&doc).unwrap(), existing);
            }
            other => panic!("expected style merge, got {:?}", other),
        }
    }

    #[test]
    fn test_remove_hides_and_keeps_content() {
        let doc = Document::from_value(json!({ "faq": { "items": ["a"] } }));
        let (manager, structure, documents) = setup(&["hero", "faq", "footer"], doc.clone());

        assert!(manager.remove_section("faq").unwrap().is_applied());
        assert_eq!(names(&structure.order()), vec!["hero", "footer"]);
        assert_eq!(structure.visibility().get("faq"), Some(false));
        assert_eq!(documents.document(), doc);

        assert_eq!(
            manager.remove_section("faq").unwrap(),
            SectionChange::Rejected(Rejection::NotPresent(SectionId::from("faq")))
        );
    }

    #[test]
    fn test_remove_pinned_footer() {
        let (manager, structure, _) = setup(&["hero", "footer"], Document::new());
        assert!(manager.remove_section("footer").unwrap().is_applied());
        assert_eq!(names(&structure.order()), vec!["hero"]);
    }

    #[test]
    fn test_reorder_rejections() {
        let (manager, structure, _) = setup(&["hero", "faq", "footer"], Document::new());
        let before = structure.order();

        assert_eq!(
            manager.reorder("footer", "hero").unwrap(),
            SectionChange::Rejected(Rejection::PinnedSection(SectionId::from("footer")))
        );
        assert_eq!(
            manager.reorder("hero", "hero").unwrap(),
            SectionChange::Rejected(Rejection::SameSection(SectionId::from("hero")))
        );
        assert!(!manager.reorder("hero", "pricing").unwrap().is_applied());
        assert_eq!(structure.order(), before);
    }

    #[test]
    fn test_toggle_visibility() {
        let (manager, structure, _) = setup(&["hero", "footer"], Document::new());

        manager.toggle_visibility("hero").unwrap();
        assert!(!structure.visibility().is_visible("hero"));
        manager.toggle_visibility("hero").unwrap();
        assert!(structure.visibility().is_visible("hero"));

        assert!(!manager.toggle_visibility("pricing").unwrap().is_applied());
    }

    #[test]
    fn test_addable_sections_follow_order() {
        let (manager, _, _) = setup(&["hero", "footer"], Document::new());
        let before: Vec<String> = manager
            .addable_sections()
            .iter()
            .map(|e| e.id.to_string())
            .collect();
        assert!(!before.contains(&"footer".to_string()));
        assert!(before.contains(&"faq".to_string()));

        manager.add_section("faq").unwrap();
        manager.remove_section("footer").unwrap();
        let after: Vec<String> = manager
            .addable_sections()
            .iter()
            .map(|e| e.id.to_string())
            .collect();
        assert!(after.contains(&"footer".to_string()));
        assert!(!after.contains(&"faq".to_string()));
    }

    #[test]
    fn test_reorder_remove_add_scenario() {
        let (manager, structure, _) = setup(&["hero", "features", "footer"], Document::new());

        manager.reorder("features", "hero").unwrap();
        assert_eq!(names(&structure.order()), vec!["features", "hero", "footer"]);

        manager.remove_section("features").unwrap();
        assert_eq!(names(&structure.order()), vec!["hero", "footer"]);
        assert_eq!(structure.visibility().get("features"), Some(false));

        manager.add_section("features").unwrap();
        assert_eq!(names(&structure.order()), vec!["hero", "features", "footer"]);
        assert_eq!(structure.visibility().get("features"), Some(true));
    }
}
