//! # Section Order
//!
//! Ordered, duplicate-free list of section ids with one pinned id that always
//! sits at the tail when present.
//!
//! All operations here are pure list splices; eligibility rules live in the
//! [`SectionOrderManager`](crate::SectionOrderManager).

use serde::{Deserialize, Serialize};
use sitekit_common::SectionId;
use std::collections::BTreeMap;

/// Ordered section ids, render order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionOrder(Vec<SectionId>);

/// Per-section visibility. Missing entries are visible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisibilityMap(BTreeMap<SectionId, bool>);

impl SectionOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from ids, dropping repeats and moving `pinned` to the tail
    pub fn from_ids<I, S>(ids: I, pinned: &SectionId) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SectionId>,
    {
        let mut items: Vec<SectionId> = Vec::new();
        for id in ids {
            let id = id.into();
            if !items.contains(&id) {
                items.push(id);
            }
        }

        let mut order = Self(items);
        order.repin(pinned);
        order
    }

    pub fn ids(&self) -> &[SectionId] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &SectionId> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|s| s.as_str() == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.0.iter().position(|s| s.as_str() == id)
    }

    /// Insert just before the pinned tail, or at the end when it is absent.
    /// Returns `None` if `id` is already present.
    pub fn with_inserted(&self, id: SectionId, pinned: &SectionId) -> Option<SectionOrder> {
        if self.contains(id.as_str()) {
            return None;
        }

        let mut items = self.0.clone();
        match items.iter().position(|s| s == pinned) {
            Some(tail) if id != *pinned => items.insert(tail, id),
            _ => items.push(id),
        }

        let mut order = SectionOrder(items);
        order.repin(pinned);
        Some(order)
    }

    /// Remove `id` wherever it is. Returns `None` if it is not present.
    pub fn without(&self, id: &str) -> Option<SectionOrder> {
        let index = self.position(id)?;
        let mut items = self.0.clone();
        items.remove(index);
        Some(SectionOrder(items))
    }

    /// Drag `source` onto `target`: `source` ends up immediately before
    /// `target` in the unpinned prefix.
    ///
    /// Returns `None` when either id is missing, is the pinned id, or both
    /// are the same section.
    pub fn reordered(
        &self,
        source: &str,
        target: &str,
        pinned: &SectionId,
    ) -> Option<SectionOrder> {
        let had_tail = self.0.iter().any(|s| s == pinned);
        let mut items: Vec<SectionId> = self.0.iter().filter(|s| *s != pinned).cloned().collect();

        let from = items.iter().position(|s| s.as_str() == source)?;
        let to = items.iter().position(|s| s.as_str() == target)?;
        if from == to {
            return None;
        }

        let moved = items.remove(from);
        let to = if to > from { to - 1 } else { to };
        items.insert(to, moved);

        if had_tail {
            items.push(pinned.clone());
        }
        Some(SectionOrder(items))
    }

    /// Move `pinned` to the tail if it is present anywhere else
    fn repin(&mut self, pinned: &SectionId) {
        if let Some(index) = self.0.iter().position(|s| s == pinned) {
            if index + 1 != self.0.len() {
                let tail = self.0.remove(index);
                self.0.push(tail);
            }
        }
    }
}

impl<'a> IntoIterator for &'a SectionOrder {
    type Item = &'a SectionId;
    type IntoIter = std::slice::Iter<'a, SectionId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl VisibilityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Visibility of `id`; sections without an entry are visible
    pub fn is_visible(&self, id: &str) -> bool {
        self.0.get(id).copied().unwrap_or(true)
    }

    /// Explicit entry for `id`, if any
    pub fn get(&self, id: &str) -> Option<bool> {
        self.0.get(id).copied()
    }

    pub fn set(&mut self, id: SectionId, visible: bool) {
        self.0.insert(id, visible);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SectionId, bool)> {
        self.0.iter().map(|(id, visible)| (id, *visible))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn footer() -> SectionId {
        SectionId::from("footer")
    }

    fn order(ids: &[&str]) -> SectionOrder {
        SectionOrder::from_ids(ids.iter().copied(), &footer())
    }

    fn names(order: &SectionOrder) -> Vec<&str> {
        order.iter().map(SectionId::as_str).collect()
    }

    #[test]
    fn test_from_ids_dedupes_and_pins_tail() {
        let order = order(&["footer", "hero", "hero", "faq"]);
        assert_eq!(names(&order), vec!["hero", "faq", "footer"]);
    }

    #[test]
    fn test_insert_lands_before_pinned_tail() {
        let updated = order(&["hero", "footer"])
            .with_inserted(SectionId::from("pricing"), &footer())
            .unwrap();
        assert_eq!(names(&updated), vec!["hero", "pricing", "footer"]);
    }

    #[test]
    fn test_insert_appends_without_tail() {
        let updated = order(&["hero"])
            .with_inserted(SectionId::from("pricing"), &footer())
            .unwrap();
        assert_eq!(names(&updated), vec!["hero", "pricing"]);
    }

    #[test]
    fn test_insert_pinned_goes_last() {
        let updated = order(&["hero", "faq"]).with_inserted(footer(), &footer()).unwrap();
        assert_eq!(names(&updated), vec!["hero", "faq", "footer"]);
    }

    #[test]
    fn test_insert_existing_is_rejected() {
        assert!(order(&["hero", "footer"])
            .with_inserted(SectionId::from("hero"), &footer())
            .is_none());
    }

    #[test]
    fn test_without_removes_from_any_position() {
        let base = order(&["hero", "faq", "footer"]);
        assert_eq!(names(&base.without("hero").unwrap()), vec!["faq", "footer"]);
        assert_eq!(names(&base.without("footer").unwrap()), vec!["hero", "faq"]);
        assert!(base.without("pricing").is_none());
    }

    #[test]
    fn test_reorder_moves_source_before_target() {
        let base = order(&["hero", "features", "footer"]);
        let updated = base.reordered("features", "hero", &footer()).unwrap();
        assert_eq!(names(&updated), vec!["features", "hero", "footer"]);
    }

    #[test]
    fn test_reorder_forward_applies_shift_correction() {
        let base = order(&["a", "b", "c", "d", "footer"]);

        // Removing "a" shifts "c" from 2 to 1; "a" lands before it.
        let updated = base.reordered("a", "c", &footer()).unwrap();
        assert_eq!(names(&updated), vec!["b", "a", "c", "d", "footer"]);

        // Dropping onto the next section keeps the order.
        let same = base.reordered("a", "b", &footer()).unwrap();
        assert_eq!(names(&same), names(&base));
    }

    #[test]
    fn test_reorder_ignores_pinned_and_unknown_ids() {
        let base = order(&["hero", "faq", "footer"]);
        assert!(base.reordered("footer", "hero", &footer()).is_none());
        assert!(base.reordered("hero", "footer", &footer()).is_none());
        assert!(base.reordered("hero", "pricing", &footer()).is_none());
        assert!(base.reordered("hero", "hero", &footer()).is_none());
    }

    #[test]
    fn test_visibility_defaults_to_visible() {
        let mut visibility = VisibilityMap::new();
        assert!(visibility.is_visible("hero"));
        assert_eq!(visibility.get("hero"), None);

        visibility.set(SectionId::from("hero"), false);
        assert!(!visibility.is_visible("hero"));
    }

    fn arb_order() -> impl Strategy<Value = (Vec<String>, bool)> {
        (
            prop::collection::btree_set("[a-h]{1,3}", 1..8),
            any::<bool>(),
        )
            .prop_map(|(ids, with_footer)| (ids.into_iter().collect::<Vec<String>>(), with_footer))
    }

    proptest! {
        #[test]
        fn prop_reorder_is_permutation_with_pinned_tail(
            (ids, with_footer) in arb_order(),
            moves in prop::collection::vec((0usize..16, 0usize..16), 0..20),
        ) {
            let mut all: Vec<String> = ids.clone();
            if with_footer {
                all.push("footer".to_string());
            }
            let mut current = SectionOrder::from_ids(all.iter().cloned(), &footer());
            let mut expected: Vec<String> = all.clone();
            expected.sort();

            for (s, t) in moves {
                let source = &ids[s % ids.len()];
                let target = &ids[t % ids.len()];
                if let Some(next) = current.reordered(source, target, &footer()) {
                    current = next;
                }

                let mut seen: Vec<String> = current.iter().map(|id| id.to_string()).collect();
                seen.sort();
                prop_assert_eq!(&seen, &expected);

                if with_footer {
                    prop_assert_eq!(current.ids().last().map(SectionId::as_str), Some("footer"));
                }
            }
        }
    }
}
