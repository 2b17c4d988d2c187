//! Pages and projects.

use crate::document::Document;
use crate::order::{SectionOrder, VisibilityMap};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sitekit_common::{PageId, SectionId};
use std::collections::BTreeMap;

/// A page of the site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: PageId,
    pub title: String,
    #[serde(default)]
    pub slug: String,
    /// Page-specific order; overrides the project order when non-empty
    #[serde(default)]
    pub sections: SectionOrder,
    /// Last persisted snapshot of each section's content
    #[serde(default)]
    pub section_data: BTreeMap<SectionId, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Page {
    pub fn new(id: impl Into<PageId>, title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            id: id.into(),
            slug: slugify(&title),
            title,
            sections: SectionOrder::new(),
            section_data: BTreeMap::new(),
            updated_at: None,
        }
    }

    pub fn with_sections(mut self, sections: SectionOrder) -> Self {
        self.sections = sections;
        self
    }

    /// The page's own order when it has one, `project_order` otherwise
    pub fn effective_order<'a>(&'a self, project_order: &'a SectionOrder) -> &'a SectionOrder {
        if self.sections.is_empty() {
            project_order
        } else {
            &self.sections
        }
    }

    /// Apply a partial update
    pub fn apply_patch(&mut self, patch: PagePatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(slug) = patch.slug {
            self.slug = slug;
        }
        if let Some(sections) = patch.sections {
            self.sections = sections;
        }
        for (section, snapshot) in patch.section_data {
            self.section_data.insert(section, snapshot);
        }
        self.updated_at = Some(Utc::now());
    }
}

/// Partial page update. `section_data` entries replace the stored snapshot
/// for their key and leave the other keys alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PagePatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub sections: Option<SectionOrder>,
    pub section_data: BTreeMap<SectionId, Value>,
}

impl PagePatch {
    pub fn section_snapshot(section: SectionId, snapshot: Value) -> Self {
        let mut section_data = BTreeMap::new();
        section_data.insert(section, snapshot);
        Self {
            section_data,
            ..Self::default()
        }
    }

    pub fn sections(sections: SectionOrder) -> Self {
        Self {
            sections: Some(sections),
            ..Self::default()
        }
    }
}

/// Everything the editor works on: the content document, the project-wide
/// structure and the pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub document: Document,
    #[serde(default)]
    pub order: SectionOrder,
    #[serde(default)]
    pub visibility: VisibilityMap,
    #[serde(default)]
    pub pages: Vec<Page>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_page: Option<PageId>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn page(&self, id: &PageId) -> Option<&Page> {
        self.pages.iter().find(|p| &p.id == id)
    }

    pub fn page_mut(&mut self, id: &PageId) -> Option<&mut Page> {
        self.pages.iter_mut().find(|p| &p.id == id)
    }

    pub fn active_page(&self) -> Option<&Page> {
        self.active_page.as_ref().and_then(|id| self.page(id))
    }

    /// Order the editor should show: the active page's own order if it has
    /// one, the project order otherwise
    pub fn effective_order(&self) -> &SectionOrder {
        match self.active_page() {
            Some(page) => page.effective_order(&self.order),
            None => &self.order,
        }
    }
}

fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(c.to_ascii_lowercase());
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn footer() -> SectionId {
        SectionId::from("footer")
    }

    #[test]
    fn test_page_slug_from_title() {
        let page = Page::new("p1", "About Us & Team!");
        assert_eq!(page.slug, "about-us-team");
    }

    #[test]
    fn test_effective_order_prefers_page_sections() {
        let project_order = SectionOrder::from_ids(["hero", "footer"], &footer());
        let page = Page::new("p1", "Home");
        assert_eq!(page.effective_order(&project_order), &project_order);

        let own = SectionOrder::from_ids(["pricing", "footer"], &footer());
        let page = page.with_sections(own.clone());
        assert_eq!(page.effective_order(&project_order), &own);
    }

    #[test]
    fn test_patch_replaces_only_named_snapshots() {
        let mut page = Page::new("p1", "Home");
        page.section_data.insert(SectionId::from("hero"), json!({ "title": "A" }));
        page.section_data.insert(SectionId::from("faq"), json!({ "items": [] }));

        page.apply_patch(PagePatch::section_snapshot(
            SectionId::from("hero"),
            json!({ "subtitle": "B" }),
        ));

        assert_eq!(page.section_data["hero"], json!({ "subtitle": "B" }));
        assert_eq!(page.section_data["faq"], json!({ "items": [] }));
        assert!(page.updated_at.is_some());
    }

    #[test]
    fn test_project_serializes_camel_case() {
        let mut project = Project::new("Demo");
        project.pages.push(Page::new("home", "Home"));
        project.active_page = Some(PageId::from("home"));

        let value = serde_json::to_value(&project).unwrap();
        assert_eq!(value["activePage"], json!("home"));
        assert!(value["pages"][0].get("sectionData").is_some());

        let back: Project = serde_json::from_value(value).unwrap();
        assert_eq!(back, project);
    }
}
