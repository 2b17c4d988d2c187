//! # Component Catalog
//!
//! Static table of every section type the builder knows about: display
//! label, icon, whether the section may appear only once, and the style
//! defaults merged in when the section is added.
//!
//! Style defaults may only carry presentation keys. Adding a section merges
//! its defaults over whatever content the user already had for that id, so a
//! content-shaped key here would silently overwrite user text on re-add.
//! [`Catalog::insert`] rejects such entries.

use crate::manager::Rejection;
use crate::order::SectionOrder;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sitekit_common::SectionId;
use thiserror::Error;

/// Keys a `default_style` object may contain
pub const PRESENTATION_KEYS: &[&str] = &[
    "colors",
    "background",
    "backgroundImage",
    "layout",
    "alignment",
    "padding",
    "spacing",
    "columns",
    "variant",
    "theme",
    "borderRadius",
    "shadow",
    "animation",
    "fontFamily",
    "headingFont",
    "bodyFont",
    "fontSize",
    "lineHeight",
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("Section '{0}' is already in the catalog")]
    DuplicateSection(SectionId),

    #[error("Default style for '{section}' contains non-presentation key '{key}'")]
    ContentKeyInDefaults { section: SectionId, key: String },
}

/// One catalog row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: SectionId,
    pub label: String,
    pub icon: String,
    #[serde(default)]
    pub singleton: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_style: Option<Map<String, Value>>,
}

impl CatalogEntry {
    pub fn new(
        id: impl Into<SectionId>,
        label: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            icon: icon.into(),
            singleton: false,
            default_style: None,
        }
    }

    pub fn singleton(mut self) -> Self {
        self.singleton = true;
        self
    }

    /// Attach style defaults; non-object values are ignored
    pub fn with_default_style(mut self, style: Value) -> Self {
        if let Value::Object(style) = style {
            self.default_style = Some(style);
        }
        self
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if let Some(style) = &self.default_style {
            if let Some(key) = style.keys().find(|k| !PRESENTATION_KEYS.contains(&k.as_str())) {
                return Err(CatalogError::ContentKeyInDefaults {
                    section: self.id.clone(),
                    key: key.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Section catalog, in menu order
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: CatalogEntry) -> Result<(), CatalogError> {
        if self.contains(entry.id.as_str()) {
            return Err(CatalogError::DuplicateSection(entry.id));
        }
        entry.validate()?;
        self.entries.push(entry);
        Ok(())
    }

    pub fn with_entry(mut self, entry: CatalogEntry) -> Result<Self, CatalogError> {
        self.insert(entry)?;
        Ok(self)
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.id.as_str() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn is_singleton(&self, id: &str) -> bool {
        self.get(id).map(|e| e.singleton).unwrap_or(false)
    }

    /// Check whether `id` may be added to `order`
    pub fn check_addable(
        &self,
        order: &SectionOrder,
        id: &str,
    ) -> Result<&CatalogEntry, Rejection> {
        let entry = self
            .get(id)
            .ok_or_else(|| Rejection::UnknownSection(SectionId::from(id)))?;

        if order.contains(id) {
            return Err(if entry.singleton {
                Rejection::SingletonPresent(entry.id.clone())
            } else {
                Rejection::AlreadyPresent(entry.id.clone())
            });
        }

        Ok(entry)
    }

    /// Entries that could be added to `order` right now
    pub fn addable<'a>(
        &'a self,
        order: &'a SectionOrder,
    ) -> impl Iterator<Item = &'a CatalogEntry> + 'a {
        self.entries.iter().filter(move |e| !order.contains(e.id.as_str()))
    }

    /// The site builder's built-in sections
    pub fn standard() -> Self {
        let entries = vec![
            CatalogEntry::new("style", "Global Style", "palette")
                .singleton()
                .with_default_style(json!({
                    "colors": { "primary": "#2563eb", "background": "#ffffff", "text": "#111827" },
                    "borderRadius": "8px"
                })),
            CatalogEntry::new("typography", "Typography", "type")
                .singleton()
                .with_default_style(json!({
                    "headingFont": "Inter",
                    "bodyFont": "Inter",
                    "fontSize": "16px",
                    "lineHeight": 1.5
                })),
            CatalogEntry::new("navbar", "Navigation", "menu").with_default_style(json!({
                "layout": "inline",
                "colors": { "background": "#ffffff", "text": "#111827" }
            })),
            CatalogEntry::new("hero", "Hero", "sparkles").with_default_style(json!({
                "layout": "centered",
                "colors": { "background": "#0f172a", "text": "#f8fafc", "accent": "#38bdf8" }
            })),
            CatalogEntry::new("features", "Features", "grid").with_default_style(json!({
                "columns": 3,
                "colors": { "background": "#ffffff", "text": "#111827" }
            })),
            CatalogEntry::new("about", "About", "info"),
            CatalogEntry::new("services", "Services", "briefcase").with_default_style(json!({
                "columns": 2
            })),
            CatalogEntry::new("pricing", "Pricing", "tag").with_default_style(json!({
                "columns": 3,
                "variant": "cards",
                "colors": { "background": "#f8fafc", "accent": "#2563eb" }
            })),
            CatalogEntry::new("testimonials", "Testimonials", "quote").with_default_style(json!({
                "variant": "carousel"
            })),
            CatalogEntry::new("team", "Team", "users"),
            CatalogEntry::new("gallery", "Gallery", "image").with_default_style(json!({
                "columns": 4,
                "spacing": "8px"
            })),
            CatalogEntry::new("stats", "Stats", "bar-chart"),
            CatalogEntry::new("faq", "FAQ", "help-circle"),
            CatalogEntry::new("blog", "Blog", "file-text"),
            CatalogEntry::new("contact", "Contact", "mail").with_default_style(json!({
                "layout": "split"
            })),
            CatalogEntry::new("cta", "Call to Action", "megaphone").with_default_style(json!({
                "alignment": "center",
                "colors": { "background": "#2563eb", "text": "#ffffff" }
            })),
            CatalogEntry::new("footer", "Footer", "panel-bottom")
                .singleton()
                .with_default_style(json!({
                    "colors": { "background": "#0f172a", "text": "#94a3b8" }
                })),
        ];

        Self { entries }
    }
}
