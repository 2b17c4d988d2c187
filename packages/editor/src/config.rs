use crate::errors::EditorError;
use serde::{Deserialize, Serialize};
use sitekit_common::{FileSystem, RealFileSystem, SectionId};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_NAME: &str = "sitekit.config.json";

/// Editor configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Quiet interval before a changed section is written to its page
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Section kept at the end of every order
    #[serde(default = "default_pinned_section")]
    pub pinned_section: SectionId,

    /// Undo history depth (0 = unlimited)
    #[serde(default = "default_undo_levels")]
    pub undo_levels: usize,
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_pinned_section() -> SectionId {
    SectionId::from("footer")
}

fn default_undo_levels() -> usize {
    100
}

impl EditorConfig {
    /// Load config from a directory
    pub fn load(dir: &Path) -> Result<Self, EditorError> {
        Self::load_from(&RealFileSystem, dir)
    }

    /// Load config from a directory on `fs`; defaults when the file is absent
    pub fn load_from(fs: &dyn FileSystem, dir: &Path) -> Result<Self, EditorError> {
        let config_path = dir.join(DEFAULT_CONFIG_NAME);

        if fs.exists(&config_path) {
            let content = fs.read_to_string(&config_path)?;
            let config: EditorConfig = serde_json::from_str(&content)?;
            tracing::debug!("[EditorConfig] loaded {}", config_path.display());
            Ok(config)
        } else {
            Ok(EditorConfig::default())
        }
    }

    pub fn quiet_interval(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            pinned_section: default_pinned_section(),
            undo_levels: default_undo_levels(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitekit_common::MockFileSystem;
    use std::path::PathBuf;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "debounceMs": 250,
            "pinnedSection": "contact"
        }"#;

        let config: EditorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.debounce_ms, 250);
        assert_eq!(config.pinned_section, SectionId::from("contact"));
        assert_eq!(config.undo_levels, 100);
        assert_eq!(config.quiet_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let fs = MockFileSystem::new();
        let config = EditorConfig::load_from(&fs, Path::new("/site")).unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.quiet_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_load_from_directory() {
        let fs = MockFileSystem::new();
        fs.add_file(
            PathBuf::from("/site").join(DEFAULT_CONFIG_NAME),
            r#"{ "undoLevels": 5 }"#,
        );

        let config = EditorConfig::load_from(&fs, Path::new("/site")).unwrap();
        assert_eq!(config.undo_levels, 5);
        assert_eq!(config.pinned_section, SectionId::from("footer"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let fs = MockFileSystem::new();
        fs.add_file(PathBuf::from("/site").join(DEFAULT_CONFIG_NAME), "{ nope");

        assert!(matches!(
            EditorConfig::load_from(&fs, Path::new("/site")),
            Err(EditorError::Json(_))
        ));
    }
}
