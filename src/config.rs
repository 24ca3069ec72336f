use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::ConfigError;
use crate::tags::{SpecialTag, TagRegistry, DEFAULT_SPECIAL_TAG};

pub const THEME_MODE_KEY: &str = "themeMode";
pub const COLOR_THEME_KEY: &str = "colorTheme";
pub const DEFAULT_TAG_KEY: &str = "defaultSpecialTag";
const SITE_CONFIG_ID: &str = "site-config";

/// Site-wide settings. Everything has a built-in default; a host page may
/// override any subset with a `<script id="site-config" type="application/json">`
/// block.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SiteConfig {
    pub endpoints: Vec<String>,
    pub fetch_timeout_ms: u32,
    pub action_timeout_ms: u32,
    pub poll_interval_ms: u32,
    pub resume_delay_ms: u32,
    pub search_debounce_ms: u32,
    pub notice_ms: u32,
    pub special_tags: Option<BTreeMap<String, SpecialTag>>,
    pub default_tag: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![
                "https://raw.githubusercontent.com/mifongjvav/AFS/refs/heads/main/AFS.json".to_string(),
                "https://hub.gitmirror.com/raw.githubusercontent.com/mifongjvav/AFS/refs/heads/main/AFS.json".to_string(),
            ],
            fetch_timeout_ms: 5000,
            action_timeout_ms: 8000,
            poll_interval_ms: 10_000,
            resume_delay_ms: 1000,
            search_debounce_ms: 180,
            notice_ms: 3000,
            special_tags: None,
            default_tag: DEFAULT_SPECIAL_TAG.to_string(),
        }
    }
}

impl SiteConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Reads the inline override block, if the page has one.
    pub fn from_page() -> Self {
        let inline = leptos::prelude::document()
            .get_element_by_id(SITE_CONFIG_ID)
            .and_then(|el| el.text_content())
            .filter(|text| !text.trim().is_empty());
        let Some(json) = inline else {
            return Self::default();
        };
        match Self::from_json(&json) {
            Ok(config) => config,
            Err(e) => {
                leptos::logging::warn!("[config] {e}, using defaults");
                Self::default()
            }
        }
    }

    /// Registry from config, with `preferred` (usually the persisted choice)
    /// taking precedence over the configured default when it is valid.
    pub fn registry(&self, preferred: Option<&str>) -> TagRegistry {
        let mut registry = match &self.special_tags {
            Some(tags) => TagRegistry::new(tags.clone(), &self.default_tag).unwrap_or_else(|e| {
                leptos::logging::warn!("[config] {e}, using the built-in tag registry");
                TagRegistry::default()
            }),
            None => TagRegistry::default(),
        };
        if self.special_tags.is_none() && self.default_tag != registry.default_tag() {
            if let Err(e) = registry.set_default(&self.default_tag) {
                leptos::logging::warn!("[config] {e}");
            }
        }
        if let Some(tag) = preferred {
            if registry.set_default(tag).is_err() {
                leptos::logging::warn!("[config] ignoring stored default tag {tag:?}");
            }
        }
        registry
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms.into())
    }

    pub fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms.into())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.into())
    }

    pub fn resume_delay(&self) -> Duration {
        Duration::from_millis(self.resume_delay_ms.into())
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms.into())
    }

    pub fn notice_duration(&self) -> Duration {
        Duration::from_millis(self.notice_ms.into())
    }
}

fn storage() -> Result<web_sys::Storage, ConfigError> {
    web_sys::window()
        .and_then(|w| w.local_storage().ok().flatten())
        .ok_or(ConfigError::Storage)
}

/// UI preferences kept in local storage, read once at startup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Preferences {
    pub theme_mode: Option<String>,
    pub color_theme: Option<String>,
    pub default_tag: Option<String>,
}

impl Preferences {
    pub fn load() -> Self {
        let Ok(storage) = storage() else {
            return Self::default();
        };
        let read = |key: &str| storage.get_item(key).ok().flatten();
        Self {
            theme_mode: read(THEME_MODE_KEY),
            color_theme: read(COLOR_THEME_KEY),
            default_tag: read(DEFAULT_TAG_KEY),
        }
    }

    pub fn store(key: &str, value: &str) -> Result<(), ConfigError> {
        storage()?
            .set_item(key, value)
            .map_err(|_| ConfigError::Storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_override_keeps_defaults() {
        let config = SiteConfig::from_json(r#"{"endpoints": [], "poll_interval_ms": 500}"#).unwrap();
        assert!(config.endpoints.is_empty());
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.fetch_timeout(), Duration::from_secs(5));
        assert_eq!(config.search_debounce(), Duration::from_millis(180));
    }

    #[test]
    fn malformed_override_is_an_error() {
        assert!(matches!(
            SiteConfig::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn stored_default_tag_wins_when_valid() {
        let config = SiteConfig::default();
        assert_eq!(config.registry(Some("待定")).default_tag(), "待定");
        assert_eq!(
            config.registry(Some("bogus")).default_tag(),
            DEFAULT_SPECIAL_TAG
        );
        assert_eq!(config.registry(None).default_tag(), DEFAULT_SPECIAL_TAG);
    }

    #[test]
    fn custom_registry_from_config() {
        let config = SiteConfig::from_json(
            r##"{"special_tags": {"listed": {"color": "#0f0", "order": 0, "icon": "fas fa-store"}},
                "default_tag": "listed"}"##,
        )
        .unwrap();
        let registry = config.registry(None);
        assert!(registry.is_special("listed"));
        assert!(!registry.is_special("上架"));
        assert_eq!(registry.default_tag(), "listed");
    }
}
