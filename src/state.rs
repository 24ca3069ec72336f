use leptos::prelude::*;

use crate::config::{Preferences, DEFAULT_TAG_KEY};
use crate::error::ConfigError;
use crate::index::DisplayMode;
use crate::resource::Resource;
use crate::search::normalize_query;
use crate::tags::{reapply_default, reassign_default, SpecialTag, TagRegistry};

/// Process-wide UI state. The snapshot is only written by the feed
/// (fetch / reconcile) and the tag configuration operations below; display
/// mode and query only by the category bar, tag chips and the search box.
#[derive(Clone, Copy)]
pub struct AppState {
    /// `None` until the first load finishes.
    pub resources: RwSignal<Option<Vec<Resource>>>,
    pub featured: RwSignal<Vec<Resource>>,
    pub registry: RwSignal<TagRegistry>,
    pub display_mode: RwSignal<DisplayMode>,
    pub query: RwSignal<String>,
}

impl AppState {
    pub fn new(registry: TagRegistry) -> Self {
        Self {
            resources: RwSignal::new(None),
            featured: RwSignal::new(Vec::new()),
            registry: RwSignal::new(registry),
            display_mode: RwSignal::new(DisplayMode::All),
            query: RwSignal::new(String::new()),
        }
    }

    pub fn snapshot(&self) -> Option<Vec<Resource>> {
        self.resources.get_untracked()
    }

    /// Swaps the whole snapshot; the cards re-render from it.
    pub fn replace_resources(&self, resources: Vec<Resource>) {
        self.resources.set(Some(resources));
    }

    pub fn set_display_mode(&self, mode: DisplayMode) {
        self.display_mode.set(mode);
    }

    pub fn set_query(&self, raw: &str) -> String {
        let query = normalize_query(raw);
        self.query.set(query.clone());
        query
    }

    /// Makes `tag` the auto-applied status tag: the previous default is pulled
    /// from every resource, the new one injected, and the choice persisted.
    pub fn set_default_tag(&self, tag: &str) -> Result<(), ConfigError> {
        let mut registry = self.registry.get_untracked();
        let previous = registry.set_default(tag)?;
        if previous == tag {
            return Ok(());
        }
        if let Some(current) = self.snapshot() {
            self.resources
                .set(Some(reassign_default(&current, &previous, &registry)));
        }
        self.registry.set(registry);
        if let Err(e) = Preferences::store(DEFAULT_TAG_KEY, tag) {
            leptos::logging::warn!("[state] could not persist default tag: {e}");
        }
        leptos::logging::log!("[state] default tag changed from {previous:?} to {tag:?}");
        Ok(())
    }

    pub fn register_special_tag(&self, name: &str, tag: SpecialTag) {
        self.registry.update(|registry| registry.insert(name, tag));
        self.reapply_default_tags();
    }

    /// Re-runs default injection over the snapshot. Returns how many resources
    /// were processed.
    pub fn reapply_default_tags(&self) -> usize {
        let Some(current) = self.snapshot() else {
            leptos::logging::log!("[state] no resources loaded yet");
            return 0;
        };
        let updated = self
            .registry
            .with_untracked(|registry| reapply_default(&current, registry));
        let count = updated.len();
        self.resources.set(Some(updated));
        count
    }
}
