use leptos::prelude::*;
use std::collections::HashSet;

use crate::index::{CategoryIndex, DisplayMode};
use crate::state::AppState;
use crate::tags::{TagRegistry, GENERAL_TAG, UNGROUPED_TAG};

const ALL_LABEL: &str = "全部";
const GROUPS_LABEL: &str = "组别";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BarEntry {
    pub label: String,
    pub mode: DisplayMode,
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl BarEntry {
    fn plain(label: &str, mode: DisplayMode) -> Self {
        Self {
            label: label.to_string(),
            mode,
            icon: None,
            color: None,
        }
    }
}

/// Buttons for the category bar: the two sentinels, the special tags that are
/// actually present (registry order), then the remaining tags in index order.
pub fn bar_entries(index: &CategoryIndex, registry: &TagRegistry) -> Vec<BarEntry> {
    let mut entries = vec![
        BarEntry::plain(ALL_LABEL, DisplayMode::All),
        BarEntry::plain(GROUPS_LABEL, DisplayMode::Groups),
    ];
    let mut seen = HashSet::new();

    for name in registry.names_in_order() {
        if !index.contains(name) || !seen.insert(name.to_string()) {
            continue;
        }
        let tag = registry.get(name);
        entries.push(BarEntry {
            label: name.to_string(),
            mode: DisplayMode::Category(name.to_string()),
            icon: tag.map(|t| t.icon.clone()),
            color: tag.map(|t| t.color.clone()),
        });
    }

    for name in index.categories() {
        if name == GENERAL_TAG || name == UNGROUPED_TAG || registry.is_special(name) {
            continue;
        }
        if seen.insert(name.clone()) {
            entries.push(BarEntry::plain(name, DisplayMode::Category(name.clone())));
        }
    }
    entries
}

#[component]
pub fn CategoryBar(index: Memo<CategoryIndex>) -> impl IntoView {
    let state = expect_context::<AppState>();

    let entries = move || {
        let index = index.get();
        state
            .registry
            .with(|registry| bar_entries(&index, registry))
    };

    view! {
        <div id="category-bar" class="category-bar" role="tablist">
            {move || entries().into_iter().map(|entry| {
                let mode = entry.mode.clone();
                let click_mode = entry.mode.clone();
                let is_active = move || state.display_mode.with(|current| *current == mode);
                let style = entry.color.as_ref().map(|c| format!("--tag-color: {c};"));
                view! {
                    <button
                        class="category-btn"
                        class:active=is_active
                        data-category=entry.mode.key().to_string()
                        style=style
                        on:click=move |_| state.set_display_mode(click_mode.clone())
                    >
                        {entry.icon.map(|icon| view! { <i class=icon></i> " " })}
                        {entry.label}
                    </button>
                }
            }).collect::<Vec<_>>()}
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{ActionKind, Resource};

    fn resource(tags: &[&str]) -> Resource {
        Resource {
            title: "t".into(),
            icon: None,
            icon_style: None,
            description: String::new(),
            link: "https://x".into(),
            link_text: None,
            action: ActionKind::Jump,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn labels(entries: &[BarEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.label.as_str()).collect()
    }

    #[test]
    fn sentinels_then_specials_then_normals() {
        let registry = TagRegistry::default();
        let resources = vec![
            resource(&["Tools", "坟场"]),
            resource(&["Audio", "上架"]),
            resource(&[]),
        ];
        let index = CategoryIndex::build_with(&resources, &registry, |a, b| a.cmp(b));
        let entries = bar_entries(&index, &registry);
        assert_eq!(
            labels(&entries),
            vec!["全部", "组别", "上架", "坟场", "Audio", "Tools"]
        );
        assert_eq!(entries[0].mode, DisplayMode::All);
        assert_eq!(entries[1].mode, DisplayMode::Groups);
        assert_eq!(entries[2].icon.as_deref(), registry.get("上架").map(|t| t.icon.as_str()));
        assert!(entries[4].icon.is_none());
    }

    #[test]
    fn absent_special_tags_are_skipped() {
        let registry = TagRegistry::default();
        let resources = vec![resource(&["Tools"])];
        let index = CategoryIndex::build_with(&resources, &registry, |a, b| a.cmp(b));
        assert_eq!(labels(&bar_entries(&index, &registry)), vec!["全部", "组别", "Tools"]);
    }

    #[test]
    fn general_and_ungrouped_are_excluded() {
        let registry = TagRegistry::default();
        let resources = vec![resource(&[UNGROUPED_TAG]), resource(&[])];
        let index = CategoryIndex::build_with(&resources, &registry, |a, b| a.cmp(b));
        assert_eq!(labels(&bar_entries(&index, &registry)), vec!["全部", "组别"]);
    }
}
