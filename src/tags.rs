use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::error::ConfigError;
use crate::resource::{scalar_value, ActionKind, RawResource, RawTags, Resource};

/// Synthetic bucket for resources that carry no tag at all.
pub const GENERAL_TAG: &str = "通用";
/// Chip label shown on a resource without tags.
pub const UNGROUPED_TAG: &str = "无组别";
/// Tag rendered with the distinct "group default" chip style.
pub const FEATURED_TAG: &str = "精选";
pub const DEFAULT_SPECIAL_TAG: &str = "坟场";
pub const UNKNOWN_TAG_ORDER: i32 = 999;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SpecialTag {
    pub color: String,
    pub order: i32,
    pub icon: String,
}

impl SpecialTag {
    pub fn new(color: &str, order: i32, icon: &str) -> Self {
        Self {
            color: color.to_string(),
            order,
            icon: icon.to_string(),
        }
    }
}

/// Status tags with their own color, icon and sort order, plus the one that gets
/// auto-applied to tagged resources lacking any status.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TagRegistry {
    tags: BTreeMap<String, SpecialTag>,
    default_tag: String,
}

impl Default for TagRegistry {
    fn default() -> Self {
        let tags = [
            ("上架", SpecialTag::new("#10B981", 0, "fas fa-store")),
            ("过审", SpecialTag::new("#3b82f6", 1, "fas fa-check-circle")),
            ("待定", SpecialTag::new("#FFD700", 2, "fas fa-hourglass-half")),
            ("制作中", SpecialTag::new("#FF8C00", 3, "fas fa-tools")),
            ("坟场", SpecialTag::new("#888888", 4, "fas fa-skull")),
            ("用户喜爱", SpecialTag::new("#EC4899", 5, "fas fa-heart")),
        ]
        .into_iter()
        .map(|(name, tag)| (name.to_string(), tag))
        .collect();
        Self {
            tags,
            default_tag: DEFAULT_SPECIAL_TAG.to_string(),
        }
    }
}

impl TagRegistry {
    pub fn new(tags: BTreeMap<String, SpecialTag>, default_tag: &str) -> Result<Self, ConfigError> {
        let mut registry = Self {
            tags,
            default_tag: String::new(),
        };
        registry.set_default(default_tag)?;
        Ok(registry)
    }

    pub fn is_special(&self, tag: &str) -> bool {
        self.tags.contains_key(tag)
    }

    pub fn get(&self, tag: &str) -> Option<&SpecialTag> {
        self.tags.get(tag)
    }

    pub fn order(&self, tag: &str) -> i32 {
        self.tags.get(tag).map_or(UNKNOWN_TAG_ORDER, |t| t.order)
    }

    pub fn default_tag(&self) -> &str {
        &self.default_tag
    }

    /// Special tag names by ascending order.
    pub fn names_in_order(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tags.keys().map(String::as_str).collect();
        names.sort_by_key(|name| (self.order(name), *name));
        names
    }

    /// Switches the default tag and returns the previous one.
    pub fn set_default(&mut self, tag: &str) -> Result<String, ConfigError> {
        if !self.is_special(tag) {
            return Err(ConfigError::UnknownSpecialTag {
                name: tag.to_string(),
                known: self.names_in_order().join(", "),
            });
        }
        Ok(std::mem::replace(&mut self.default_tag, tag.to_string()))
    }

    pub fn insert(&mut self, name: &str, tag: SpecialTag) {
        self.tags.insert(name.to_string(), tag);
    }
}

fn separator() -> &'static Regex {
    static RE_SEPARATOR: OnceLock<Regex> = OnceLock::new();
    RE_SEPARATOR.get_or_init(|| Regex::new(r"\s*[，,]\s*|\s+").unwrap())
}

/// Splits a `class` string on ASCII/full-width commas and whitespace runs.
pub fn split_tags(text: &str) -> Vec<String> {
    separator()
        .split(text)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn normalize_tags(raw: Option<&RawTags>) -> Vec<String> {
    match raw {
        Some(RawTags::Text(text)) => split_tags(text),
        Some(RawTags::List(list)) => list
            .iter()
            .filter_map(scalar_value)
            .filter(|tag| !tag.trim().is_empty())
            .collect(),
        Some(RawTags::Other(_)) | None => Vec::new(),
    }
}

/// Appends the registry default when the list has real tags but no special
/// one. Empty lists are left alone; they end up in the general bucket later.
pub fn with_default_tag(tags: &[String], registry: &TagRegistry) -> Vec<String> {
    let mut out = tags.to_vec();
    let has_special = out.iter().any(|tag| registry.is_special(tag));
    if !has_special && !out.is_empty() && !out.iter().any(|t| t == registry.default_tag()) {
        out.push(registry.default_tag().to_string());
    }
    out
}

pub fn classify(raw: &RawResource, registry: &TagRegistry) -> Resource {
    let tags = normalize_tags(raw.tags.as_ref());
    Resource {
        title: raw.title.clone().unwrap_or_default(),
        icon: raw.icon.clone().filter(|icon| !icon.trim().is_empty()),
        icon_style: raw.icon_style.clone(),
        description: raw.description.clone().unwrap_or_default(),
        link: raw.target().unwrap_or_default().to_string(),
        link_text: raw.link_text.clone(),
        action: ActionKind::parse(raw.kind.as_deref()),
        tags: with_default_tag(&tags, registry),
    }
}

pub fn classify_all(raw: &[RawResource], registry: &TagRegistry) -> Vec<Resource> {
    raw.iter().map(|r| classify(r, registry)).collect()
}

/// Re-runs default injection over an already classified snapshot.
pub fn reapply_default(resources: &[Resource], registry: &TagRegistry) -> Vec<Resource> {
    resources
        .iter()
        .map(|r| Resource {
            tags: with_default_tag(&r.tags, registry),
            ..r.clone()
        })
        .collect()
}

/// Drops the first occurrence of the previous default from every resource,
/// then injects the registry's current default.
pub fn reassign_default(
    resources: &[Resource],
    previous: &str,
    registry: &TagRegistry,
) -> Vec<Resource> {
    resources
        .iter()
        .map(|r| {
            let mut tags = r.tags.clone();
            if let Some(pos) = tags.iter().position(|t| t == previous) {
                tags.remove(pos);
            }
            Resource {
                tags: with_default_tag(&tags, registry),
                ..r.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(class: Option<RawTags>) -> RawResource {
        RawResource {
            title: Some("A".into()),
            link: Some("https://x/a".into()),
            tags: class,
            ..Default::default()
        }
    }

    #[test]
    fn splits_on_mixed_separators() {
        assert_eq!(
            split_tags("工具, 数学，特效  3D"),
            vec!["工具", "数学", "特效", "3D"]
        );
        assert_eq!(split_tags(" ,, "), Vec::<String>::new());
    }

    #[test]
    fn injects_default_once() {
        let registry = TagRegistry::default();
        let resource = classify(&raw(Some(RawTags::Text("Tools".into()))), &registry);
        assert_eq!(resource.tags, vec!["Tools", DEFAULT_SPECIAL_TAG]);

        let again = reapply_default(std::slice::from_ref(&resource), &registry);
        assert_eq!(again[0].tags, resource.tags);
    }

    #[test]
    fn leaves_empty_tag_lists_empty() {
        let registry = TagRegistry::default();
        assert!(classify(&raw(None), &registry).tags.is_empty());
        assert!(classify(&raw(Some(RawTags::Text("  ".into()))), &registry)
            .tags
            .is_empty());
        assert!(classify(&raw(Some(RawTags::List(vec![]))), &registry)
            .tags
            .is_empty());
    }

    #[test]
    fn list_keeps_numbers_and_drops_other_shapes() {
        let registry = TagRegistry::default();
        let list = RawTags::List(vec!["3D".into(), 2024.into(), serde_json::Value::Null, " ".into()]);
        assert_eq!(
            classify(&raw(Some(list)), &registry).tags,
            vec!["3D", "2024", DEFAULT_SPECIAL_TAG]
        );
        let odd = RawTags::Other(serde_json::json!({"name": "Tools"}));
        assert!(classify(&raw(Some(odd)), &registry).tags.is_empty());
    }

    #[test]
    fn url_fills_in_for_missing_link() {
        let registry = TagRegistry::default();
        let entry = RawResource {
            title: Some("B".into()),
            url: Some("https://x/b".into()),
            ..Default::default()
        };
        assert_eq!(classify(&entry, &registry).link, "https://x/b");
    }

    #[test]
    fn existing_special_tag_blocks_injection() {
        let registry = TagRegistry::default();
        let resource = classify(
            &raw(Some(RawTags::List(vec!["3D".into(), "上架".into()]))),
            &registry,
        );
        assert_eq!(resource.tags, vec!["3D", "上架"]);
    }

    #[test]
    fn special_lookup_is_case_sensitive() {
        let mut registry = TagRegistry::default();
        registry.insert("Listed", SpecialTag::new("#000", 9, "fas fa-list"));
        let resource = classify(&raw(Some(RawTags::Text("listed".into()))), &registry);
        assert_eq!(resource.tags, vec!["listed", DEFAULT_SPECIAL_TAG]);
    }

    #[test]
    fn classify_does_not_touch_input() {
        let registry = TagRegistry::default();
        let input = raw(Some(RawTags::Text("Tools".into())));
        let before = input.clone();
        let _ = classify(&input, &registry);
        assert_eq!(input, before);
    }

    #[test]
    fn rejects_unknown_default() {
        let mut registry = TagRegistry::default();
        let err = registry.set_default("nope").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownSpecialTag { .. }));
        assert_eq!(registry.default_tag(), DEFAULT_SPECIAL_TAG);
    }

    #[test]
    fn reassigning_default_swaps_injected_tag() {
        let mut registry = TagRegistry::default();
        let resources = classify_all(
            &[
                raw(Some(RawTags::Text("Tools".into()))),
                raw(Some(RawTags::Text("3D 上架".into()))),
            ],
            &registry,
        );
        let previous = registry.set_default("待定").unwrap();
        let updated = reassign_default(&resources, &previous, &registry);
        assert_eq!(updated[0].tags, vec!["Tools", "待定"]);
        assert_eq!(updated[1].tags, vec!["3D", "上架"]);
    }

    #[test]
    fn names_follow_registry_order() {
        let registry = TagRegistry::default();
        assert_eq!(
            registry.names_in_order(),
            vec!["上架", "过审", "待定", "制作中", "坟场", "用户喜爱"]
        );
        assert_eq!(registry.order("whatever"), UNKNOWN_TAG_ORDER);
    }
}
