use std::cmp::Ordering;
use std::collections::HashMap;

use crate::resource::Resource;
use crate::tags::{TagRegistry, GENERAL_TAG};

pub const ALL_KEY: &str = "__all__";
pub const GROUPS_KEY: &str = "__groups__";

/// Which slice of the directory the card renderer shows.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DisplayMode {
    #[default]
    All,
    Groups,
    Category(String),
}

impl DisplayMode {
    pub fn from_key(key: &str) -> Self {
        match key {
            ALL_KEY => Self::All,
            GROUPS_KEY => Self::Groups,
            other => Self::Category(other.to_string()),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::All => ALL_KEY,
            Self::Groups => GROUPS_KEY,
            Self::Category(name) => name,
        }
    }

    pub fn shows_category(&self, name: &str) -> bool {
        match self {
            Self::All | Self::Groups => true,
            Self::Category(selected) => selected == name,
        }
    }
}

/// Locale-aware comparison for normal tag names. In the browser this is
/// `String.prototype.localeCompare`; elsewhere a case-insensitive fallback.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    #[cfg(target_arch = "wasm32")]
    {
        let result = js_sys::JsString::from(a).locale_compare(
            b,
            &js_sys::Array::new(),
            &js_sys::Object::new(),
        );
        result.cmp(&0)
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        a.to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b))
    }
}

/// Special tags first by registry order, then everything else via `collate`.
pub fn compare_categories(
    a: &str,
    b: &str,
    registry: &TagRegistry,
    collate: impl Fn(&str, &str) -> Ordering,
) -> Ordering {
    match (registry.is_special(a), registry.is_special(b)) {
        (true, true) => registry
            .order(a)
            .cmp(&registry.order(b))
            .then_with(|| a.cmp(b)),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => collate(a, b),
    }
}

/// Tag → resources mapping for one render pass. Members are positions in the
/// snapshot the index was built from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategoryIndex {
    categories: Vec<String>,
    members: HashMap<String, Vec<usize>>,
}

impl CategoryIndex {
    pub fn build(resources: &[Resource], registry: &TagRegistry) -> Self {
        Self::build_with(resources, registry, locale_compare)
    }

    pub fn build_with(
        resources: &[Resource],
        registry: &TagRegistry,
        collate: impl Fn(&str, &str) -> Ordering,
    ) -> Self {
        let mut members: HashMap<String, Vec<usize>> = HashMap::new();
        for (position, resource) in resources.iter().enumerate() {
            if resource.tags.is_empty() {
                members
                    .entry(GENERAL_TAG.to_string())
                    .or_default()
                    .push(position);
                continue;
            }
            for tag in &resource.tags {
                let bucket = members.entry(tag.clone()).or_default();
                // a tag listed twice on one resource still files it once
                if bucket.last() != Some(&position) {
                    bucket.push(position);
                }
            }
        }

        let mut categories: Vec<String> = members.keys().cloned().collect();
        categories.sort_by(|a, b| compare_categories(a, b, registry, &collate));
        Self {
            categories,
            members,
        }
    }

    /// Category names, special tags first.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn members(&self, category: &str) -> &[usize] {
        self.members.get(category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, category: &str) -> bool {
        self.members.contains_key(category)
    }
}
