use regex::Regex;
use std::fmt::Write;
use std::sync::OnceLock;

use crate::index::{CategoryIndex, DisplayMode};
use crate::resource::Resource;
use crate::tags::{TagRegistry, FEATURED_TAG, GENERAL_TAG, UNGROUPED_TAG};

pub const CARD_CLASS: &str = "resource-card";
pub const GROUP_CLASS: &str = "category-group";

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Stable DOM id for a category group: a sanitized slug plus a short hash of
/// the full name, so names that sanitize to the same slug (or to nothing, as
/// CJK names do) still get distinct ids.
pub fn group_id(category: &str) -> String {
    static RE_SPACE: OnceLock<Regex> = OnceLock::new();
    static RE_NON_WORD: OnceLock<Regex> = OnceLock::new();
    let re_space = RE_SPACE.get_or_init(|| Regex::new(r"\s+").unwrap());
    let re_non_word = RE_NON_WORD.get_or_init(|| Regex::new(r"[^A-Za-z0-9_\-]").unwrap());

    let trimmed = category.trim();
    let dashed = re_space.replace_all(trimmed, "-");
    let base = re_non_word.replace_all(&dashed, "");
    let base = if base.is_empty() { "cat" } else { &base };
    format!("category-{base}-{}", short_hash(trimmed))
}

fn short_hash(text: &str) -> String {
    let mut h: i32 = 0;
    for unit in text.encode_utf16() {
        h = h.wrapping_mul(31).wrapping_add(unit as i32);
    }
    let digits = to_base36(i64::from(h).unsigned_abs());
    let start = digits.len().saturating_sub(4);
    digits[start..].to_string()
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Tag chips: special tags first in registry order, then the rest as listed.
pub fn render_tags(tags: &[String], registry: &TagRegistry) -> String {
    if tags.is_empty() {
        return format!(
            r#"<span class="tag no-group-tag" data-filter-tag="{}">{}</span>"#,
            escape_html(GENERAL_TAG),
            escape_html(UNGROUPED_TAG)
        );
    }

    let mut special: Vec<&String> = tags.iter().filter(|t| registry.is_special(t)).collect();
    special.sort_by_key(|t| registry.order(t));
    let normal = tags.iter().filter(|t| !registry.is_special(t));

    let mut html = String::new();
    for tag in special.into_iter().chain(normal) {
        let name = escape_html(tag);
        if let Some(meta) = registry.get(tag) {
            let _ = write!(
                html,
                r#"<span class="tag special-tag" data-special-tag="{name}" data-filter-tag="{name}" style="--tag-color: {color}"><i class="{icon} tag-icon"></i>{name}</span>"#,
                color = escape_html(&meta.color),
                icon = escape_html(&meta.icon),
            );
        } else if tag == FEATURED_TAG {
            let _ = write!(
                html,
                r#"<span class="tag group-default-tag" data-filter-tag="{name}">{name}</span>"#
            );
        } else {
            let _ = write!(
                html,
                r#"<span class="tag" data-tag="{name}" data-filter-tag="{name}">{name}</span>"#
            );
        }
    }
    html
}

pub fn render_card(resource: &Resource, registry: &TagRegistry, out: &mut String) {
    let icon = match resource.icon.as_deref() {
        Some(icon) => format!(
            r#"<i class="{}" style="{}"></i> "#,
            escape_html(icon),
            escape_html(resource.icon_style.as_deref().unwrap_or_default())
        ),
        None => String::new(),
    };
    let link = escape_html(&resource.link);
    let action = if resource.link.is_empty() {
        String::new()
    } else {
        format!(
            r#" data-action-link="{link}" data-action-type="{}""#,
            resource.action.as_str()
        )
    };
    let _ = write!(
        out,
        r#"<div class="{CARD_CLASS}"><h3>{icon}{title}</h3><div class="resource-description">{description}</div><div class="resource-tags">{tags}</div><a class="resource-action" href="{href}" rel="noopener noreferrer"{action}><i class="fas fa-external-link-alt"></i> {label}</a></div>"#,
        title = escape_html(resource.display_title()),
        description = resource.description,
        tags = render_tags(&resource.tags, registry),
        href = if link.is_empty() { "#".to_string() } else { link.clone() },
        label = escape_html(resource.display_link_text()),
    );
}

pub fn render_empty(message: &str) -> String {
    format!(
        r#"<div class="empty-state"><i class="fas fa-exclamation-triangle"></i><p>{}</p></div>"#,
        escape_html(message)
    )
}

pub fn render_loading() -> String {
    r#"<div class="loading-state"><i class="fas fa-spinner fa-spin"></i><p>正在加载函数...</p></div>"#
        .to_string()
}

fn render_group(
    category: &str,
    members: &[usize],
    resources: &[Resource],
    registry: &TagRegistry,
    out: &mut String,
) {
    let icon = if category == GENERAL_TAG || category == UNGROUPED_TAG {
        "fas fa-tag no-group-icon"
    } else {
        "fas fa-folder-open group-icon"
    };
    let name = escape_html(category);
    let _ = write!(
        out,
        r#"<div id="{id}" class="{GROUP_CLASS}"><div class="category-title" data-category="{name}"><i class="{icon}"></i> <span>{name}</span></div><div class="category-list">"#,
        id = group_id(category),
    );
    for &position in members {
        if let Some(resource) = resources.get(position) {
            render_card(resource, registry, out);
        }
    }
    out.push_str("</div></div>");
}

/// Full markup for the cards container. Callers replace the container's
/// content with this on every pass.
pub fn render_resources(
    resources: &[Resource],
    index: &CategoryIndex,
    mode: &DisplayMode,
    registry: &TagRegistry,
) -> String {
    if resources.is_empty() {
        return render_empty("暂无可用函数");
    }

    let mut html = String::new();
    if *mode == DisplayMode::All {
        html.push_str(r#"<div id="mixed-resources" class="mixed-resources">"#);
        for resource in resources {
            render_card(resource, registry, &mut html);
        }
        html.push_str("</div>");
        return html;
    }

    for category in index.categories() {
        if mode.shows_category(category) {
            render_group(category, index.members(category), resources, registry, &mut html);
        }
    }
    if html.is_empty() {
        return render_empty("该分类下暂无函数");
    }
    html
}

/// The featured strip uses the same card markup, without grouping.
pub fn render_featured(resources: &[Resource], registry: &TagRegistry) -> String {
    if resources.is_empty() {
        return String::new();
    }
    let mut html = String::from(r#"<div class="featured-list">"#);
    for resource in resources {
        render_card(resource, registry, &mut html);
    }
    html.push_str("</div>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ActionKind;

    fn resource(title: &str, tags: &[&str]) -> Resource {
        Resource {
            title: title.into(),
            icon: Some("fas fa-file".into()),
            icon_style: None,
            description: format!("<p>{title} desc</p>"),
            link: format!("https://x/{title}"),
            link_text: None,
            action: ActionKind::Copy,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn render(resources: &[Resource], mode: DisplayMode) -> String {
        let registry = TagRegistry::default();
        let index = CategoryIndex::build(resources, &registry);
        render_resources(resources, &index, &mode, &registry)
    }

    #[test]
    fn empty_list_renders_placeholder() {
        let html = render(&[], DisplayMode::All);
        assert!(html.contains("empty-state"));
        assert!(!html.contains(CARD_CLASS));
    }

    #[test]
    fn flat_mode_keeps_original_order() {
        let resources = vec![resource("b", &["x", "坟场"]), resource("a", &["y", "坟场"])];
        let html = render(&resources, DisplayMode::All);
        assert!(html.starts_with(r#"<div id="mixed-resources""#));
        assert!(html.find("https://x/b").unwrap() < html.find("https://x/a").unwrap());
        assert_eq!(html.matches(r#"class="resource-card""#).count(), 2);
    }

    #[test]
    fn groups_mode_renders_one_group_per_category() {
        let resources = vec![resource("a", &["x", "坟场"]), resource("b", &["y", "坟场"])];
        let html = render(&resources, DisplayMode::Groups);
        assert_eq!(html.matches(r#"class="category-group""#).count(), 3);
        assert!(html.find("坟场").unwrap() < html.find(r#"data-category="x""#).unwrap());
    }

    #[test]
    fn single_category_mode_renders_only_that_group() {
        let resources = vec![resource("a", &["x", "坟场"]), resource("b", &["y", "坟场"])];
        let html = render(&resources, DisplayMode::Category("y".into()));
        assert_eq!(html.matches(r#"class="category-group""#).count(), 1);
        assert!(html.contains("https://x/b"));
        assert!(!html.contains("https://x/a"));
    }

    #[test]
    fn vanished_category_renders_placeholder() {
        let resources = vec![resource("a", &["x", "坟场"])];
        let html = render(&resources, DisplayMode::Category("gone".into()));
        assert!(html.contains("empty-state"));
    }

    #[test]
    fn special_chips_come_first_with_registry_color() {
        let registry = TagRegistry::default();
        let tags: Vec<String> = ["3D", "坟场", "上架"].iter().map(|t| t.to_string()).collect();
        let html = render_tags(&tags, &registry);
        let listed = html.find("上架").unwrap();
        let graveyard = html.find("坟场").unwrap();
        let normal = html.find("3D").unwrap();
        assert!(listed < graveyard && graveyard < normal);
        assert!(html.contains("--tag-color: #10B981"));
        assert!(html.contains("fas fa-skull tag-icon"));
    }

    #[test]
    fn untagged_chip_filters_general_bucket() {
        let html = render_tags(&[], &TagRegistry::default());
        assert!(html.contains("无组别"));
        assert!(html.contains(r#"data-filter-tag="通用""#));
    }

    #[test]
    fn description_is_raw_but_title_is_escaped() {
        let mut r = resource("a", &["x"]);
        r.title = "<b>T</b>".into();
        let mut html = String::new();
        render_card(&r, &TagRegistry::default(), &mut html);
        assert!(html.contains("&lt;b&gt;T&lt;/b&gt;"));
        assert!(html.contains("<p>a desc</p>"));
        assert!(html.contains(r#"data-action-type="copy""#));
        assert!(html.contains("立即访问"));
    }

    #[test]
    fn missing_title_uses_placeholder() {
        let mut r = resource("a", &["x"]);
        r.title.clear();
        let mut html = String::new();
        render_card(&r, &TagRegistry::default(), &mut html);
        assert!(html.contains("未命名"));
    }

    #[test]
    fn group_ids_do_not_collide_on_similar_names() {
        assert_ne!(group_id("数学"), group_id("特效"));
        assert_ne!(group_id("Tools"), group_id("Tools!"));
        assert!(group_id("数学").starts_with("category-cat-"));
        assert!(group_id("My Tools").starts_with("category-My-Tools-"));
        assert_eq!(group_id("Tools"), group_id(" Tools "));
    }
}
