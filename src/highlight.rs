//! DOM half of the search engine: visibility toggling and text-node
//! highlighting over rendered cards. Matching itself lives in `search`.

use leptos::prelude::document;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, Node};

use crate::render::{CARD_CLASS, GROUP_CLASS};
use crate::search::{
    card_matches, group_visible, QueryMatcher, Segment, HIGHLIGHT_CLASS, HIGHLIGHT_TAG,
};

const SHOW_TEXT: u32 = 0x4;
const TITLE_SELECTOR: &str = "h3, .title, .resource-title";
const DESCRIPTION_SELECTOR: &str = ".resource-description, p, .description";

fn query_all(root: &Element, selector: &str) -> Vec<Element> {
    let Ok(list) = root.query_selector_all(selector) else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

fn visible_text(el: &Element) -> String {
    match el.dyn_ref::<HtmlElement>() {
        Some(html) => html.inner_text(),
        None => el.text_content().unwrap_or_default(),
    }
}

/// Replaces every highlight marker under `el` with its own text and merges the
/// resulting adjacent text nodes.
pub fn remove_highlights(el: &Element) {
    let Some(doc) = el.owner_document() else {
        return;
    };
    let selector = format!("{HIGHLIGHT_TAG}.{HIGHLIGHT_CLASS}");
    for mark in query_all(el, &selector) {
        let Some(parent) = mark.parent_node() else {
            continue;
        };
        let text = doc.create_text_node(&mark.text_content().unwrap_or_default());
        if parent.replace_child(&text, &mark).is_ok() {
            parent.normalize();
        }
    }
}

fn text_nodes(doc: &Document, el: &Element) -> Vec<Node> {
    let Ok(walker) = doc.create_tree_walker_with_what_to_show(el, SHOW_TEXT) else {
        return Vec::new();
    };
    let mut nodes = Vec::new();
    // collect first: rewriting while walking confuses the walker
    while let Ok(Some(node)) = walker.next_node() {
        if node
            .node_value()
            .is_some_and(|value| !value.trim().is_empty())
        {
            nodes.push(node);
        }
    }
    nodes
}

fn rewrite_text_node(doc: &Document, node: &Node, segments: &[Segment<'_>]) {
    let Some(parent) = node.parent_node() else {
        return;
    };
    let fragment = doc.create_document_fragment();
    for segment in segments {
        let piece: Node = match segment {
            Segment::Plain(_) => doc.create_text_node(segment.text()).into(),
            Segment::Match(_) => {
                let Ok(mark) = doc.create_element(HIGHLIGHT_TAG) else {
                    return;
                };
                mark.set_class_name(HIGHLIGHT_CLASS);
                mark.set_text_content(Some(segment.text()));
                mark.into()
            }
        };
        if fragment.append_child(&piece).is_err() {
            return;
        }
    }
    let _ = parent.replace_child(&fragment, node);
}

/// Wraps every occurrence of the matcher's query inside `el`'s text nodes.
/// Existing markers are removed first, so repeated calls never double-wrap.
pub fn highlight(el: &Element, matcher: &QueryMatcher) {
    remove_highlights(el);
    let Some(doc) = el.owner_document() else {
        return;
    };
    for node in text_nodes(&doc, el) {
        let value = node.node_value().unwrap_or_default();
        if let Some(segments) = matcher.segments(&value) {
            rewrite_text_node(&doc, &node, &segments);
        }
    }
}

fn set_group_visible(group: &Element, visible: bool) {
    if let Some(html) = group.dyn_ref::<HtmlElement>() {
        let _ = html
            .style()
            .set_property("display", if visible { "" } else { "none" });
    }
}

/// Hides cards that do not contain `query`, highlights the ones that do, and
/// hides groups left without a visible card. An empty query restores all.
pub fn apply_filter(query: &str) {
    let query = query.trim();
    let doc = document();
    let Some(root) = doc.document_element() else {
        return;
    };
    let cards = query_all(&root, &format!(".{CARD_CLASS}"));
    if cards.is_empty() {
        return;
    }

    let matcher = if query.is_empty() {
        None
    } else {
        match QueryMatcher::new(query) {
            Ok(matcher) => Some(matcher),
            Err(e) => {
                leptos::logging::warn!("[search] cannot highlight {query:?}: {e}");
                None
            }
        }
    };

    for card in &cards {
        let title = card.query_selector(TITLE_SELECTOR).ok().flatten();
        let description = card.query_selector(DESCRIPTION_SELECTOR).ok().flatten();
        let parts = [title.as_ref(), description.as_ref()];

        let title_text = title.as_ref().map(visible_text).unwrap_or_default();
        let description_text = description.as_ref().map(visible_text).unwrap_or_default();

        if query.is_empty() || card_matches(&title_text, &description_text, query) {
            let _ = card.remove_attribute("aria-hidden");
            for el in parts.into_iter().flatten() {
                match &matcher {
                    Some(matcher) => highlight(el, matcher),
                    None => remove_highlights(el),
                }
            }
        } else {
            let _ = card.set_attribute("aria-hidden", "true");
            for el in parts.into_iter().flatten() {
                remove_highlights(el);
            }
        }
    }

    for group in query_all(&root, &format!(".{GROUP_CLASS}")) {
        let members: Vec<bool> = query_all(&group, &format!(".{CARD_CLASS}"))
            .iter()
            .map(|card| card.get_attribute("aria-hidden").as_deref() != Some("true"))
            .collect();
        set_group_visible(&group, group_visible(query, &members));
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    const MARKS: &str = "mark.search-highlight";

    fn mount(markup: &str) -> Element {
        let doc = document();
        let root = doc.create_element("div").unwrap();
        root.set_inner_html(markup);
        doc.body().unwrap().append_child(&root).unwrap();
        root
    }

    fn count(root: &Element, selector: &str) -> u32 {
        root.query_selector_all(selector).unwrap().length()
    }

    fn display(el: &Element) -> String {
        el.dyn_ref::<HtmlElement>()
            .unwrap()
            .style()
            .get_property_value("display")
            .unwrap()
    }

    #[wasm_bindgen_test]
    fn removing_highlights_restores_text() {
        let root = mount("<p>Sine and <b>cosine</b> and SINE</p>");
        let para = root.query_selector("p").unwrap().unwrap();
        let before = para.text_content();

        highlight(&para, &QueryMatcher::new("sin").unwrap());
        assert_eq!(count(&para, MARKS), 3);
        assert_eq!(para.text_content(), before);

        remove_highlights(&para);
        assert_eq!(count(&para, MARKS), 0);
        assert_eq!(para.text_content(), before);
        root.remove();
    }

    #[wasm_bindgen_test]
    fn repeated_highlight_does_not_double_wrap() {
        let root = mount("<p>abc abc</p>");
        let para = root.query_selector("p").unwrap().unwrap();
        let matcher = QueryMatcher::new("abc").unwrap();
        highlight(&para, &matcher);
        highlight(&para, &matcher);
        assert_eq!(count(&para, MARKS), 2);
        assert_eq!(count(&para, "mark mark"), 0);
        root.remove();
    }

    #[wasm_bindgen_test]
    fn filter_hides_empty_groups_and_clearing_restores_all() {
        let root = mount(
            r#"<div class="category-group" id="g-math">
                 <div class="resource-card"><h3>插值函数</h3><p class="resource-description">linear</p></div>
               </div>
               <div class="category-group" id="g-fx">
                 <div class="resource-card"><h3>血显特效</h3><p class="resource-description">health bar</p></div>
               </div>"#,
        );
        let math = root.query_selector("#g-math").unwrap().unwrap();
        let fx = root.query_selector("#g-fx").unwrap().unwrap();

        apply_filter("linear");
        let fx_card = fx.query_selector(".resource-card").unwrap().unwrap();
        assert_eq!(fx_card.get_attribute("aria-hidden").as_deref(), Some("true"));
        assert_eq!(display(&fx), "none");
        assert_eq!(display(&math), "");
        assert_eq!(count(&math, MARKS), 1);

        apply_filter("");
        assert_eq!(count(&root, "[aria-hidden='true']"), 0);
        assert_eq!(count(&root, MARKS), 0);
        assert_eq!(display(&fx), "");
        root.remove();
    }
}
