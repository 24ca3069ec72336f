use leptos::html;
use leptos::prelude::*;
use std::time::Duration;
use wasm_bindgen::prelude::*;
use web_sys::{Element, ScrollBehavior, ScrollIntoViewOptions, ScrollToOptions};

use crate::actions::activate;
use crate::category_bar::CategoryBar;
use crate::config::{Preferences, SiteConfig};
use crate::console_api;
use crate::highlight::apply_filter;
use crate::index::{CategoryIndex, DisplayMode};
use crate::markdown::{attach_copy_buttons, markdown_to_html, INTRO_MARKDOWN};
use crate::reconcile::ResourceFeed;
use crate::render::{render_featured, render_loading, render_resources};
use crate::resource::{featured_resources, ActionKind};
use crate::search::Debounce;
use crate::state::AppState;
use crate::tags::classify_all;
use crate::theme::{Theme, ThemePanel};
use crate::title::DynamicTitle;

const REAPPLY_DELAY: Duration = Duration::from_millis(30);
const NARROW_VIEWPORT: f64 = 768.0;

fn closest(target: Option<web_sys::EventTarget>, selector: &str) -> Option<Element> {
    target?
        .dyn_into::<Element>()
        .ok()?
        .closest(selector)
        .ok()
        .flatten()
}

fn scroll_to_resources() {
    let Some(section) = document().get_element_by_id("resources-section") else {
        leptos::logging::error!("[app] #resources-section is missing");
        return;
    };
    let options = ScrollIntoViewOptions::new();
    options.set_behavior(ScrollBehavior::Smooth);
    section.scroll_into_view_with_scroll_into_view_options(&options);
}

fn scroll_to_top() {
    let options = ScrollToOptions::new();
    options.set_top(0.0);
    options.set_behavior(ScrollBehavior::Smooth);
    window().scroll_to_with_scroll_to_options(&options);
}

/// Suspends polling while the tab is hidden and resumes it when it comes back.
fn watch_visibility(feed: ResourceFeed) {
    let on_visibility = Closure::<dyn FnMut()>::new(move || {
        if document().hidden() {
            feed.stop();
        } else {
            feed.resume();
        }
    });
    let _ = document().add_event_listener_with_callback(
        "visibilitychange",
        on_visibility.as_ref().unchecked_ref(),
    );
    on_visibility.forget();

    let on_unload = Closure::<dyn FnMut()>::new(move || feed.stop());
    let _ = window().add_event_listener_with_callback("beforeunload", on_unload.as_ref().unchecked_ref());
    on_unload.forget();
}

#[component]
fn SearchBox(config: StoredValue<SiteConfig>) -> impl IntoView {
    let state = expect_context::<AppState>();
    let (open, set_open) = signal(false);
    let input = RwSignal::new(String::new());
    let debounce = StoredValue::new(Debounce::<String>::default());
    let input_ref = NodeRef::<html::Input>::new();

    let apply = move |raw: &str| {
        let query = state.set_query(raw);
        apply_filter(&query);
    };

    let schedule = move |raw: String| {
        let Some(ticket) = debounce.try_update_value(|d| d.push(raw)) else {
            return;
        };
        let delay = config.with_value(SiteConfig::search_debounce);
        set_timeout(
            move || {
                if let Some(query) = debounce.try_update_value(|d| d.fire(ticket)).flatten() {
                    apply(&query);
                }
            },
            delay,
        );
    };

    let clear = move || {
        debounce.update_value(Debounce::cancel);
        input.set(String::new());
        apply("");
    };

    let toggle = move |_| {
        let now_open = !open.get_untracked();
        set_open.set(now_open);
        if now_open {
            if let Some(el) = input_ref.get_untracked() {
                let _ = el.focus();
            }
        }
    };

    let on_keydown = move |e: web_sys::KeyboardEvent| match e.key().as_str() {
        "Escape" => {
            if input.get_untracked().is_empty() {
                set_open.set(false);
            } else {
                clear();
            }
        }
        "Enter" => {
            e.prevent_default();
            debounce.update_value(Debounce::cancel);
            apply(&input.get_untracked());
        }
        _ => {}
    };

    let on_outside = Closure::<dyn FnMut(web_sys::MouseEvent)>::new(move |e: web_sys::MouseEvent| {
        let narrow = window()
            .inner_width()
            .ok()
            .and_then(|w| w.as_f64())
            .is_some_and(|w| w <= NARROW_VIEWPORT);
        if narrow && open.get_untracked() && closest(e.target(), "#nav-search").is_none() {
            set_open.set(false);
        }
    });
    let _ = document().add_event_listener_with_callback("click", on_outside.as_ref().unchecked_ref());
    on_outside.forget();

    view! {
        <div id="nav-search" class="nav-search">
            <button id="search-toggle" class="search-toggle" title="搜索" on:click=toggle>
                <i class="fas fa-search"></i>
            </button>
            <div id="search-wrapper" class="search-wrapper" class:open=move || open.get()>
                <input
                    id="nav-search-input"
                    type="search"
                    placeholder="搜索函数..."
                    autocomplete="off"
                    node_ref=input_ref
                    prop:value=move || input.get()
                    on:input=move |e| {
                        let raw = event_target_value(&e);
                        input.set(raw.clone());
                        schedule(raw);
                    }
                    on:keydown=on_keydown
                />
                <button
                    id="nav-search-clear"
                    class="search-clear"
                    title="清除"
                    style:display=move || if input.with(String::is_empty) { "none" } else { "" }
                    on:click=move |_| clear()
                >
                    <i class="fas fa-times"></i>
                </button>
            </div>
        </div>
    }
}

#[component]
fn UpdateNotice(notice: RwSignal<bool>, feed: ResourceFeed) -> impl IntoView {
    view! {
        <Show when=move || notice.get()>
            <div class="update-notice" role="status">
                <i class="fas fa-sync-alt"></i>
                " 函数已更新"
                <button class="notice-close" on:click=move |_| feed.dismiss_notice()>
                    <i class="fas fa-times"></i>
                </button>
            </div>
        </Show>
    }
}

#[component]
pub fn App() -> impl IntoView {
    let site_config = SiteConfig::from_page();
    let prefs = Preferences::load();
    let registry = site_config.registry(prefs.default_tag.as_deref());
    let featured = classify_all(&featured_resources(), &registry);

    let state = AppState::new(registry);
    state.featured.set(featured);
    provide_context(state);

    let config = StoredValue::new(site_config);
    let theme = Theme::init(&prefs);
    DynamicTitle::install();

    let notice = RwSignal::new(false);
    let feed = ResourceFeed::new(state, config, notice);
    watch_visibility(feed);
    console_api::install(state, feed);
    feed.load_initial();

    let index = Memo::new(move |_| {
        state.resources.with(|resources| {
            let resources = resources.as_deref().unwrap_or_default();
            state
                .registry
                .with(|registry| CategoryIndex::build(resources, registry))
        })
    });

    let cards_html = Memo::new(move |_| {
        state.resources.with(|resources| match resources {
            None => render_loading(),
            Some(resources) => index.with(|index| {
                state.display_mode.with(|mode| {
                    state
                        .registry
                        .with(|registry| render_resources(resources, index, mode, registry))
                })
            }),
        })
    });

    let featured_html = Memo::new(move |_| {
        state
            .featured
            .with(|featured| state.registry.with(|registry| render_featured(featured, registry)))
    });

    // cards are new text nodes after every render; re-run the search over them
    Effect::new(move |_| {
        cards_html.track();
        featured_html.track();
        set_timeout(
            move || apply_filter(&state.query.get_untracked()),
            REAPPLY_DELAY,
        );
    });

    let intro_ref = NodeRef::<html::Div>::new();
    Effect::new(move |_| {
        if let Some(el) = intro_ref.get() {
            attach_copy_buttons(&el);
        }
    });

    let on_card_click = move |e: web_sys::MouseEvent| {
        if let Some(chip) = closest(e.target(), "[data-filter-tag]") {
            e.stop_propagation();
            if let Some(tag) = chip.get_attribute("data-filter-tag") {
                state.set_display_mode(DisplayMode::from_key(&tag));
            }
            return;
        }
        if let Some(action) = closest(e.target(), "[data-action-type]") {
            e.prevent_default();
            let link = action.get_attribute("data-action-link").unwrap_or_default();
            let kind = ActionKind::parse(action.get_attribute("data-action-type").as_deref());
            activate(link, kind, config.with_value(SiteConfig::action_timeout));
        }
    };

    view! {
        <nav class="navbar">
            <div class="nav-brand">"AFS"</div>
            <div class="nav-actions">
                <SearchBox config=config />
                <button class="nav-btn" title="回到顶部" on:click=move |_| scroll_to_top()>
                    <i class="fas fa-arrow-up"></i>
                </button>
                <ThemePanel theme=theme />
            </div>
        </nav>
        <UpdateNotice notice=notice feed=feed />
        <main class="container" on:click=on_card_click>
            <section class="intro">
                <div
                    id="markdown-content"
                    class="markdown-body"
                    node_ref=intro_ref
                    inner_html=markdown_to_html(INTRO_MARKDOWN)
                ></div>
                <button class="scroll-btn" on:click=move |_| scroll_to_resources()>
                    <i class="fas fa-arrow-down"></i>
                    " 浏览函数"
                </button>
            </section>
            <section class="featured-section">
                <div id="featured-container" inner_html=move || featured_html.get()></div>
            </section>
            <section id="resources-section" class="resources-section">
                <CategoryBar index=index />
                <div id="resources-container" inner_html=move || cards_html.get()></div>
            </section>
        </main>
    }
}
