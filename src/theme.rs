use leptos::prelude::*;
use wasm_bindgen::prelude::*;

use crate::config::{Preferences, COLOR_THEME_KEY, THEME_MODE_KEY};
use crate::state::AppState;

pub const COLOR_THEMES: [&str; 5] = ["blue", "green", "purple", "orange", "pink"];
const DEFAULT_COLOR_THEME: &str = "blue";
const DARK_QUERY: &str = "(prefers-color-scheme: dark)";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ThemeMode {
    #[default]
    FollowSystem,
    Light,
    Dark,
}

impl ThemeMode {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("light") => Self::Light,
            Some("dark") => Self::Dark,
            _ => Self::FollowSystem,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FollowSystem => "follow-system",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// The concrete `data-theme` value, given whether the system prefers dark.
    pub fn resolve(self, system_dark: bool) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::FollowSystem if system_dark => "dark",
            Self::FollowSystem => "light",
        }
    }
}

pub fn parse_color_theme(raw: Option<&str>) -> &'static str {
    raw.and_then(|name| COLOR_THEMES.iter().copied().find(|t| *t == name))
        .unwrap_or(DEFAULT_COLOR_THEME)
}

fn set_body_data(key: &str, value: &str) {
    if let Some(body) = document().body() {
        let _ = body.set_attribute(key, value);
    }
}

fn dark_query() -> Option<web_sys::MediaQueryList> {
    window().match_media(DARK_QUERY).ok().flatten()
}

fn persist(key: &str, value: &str) {
    if let Err(e) = Preferences::store(key, value) {
        leptos::logging::warn!("[theme] could not persist {key}: {e}");
    }
}

#[derive(Clone, Copy)]
pub struct Theme {
    pub mode: RwSignal<ThemeMode>,
    pub color: RwSignal<&'static str>,
}

impl Theme {
    /// Applies the stored preferences and starts tracking the system scheme.
    pub fn init(prefs: &Preferences) -> Self {
        let theme = Self {
            mode: RwSignal::new(ThemeMode::parse(prefs.theme_mode.as_deref())),
            color: RwSignal::new(parse_color_theme(prefs.color_theme.as_deref())),
        };
        theme.apply_mode();
        set_body_data("data-color-theme", theme.color.get_untracked());

        if let Some(query) = dark_query() {
            let mode = theme.mode;
            let closure = Closure::<dyn FnMut(web_sys::MediaQueryListEvent)>::new(
                move |e: web_sys::MediaQueryListEvent| {
                    if mode.get_untracked() == ThemeMode::FollowSystem {
                        set_body_data("data-theme", ThemeMode::FollowSystem.resolve(e.matches()));
                    }
                },
            );
            let _ = query.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        theme
    }

    fn apply_mode(&self) {
        let system_dark = dark_query().is_some_and(|q| q.matches());
        set_body_data("data-theme", self.mode.get_untracked().resolve(system_dark));
    }

    pub fn set_mode(&self, mode: ThemeMode) {
        self.mode.set(mode);
        self.apply_mode();
        persist(THEME_MODE_KEY, mode.as_str());
    }

    pub fn set_color(&self, name: &str) {
        let color = parse_color_theme(Some(name));
        self.color.set(color);
        set_body_data("data-color-theme", color);
        persist(COLOR_THEME_KEY, color);
    }
}

#[component]
pub fn ThemePanel(theme: Theme) -> impl IntoView {
    let state = expect_context::<AppState>();
    let (open, set_open) = signal(false);

    let mode_button = move |mode: ThemeMode, icon: &'static str, label: &'static str| {
        view! {
            <button
                class="theme-mode-option"
                class:active=move || theme.mode.get() == mode
                on:click=move |_| theme.set_mode(mode)
            >
                <i class=icon></i>
                " "
                {label}
            </button>
        }
    };

    let tag_names = move || {
        state
            .registry
            .with(|r| r.names_in_order().into_iter().map(String::from).collect::<Vec<_>>())
    };
    let default_tag = move || state.registry.with(|r| r.default_tag().to_string());

    view! {
        <div class="theme-panel-wrapper">
            <button class="theme-toggle" title="主题设置" on:click=move |_| set_open.update(|o| *o = !*o)>
                <i class="fas fa-palette"></i>
            </button>
            <div class="theme-panel" class:open=move || open.get()>
                <div class="theme-mode-options">
                    {mode_button(ThemeMode::FollowSystem, "fas fa-desktop", "跟随系统")}
                    {mode_button(ThemeMode::Light, "fas fa-sun", "浅色")}
                    {mode_button(ThemeMode::Dark, "fas fa-moon", "深色")}
                </div>
                <div class="color-theme-options">
                    {COLOR_THEMES.iter().map(|&name| view! {
                        <button
                            class="color-theme-btn"
                            class:active=move || theme.color.get() == name
                            data-color-theme=name
                            title=name
                            on:click=move |_| theme.set_color(name)
                        ></button>
                    }).collect::<Vec<_>>()}
                </div>
                <label class="default-tag-option">
                    "默认标签"
                    <select
                        prop:value=default_tag
                        on:change=move |e| {
                            if let Err(err) = state.set_default_tag(&event_target_value(&e)) {
                                leptos::logging::warn!("[theme] {err}");
                            }
                        }
                    >
                        {move || tag_names().into_iter().map(|name| {
                            let selected = name == default_tag();
                            let value = name.clone();
                            view! { <option value=value selected=selected>{name}</option> }
                        }).collect::<Vec<_>>()}
                    </select>
                </label>
            </div>
        </div>
    }
}
