//! Hooks on `window` for poking at the directory from the browser console.

use leptos::prelude::*;
use wasm_bindgen::prelude::*;

use crate::reconcile::ResourceFeed;
use crate::state::AppState;
use crate::tags::SpecialTag;

fn expose(name: &str, function: &JsValue) {
    if let Err(e) = js_sys::Reflect::set(&window(), &JsValue::from_str(name), function) {
        leptos::logging::warn!("[console] cannot expose {name}: {e:?}");
    }
}

pub fn install(state: AppState, feed: ResourceFeed) {
    let get_default = Closure::<dyn Fn() -> String>::new(move || {
        state.registry.with_untracked(|r| r.default_tag().to_string())
    });
    expose("getDefaultTag", get_default.as_ref());
    get_default.forget();

    let set_default = Closure::<dyn Fn(String) -> bool>::new(move |tag: String| {
        match state.set_default_tag(&tag) {
            Ok(()) => true,
            Err(e) => {
                leptos::logging::warn!("[console] {e}");
                false
            }
        }
    });
    expose("setDefaultTag", set_default.as_ref());
    set_default.forget();

    let reapply = Closure::<dyn Fn() -> usize>::new(move || state.reapply_default_tags());
    expose("reapplyDefaultTags", reapply.as_ref());
    reapply.forget();

    let register = Closure::<dyn Fn(String, String, i32, String)>::new(
        move |name: String, color: String, order: i32, icon: String| {
            state.register_special_tag(&name, SpecialTag::new(&color, order, &icon));
        },
    );
    expose("registerSpecialTag", register.as_ref());
    register.forget();

    let refresh = Closure::<dyn Fn()>::new(move || feed.tick());
    expose("manualUpdateResources", refresh.as_ref());
    refresh.forget();

    state.registry.with_untracked(|r| {
        leptos::logging::log!("[AFS] default special tag: {}", r.default_tag());
        leptos::logging::log!("[AFS] special tags: {}", r.names_in_order().join(", "));
    });
    leptos::logging::log!(
        "[AFS] console: setDefaultTag(name), getDefaultTag(), reapplyDefaultTags(), manualUpdateResources()"
    );
}
