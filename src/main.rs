mod actions;
mod app;
mod category_bar;
mod config;
mod console_api;
mod error;
mod fetch;
mod highlight;
mod index;
mod markdown;
mod reconcile;
mod render;
mod resource;
mod search;
mod state;
mod tags;
mod theme;
mod title;

use app::*;
use leptos::prelude::*;

fn main() {
    console_error_panic_hook::set_once();
    mount_to_body(|| {
        view! {
            <App/>
        }
    })
}
