use leptos::prelude::*;
use std::time::Duration;
use wasm_bindgen::prelude::*;

const ACTIVE_DELAY: Duration = Duration::from_millis(2500);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TitlePhase {
    Welcome,
    Active,
    Away,
}

impl TitlePhase {
    pub fn text(self) -> &'static str {
        match self {
            Self::Welcome => "才没有欢迎您回来呢！",
            Self::Active => "AFS",
            Self::Away => "哎...你怎么跑了",
        }
    }
}

/// Tab title that greets on arrival and complains when the page loses focus.
#[derive(Clone, Copy)]
pub struct DynamicTitle {
    active: StoredValue<bool>,
    pending: StoredValue<Option<TimeoutHandle>>,
}

impl DynamicTitle {
    pub fn install() -> Self {
        let title = Self {
            active: StoredValue::new(true),
            pending: StoredValue::new(None),
        };
        title.welcome();

        let on_visibility = Closure::<dyn FnMut()>::new(move || {
            if document().hidden() {
                title.away();
            } else {
                title.welcome();
            }
        });
        let _ = document().add_event_listener_with_callback(
            "visibilitychange",
            on_visibility.as_ref().unchecked_ref(),
        );
        on_visibility.forget();

        let on_blur = Closure::<dyn FnMut()>::new(move || title.away());
        let _ = window().add_event_listener_with_callback("blur", on_blur.as_ref().unchecked_ref());
        on_blur.forget();

        let on_focus = Closure::<dyn FnMut()>::new(move || title.welcome());
        let _ = window().add_event_listener_with_callback("focus", on_focus.as_ref().unchecked_ref());
        on_focus.forget();

        let on_unload = Closure::<dyn FnMut()>::new(move || title.cancel());
        let _ = window()
            .add_event_listener_with_callback("beforeunload", on_unload.as_ref().unchecked_ref());
        on_unload.forget();

        title
    }

    fn show(phase: TitlePhase) {
        document().set_title(phase.text());
    }

    fn cancel(&self) {
        if let Some(handle) = self.pending.try_update_value(Option::take).flatten() {
            handle.clear();
        }
    }

    fn welcome(self) {
        self.active.set_value(true);
        self.cancel();
        Self::show(TitlePhase::Welcome);
        let active = self.active;
        match set_timeout_with_handle(
            move || {
                if active.get_value() {
                    Self::show(TitlePhase::Active);
                }
            },
            ACTIVE_DELAY,
        ) {
            Ok(handle) => self.pending.set_value(Some(handle)),
            Err(e) => leptos::logging::warn!("[title] {e:?}"),
        }
    }

    fn away(self) {
        self.active.set_value(false);
        self.cancel();
        Self::show(TitlePhase::Away);
    }
}
