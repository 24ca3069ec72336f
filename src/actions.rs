use leptos::prelude::{document, set_timeout, window};
use leptos::task::spawn_local;
use std::time::Duration;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::error::{ActionError, FetchError};
use crate::fetch::get_with_timeout;
use crate::resource::ActionKind;

const REVOKE_DELAY: Duration = Duration::from_secs(1);
const FALLBACK_FILENAME: &str = "download";

/// Name for a downloaded file: the last non-empty path segment of `url`.
pub fn guess_filename(url: &str) -> String {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = rest.find('/').map_or("", |i| &rest[i..]);
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(FALLBACK_FILENAME)
        .to_string()
}

impl From<FetchError> for ActionError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Timeout { .. } => Self::Timeout,
            FetchError::Status { status, .. } => Self::Status(status),
            other => Self::Network(other.to_string()),
        }
    }
}

fn js_message(value: JsValue) -> String {
    value
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{value:?}"))
}

/// Resolves `link` against the page URL.
pub fn resolve_url(link: &str) -> Result<String, ActionError> {
    let base = window().location().href().unwrap_or_default();
    web_sys::Url::new_with_base(link, &base)
        .map(|url| url.href())
        .map_err(|_| ActionError::InvalidLink(link.to_string()))
}

fn open_in_new_tab(url: &str) {
    if let Err(e) = window().open_with_url_and_target(url, "_blank") {
        leptos::logging::error!("[actions] cannot open {url}: {e:?}");
    }
}

fn offer_to_open(prompt: &str, url: &str, error: &ActionError) {
    let message = format!("{prompt}\n\n错误：{error}");
    if window().confirm_with_message(&message).unwrap_or(false) {
        open_in_new_tab(url);
    }
}

async fn write_clipboard(text: &str) -> Result<(), ActionError> {
    let navigator = window().navigator();
    let supported = js_sys::Reflect::has(&navigator, &JsValue::from_str("clipboard")).unwrap_or(false);
    if !supported {
        let _ = window().alert_with_message("当前浏览器不支持剪贴板 API，请手动复制。");
        return Err(ActionError::Clipboard("Clipboard API not supported".into()));
    }
    JsFuture::from(navigator.clipboard().write_text(text))
        .await
        .map(|_| ())
        .map_err(|e| ActionError::Clipboard(js_message(e)))
}

async fn copy_from(url: &str, timeout: Duration) -> Result<(), ActionError> {
    let response = get_with_timeout(url, timeout).await?;
    let text = response
        .text()
        .await
        .map_err(|e| ActionError::Network(e.to_string()))?;
    write_clipboard(&text).await
}

/// Saves `bytes` through a temporary anchor and returns the object URL. The
/// URL stays valid for `REVOKE_DELAY` so the browser can finish the save.
fn save_blob(bytes: &[u8], filename: &str) -> Result<String, ActionError> {
    let parts = js_sys::Array::of1(&js_sys::Uint8Array::from(bytes));
    let blob = web_sys::Blob::new_with_u8_array_sequence(&parts)
        .map_err(|e| ActionError::Download(js_message(e)))?;
    let object_url = web_sys::Url::create_object_url_with_blob(&blob)
        .map_err(|e| ActionError::Download(js_message(e)))?;

    let doc = document();
    let anchor = doc
        .create_element("a")
        .map_err(|e| ActionError::Download(js_message(e)))?
        .unchecked_into::<web_sys::HtmlAnchorElement>();
    anchor.set_href(&object_url);
    anchor.set_download(filename);
    anchor.set_target("_blank");
    anchor.set_rel("noopener noreferrer");
    if let Some(body) = doc.body() {
        let _ = body.append_child(&anchor);
        anchor.click();
        anchor.remove();
    }
    let revoked = object_url.clone();
    set_timeout(
        move || {
            let _ = web_sys::Url::revoke_object_url(&revoked);
        },
        REVOKE_DELAY,
    );
    Ok(object_url)
}

async fn download_from(url: &str, timeout: Duration) -> Result<(), ActionError> {
    let response = get_with_timeout(url, timeout).await?;
    let bytes = response
        .binary()
        .await
        .map_err(|e| ActionError::Network(e.to_string()))?;
    save_blob(&bytes, &guess_filename(url)).map(|_| ())
}

/// Runs the card action for `link`. Copy and download failures end in a
/// confirm prompt offering to open the link instead.
pub fn activate(link: String, kind: ActionKind, timeout: Duration) {
    let url = match resolve_url(&link) {
        Ok(url) => url,
        Err(e) => {
            leptos::logging::error!("[actions] {e}");
            open_in_new_tab(&link);
            return;
        }
    };

    match kind {
        ActionKind::Jump => open_in_new_tab(&url),
        ActionKind::Copy => spawn_local(async move {
            match copy_from(&url, timeout).await {
                Ok(()) => {
                    let _ = window().alert_with_message("内容已复制到剪贴板！");
                }
                Err(e) => {
                    leptos::logging::error!("[actions] copy failed: {e}");
                    offer_to_open("复制失败，是否在新标签页打开链接以查看？", &url, &e);
                }
            }
        }),
        ActionKind::Download => spawn_local(async move {
            if let Err(e) = download_from(&url, timeout).await {
                leptos::logging::error!("[actions] download failed: {e}");
                offer_to_open("直接下载失败，是否在新标签页打开链接以继续？", &url, &e);
            }
        }),
    }
}
