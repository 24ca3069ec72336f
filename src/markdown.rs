use leptos::prelude::*;
use leptos::task::spawn_local;
use pulldown_cmark::{html, Options, Parser};
use std::time::Duration;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

const COPY_LABEL: &str = r#"<i class="far fa-copy"></i> 复制代码"#;
const COPIED_LABEL: &str = r#"<i class="fas fa-check"></i> 已复制!"#;
const COPIED_FOR: Duration = Duration::from_secs(2);

pub const INTRO_MARKDOWN: &str = r#"
# This is Argon Function Station V2.

持续收录更多函数中...

链接：

[<i class="fa-brands fa-github"></i>AFS的Github仓库 <i class="fas fa-star"></i>点个Star吧](https://github.com/mifongjvav/AFS/)

[<i class="fas fa-code-branch"></i>Fork AFS的Github仓库以准备提交拉取请求](https://github.com/mifongjvav/AFS/fork)

## 想要提交自己的函数？拉取请求？滚蛋！QQ？屎！

[<i class="fa-brands fa-github"></i>AFS的Github Issues页面](https://github.com/mifongjvav/AFS/issues)

想要参与网站开发？[<i class="fa-brands fa-github"></i>AFS-Web的Github仓库](https://github.com/mifongjvav/AFS-Web/)

> **提示**：切换主题请将鼠标放在 **<i class="fas fa-brush"></i>** 按钮上
"#;

pub fn markdown_to_html(raw: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(raw, options);

    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

fn copy_code(pre: web_sys::Element, button: web_sys::Element) {
    let code = pre
        .query_selector("code")
        .ok()
        .flatten()
        .and_then(|code| code.dyn_into::<web_sys::HtmlElement>().ok())
        .map(|code| code.inner_text())
        .unwrap_or_default();
    if code.is_empty() {
        return;
    }
    spawn_local(async move {
        let promise = window().navigator().clipboard().write_text(&code);
        if let Err(e) = JsFuture::from(promise).await {
            leptos::logging::warn!("[markdown] copy failed: {e:?}");
            return;
        }
        button.set_inner_html(COPIED_LABEL);
        set_timeout(move || button.set_inner_html(COPY_LABEL), COPIED_FOR);
    });
}

/// Gives every `<pre>` under `root` a copy button, once.
pub fn attach_copy_buttons(root: &web_sys::Element) {
    let Ok(blocks) = root.query_selector_all("pre") else {
        return;
    };
    let doc = document();
    for pre in (0..blocks.length()).filter_map(|i| blocks.item(i)) {
        let Ok(pre) = pre.dyn_into::<web_sys::Element>() else {
            continue;
        };
        if pre.query_selector(".copy-btn").ok().flatten().is_some() {
            continue;
        }
        let Ok(button) = doc.create_element("button") else {
            continue;
        };
        button.set_class_name("copy-btn");
        button.set_inner_html(COPY_LABEL);

        let (target, label) = (pre.clone(), button.clone());
        let closure = Closure::<dyn FnMut()>::new(move || copy_code(target.clone(), label.clone()));
        let _ = button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
        let _ = pre.append_child(&button);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intro_keeps_inline_icons() {
        let html = markdown_to_html(INTRO_MARKDOWN);
        assert!(html.contains("<h1>This is Argon Function Station V2.</h1>"));
        assert!(html.contains(r#"<i class="fa-brands fa-github"></i>"#));
        assert!(html.contains(r#"href="https://github.com/mifongjvav/AFS/fork""#));
        assert!(html.contains("<blockquote>"));
    }

    #[test]
    fn fenced_code_becomes_pre() {
        let html = markdown_to_html("```\nlet x = 1;\n```\n");
        assert!(html.starts_with("<pre><code>"));
    }
}
