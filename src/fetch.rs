use futures::future::{self, Either};
use futures::pin_mut;
use gloo_net::http::{Request, Response};
use std::future::Future;
use std::time::Duration;

use crate::error::FetchError;
use crate::resource::{decode_entries, RawResource};

/// Resolves after `duration` on the browser timer queue.
pub async fn sleep(duration: Duration) {
    let millis = i32::try_from(duration.as_millis()).unwrap_or(i32::MAX);
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        if let Some(window) = web_sys::window() {
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis);
        }
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}

/// Races `work` against `deadline`; `None` means the deadline won.
pub async fn with_timeout<W, D>(work: W, deadline: D) -> Option<W::Output>
where
    W: Future,
    D: Future<Output = ()>,
{
    pin_mut!(work);
    pin_mut!(deadline);
    match future::select(work, deadline).await {
        Either::Left((output, _)) => Some(output),
        Either::Right(_) => None,
    }
}

/// GET `url`, giving up after `timeout`. A timed-out request is aborted.
pub async fn get_with_timeout(url: &str, timeout: Duration) -> Result<Response, FetchError> {
    let controller = web_sys::AbortController::new().ok();
    let signal = controller.as_ref().map(|c| c.signal());
    let request = Request::get(url).abort_signal(signal.as_ref()).send();

    let Some(sent) = with_timeout(request, sleep(timeout)).await else {
        if let Some(controller) = controller {
            controller.abort();
        }
        return Err(FetchError::Timeout {
            url: url.to_string(),
        });
    };
    let response = sent.map_err(|e| FetchError::Network {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    if !response.ok() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: response.status(),
        });
    }
    Ok(response)
}

async fn fetch_endpoint(url: String, timeout: Duration) -> Result<Vec<RawResource>, FetchError> {
    let response = get_with_timeout(&url, timeout).await?;
    let entries = response
        .json::<Vec<serde_json::Value>>()
        .await
        .map_err(|e| FetchError::Decode {
            url,
            message: e.to_string(),
        })?;
    Ok(decode_entries(entries))
}

/// Tries each endpoint in order and returns the first list that arrives.
/// Fails with the last error seen once every endpoint is exhausted.
pub async fn fetch_first<F, Fut>(
    endpoints: &[String],
    mut attempt: F,
) -> Result<Vec<RawResource>, FetchError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Vec<RawResource>, FetchError>>,
{
    if endpoints.is_empty() {
        leptos::logging::warn!("[fetch] endpoint list is empty, skipping network");
        return Err(FetchError::NoEndpoints);
    }

    let mut last_error = None;
    for url in endpoints {
        leptos::logging::log!("[fetch] trying {url}");
        match attempt(url.clone()).await {
            Ok(resources) => {
                leptos::logging::log!("[fetch] got {} resources from {url}", resources.len());
                return Ok(resources);
            }
            Err(e) => {
                leptos::logging::warn!("[fetch] {e}");
                last_error = Some(e);
            }
        }
    }
    Err(last_error.unwrap_or(FetchError::AllEndpointsFailed))
}

pub async fn fetch_resources(
    endpoints: &[String],
    timeout: Duration,
) -> Result<Vec<RawResource>, FetchError> {
    fetch_first(endpoints, |url| fetch_endpoint(url, timeout)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::{classify_all, TagRegistry, DEFAULT_SPECIAL_TAG};
    use futures::executor::block_on;
    use futures::future::{pending, ready};
    use std::cell::RefCell;

    fn endpoints() -> Vec<String> {
        vec!["https://primary/a.json".into(), "https://mirror/a.json".into()]
    }

    fn parse(json: &str) -> Vec<RawResource> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn deadline_wins_over_slow_work() {
        let out = block_on(with_timeout(pending::<u8>(), ready(())));
        assert_eq!(out, None);
        let out = block_on(with_timeout(ready(7u8), pending::<()>()));
        assert_eq!(out, Some(7));
    }

    #[test]
    fn timed_out_primary_falls_through_to_mirror() {
        let result = block_on(fetch_first(&endpoints(), |url| async move {
            if url.contains("primary") {
                match with_timeout(pending::<Vec<RawResource>>(), ready(())).await {
                    Some(list) => Ok(list),
                    None => Err(FetchError::Timeout { url }),
                }
            } else {
                Ok(parse(
                    r#"[{"title":"A","link":"https://x/a","type":"jump","class":"Tools"}]"#,
                ))
            }
        }))
        .unwrap();

        let resources = classify_all(&result, &TagRegistry::default());
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].tags, vec!["Tools", DEFAULT_SPECIAL_TAG]);
    }

    #[test]
    fn reports_last_error_when_all_fail() {
        let result = block_on(fetch_first(&endpoints(), |url| async move {
            Err::<Vec<RawResource>, _>(FetchError::Status { url, status: 503 })
        }));
        assert_eq!(
            result,
            Err(FetchError::Status {
                url: "https://mirror/a.json".into(),
                status: 503
            })
        );
    }

    #[test]
    fn empty_endpoint_list_short_circuits() {
        let calls = RefCell::new(0);
        let result = block_on(fetch_first(&[], |_url| {
            *calls.borrow_mut() += 1;
            ready(Ok(Vec::new()))
        }));
        assert_eq!(result, Err(FetchError::NoEndpoints));
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn stops_at_first_success() {
        let calls = RefCell::new(Vec::new());
        let result = block_on(fetch_first(&endpoints(), |url| {
            calls.borrow_mut().push(url);
            ready(Ok(Vec::new()))
        }));
        assert!(result.is_ok());
        assert_eq!(calls.borrow().len(), 1);
    }
}
