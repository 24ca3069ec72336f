use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::config::SiteConfig;
use crate::error::FetchError;
use crate::fetch::fetch_resources;
use crate::resource::{bundled_resources, RawResource, Resource};
use crate::state::AppState;
use crate::tags::{classify_all, TagRegistry};

/// Reduced projection used for change detection between polls. Tags, icons
/// and action types are deliberately left out, so metadata-only edits do not
/// trigger a re-render or a notice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fingerprint(Vec<(String, String, String)>);

impl Fingerprint {
    pub fn of(resources: &[Resource]) -> Self {
        Self(
            resources
                .iter()
                .map(|r| (r.title.clone(), r.link.clone(), r.description.clone()))
                .collect(),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reconciliation {
    Changed,
    Unchanged,
}

pub fn reconcile(current: Option<&[Resource]>, incoming: &[Resource]) -> Reconciliation {
    match current {
        Some(current) if Fingerprint::of(current) == Fingerprint::of(incoming) => {
            Reconciliation::Unchanged
        }
        _ => Reconciliation::Changed,
    }
}

/// The first snapshot shown: the fetched list, or the bundled one when every
/// endpoint failed. Either way it goes through the classifier.
pub fn initial_snapshot(
    result: Result<Vec<RawResource>, FetchError>,
    registry: &TagRegistry,
) -> Vec<Resource> {
    match result {
        Ok(raw) => classify_all(&raw, registry),
        Err(e) => {
            leptos::logging::error!("[reconcile] falling back to bundled resources: {e}");
            classify_all(&bundled_resources(), registry)
        }
    }
}

/// Polling only runs on a visible page with somewhere to poll.
pub fn polling_allowed(hidden: bool, has_endpoints: bool) -> bool {
    !hidden && has_endpoints
}

/// Keeps two reconciliation ticks from overlapping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickGate {
    in_flight: bool,
}

impl TickGate {
    pub fn try_begin(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        true
    }

    pub fn end(&mut self) {
        self.in_flight = false;
    }
}

/// Owns the polling interval and the fetch → classify → compare cycle.
#[derive(Clone, Copy)]
pub struct ResourceFeed {
    state: AppState,
    config: StoredValue<SiteConfig>,
    gate: StoredValue<TickGate>,
    interval: StoredValue<Option<IntervalHandle>>,
    resume_timer: StoredValue<Option<TimeoutHandle>>,
    notice: RwSignal<bool>,
    notice_timer: StoredValue<Option<TimeoutHandle>>,
}

impl ResourceFeed {
    pub fn new(state: AppState, config: StoredValue<SiteConfig>, notice: RwSignal<bool>) -> Self {
        Self {
            state,
            config,
            gate: StoredValue::new(TickGate::default()),
            interval: StoredValue::new(None),
            resume_timer: StoredValue::new(None),
            notice,
            notice_timer: StoredValue::new(None),
        }
    }

    fn has_endpoints(&self) -> bool {
        self.config.with_value(|c| !c.endpoints.is_empty())
    }

    fn classify(&self, raw: &[RawResource]) -> Vec<Resource> {
        self.state
            .registry
            .with_untracked(|registry| classify_all(raw, registry))
    }

    fn may_poll(&self) -> bool {
        polling_allowed(document().hidden(), self.has_endpoints())
    }

    /// First load: remote feed, or the bundled snapshot when that fails.
    /// Polling starts afterwards whenever endpoints are configured and the
    /// page is visible; otherwise the next `resume` starts it.
    pub fn load_initial(self) {
        spawn_local(async move {
            let (endpoints, timeout) = self
                .config
                .with_value(|c| (c.endpoints.clone(), c.fetch_timeout()));
            let result = fetch_resources(&endpoints, timeout).await;
            let resources = self
                .state
                .registry
                .with_untracked(|registry| initial_snapshot(result, registry));
            self.state.replace_resources(resources);
            if self.may_poll() {
                self.start();
            }
        });
    }

    pub fn start(self) {
        self.clear_interval();
        if !self.may_poll() {
            return;
        }
        let period = self.config.with_value(SiteConfig::poll_interval);
        match set_interval_with_handle(move || self.tick(), period) {
            Ok(handle) => self.interval.set_value(Some(handle)),
            Err(e) => leptos::logging::error!("[reconcile] cannot start polling: {e:?}"),
        }
    }

    fn clear_interval(self) {
        if let Some(handle) = self.interval.try_update_value(Option::take).flatten() {
            handle.clear();
        }
    }

    fn clear_resume(self) {
        if let Some(handle) = self.resume_timer.try_update_value(Option::take).flatten() {
            handle.clear();
        }
    }

    /// Stops polling, including a resume that has not fired yet.
    pub fn stop(self) {
        self.clear_resume();
        self.clear_interval();
    }

    /// Page became visible again: one tick after a short delay, then the
    /// interval. Nothing happens if the page was hidden again meanwhile.
    pub fn resume(self) {
        self.clear_resume();
        let delay = self.config.with_value(SiteConfig::resume_delay);
        let armed = set_timeout_with_handle(
            move || {
                self.resume_timer.set_value(None);
                if !self.may_poll() {
                    return;
                }
                self.tick();
                self.start();
            },
            delay,
        );
        match armed {
            Ok(handle) => self.resume_timer.set_value(Some(handle)),
            Err(e) => leptos::logging::error!("[reconcile] cannot schedule resume: {e:?}"),
        }
    }

    /// One silent refresh. Failures are logged and leave the snapshot alone.
    pub fn tick(self) {
        if !self.has_endpoints() {
            return;
        }
        if !self.gate.try_update_value(TickGate::try_begin).unwrap_or(false) {
            leptos::logging::log!("[reconcile] previous refresh still running, skipping");
            return;
        }
        spawn_local(async move {
            let (endpoints, timeout) = self
                .config
                .with_value(|c| (c.endpoints.clone(), c.fetch_timeout()));
            let result = fetch_resources(&endpoints, timeout).await;
            self.gate.update_value(TickGate::end);

            match result {
                Ok(raw) => {
                    let incoming = self.classify(&raw);
                    let current = self.state.snapshot();
                    if reconcile(current.as_deref(), &incoming) == Reconciliation::Changed {
                        self.state.replace_resources(incoming);
                        self.flash_notice();
                    }
                }
                Err(e) => leptos::logging::log!("[reconcile] silent update failed: {e}"),
            }
        });
    }

    fn flash_notice(self) {
        if self.notice.get_untracked() {
            return;
        }
        self.notice.set(true);
        let duration = self.config.with_value(SiteConfig::notice_duration);
        let notice = self.notice;
        if let Ok(handle) = set_timeout_with_handle(move || notice.set(false), duration) {
            self.notice_timer.set_value(Some(handle));
        }
    }

    pub fn dismiss_notice(self) {
        if let Some(handle) = self.notice_timer.try_update_value(Option::take).flatten() {
            handle.clear();
        }
        self.notice.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::fetch_first;
    use crate::resource::ActionKind;
    use crate::tags::DEFAULT_SPECIAL_TAG;
    use futures::executor::block_on;
    use futures::future::ready;

    fn resource(title: &str, tags: &[&str]) -> Resource {
        Resource {
            title: title.into(),
            icon: None,
            icon_style: None,
            description: "<p>d</p>".into(),
            link: format!("https://x/{title}"),
            link_text: None,
            action: ActionKind::Jump,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn tag_only_changes_are_unchanged() {
        let current = vec![resource("a", &["x", "坟场"])];
        let mut incoming = vec![resource("a", &["y", "上架"])];
        incoming[0].icon = Some("fas fa-cube".into());
        incoming[0].action = ActionKind::Download;
        assert_eq!(
            reconcile(Some(&current), &incoming),
            Reconciliation::Unchanged
        );
    }

    #[test]
    fn content_changes_are_detected() {
        let current = vec![resource("a", &["x"])];
        let mut retitled = current.clone();
        retitled[0].title = "b".into();
        assert_eq!(reconcile(Some(&current), &retitled), Reconciliation::Changed);

        let mut longer = current.clone();
        longer.push(resource("c", &[]));
        assert_eq!(reconcile(Some(&current), &longer), Reconciliation::Changed);
    }

    #[test]
    fn reordering_counts_as_change() {
        let current = vec![resource("a", &[]), resource("b", &[])];
        let swapped = vec![resource("b", &[]), resource("a", &[])];
        assert_eq!(reconcile(Some(&current), &swapped), Reconciliation::Changed);
    }

    #[test]
    fn no_snapshot_is_always_a_change() {
        assert_eq!(reconcile(None, &[]), Reconciliation::Changed);
    }

    #[test]
    fn gate_blocks_overlapping_ticks() {
        let mut gate = TickGate::default();
        assert!(gate.try_begin());
        assert!(!gate.try_begin());
        gate.end();
        assert!(gate.try_begin());
    }

    #[test]
    fn every_endpoint_failing_yields_bundled_snapshot() {
        let registry = TagRegistry::default();
        let endpoints = vec!["https://primary/a.json".to_string(), "https://mirror/a.json".to_string()];
        let result = block_on(fetch_first(&endpoints, |url| {
            ready(Err::<Vec<RawResource>, _>(FetchError::Timeout { url }))
        }));
        assert!(result.is_err());

        let snapshot = initial_snapshot(result, &registry);
        assert_eq!(snapshot, classify_all(&bundled_resources(), &registry));
        assert!(!snapshot.is_empty());
        assert!(snapshot
            .iter()
            .filter(|r| !r.tags.is_empty())
            .all(|r| r.tags.iter().any(|t| registry.get(t).is_some())));
    }

    #[test]
    fn bundled_fallback_gets_default_tag() {
        let registry = TagRegistry::default();
        let snapshot = initial_snapshot(Err(FetchError::NoEndpoints), &registry);
        let tools_only = snapshot
            .iter()
            .find(|r| r.tags.first().map(String::as_str) == Some("工具"))
            .map(|r| r.tags.clone());
        assert_eq!(tools_only, Some(vec!["工具".to_string(), DEFAULT_SPECIAL_TAG.to_string()]));
    }

    #[test]
    fn fetched_list_is_classified_not_replaced() {
        let registry = TagRegistry::default();
        let raw: Vec<RawResource> =
            serde_json::from_str(r#"[{"title":"A","link":"https://x/a","class":"Tools"}]"#).unwrap();
        let snapshot = initial_snapshot(Ok(raw), &registry);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].tags, vec!["Tools", DEFAULT_SPECIAL_TAG]);
    }

    #[test]
    fn hidden_page_never_polls() {
        assert!(polling_allowed(false, true));
        assert!(!polling_allowed(true, true));
        assert!(!polling_allowed(false, false));
        assert!(!polling_allowed(true, false));
    }
}
