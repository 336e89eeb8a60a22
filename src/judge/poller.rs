//! Version-gated polling that keeps judging surfaces close to the server of record.
//!
//! A poller fetches the state endpoint on a fixed interval and calls its update
//! handler only when the published `meta.version` moves. Errors are logged and
//! the next cycle is scheduled as usual; there is no backoff.

use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::Value;
use tokio::{task::JoinHandle, time::sleep};
use tracing::{debug, warn};

use crate::judge::{error::PollError, page::JudgePageConfig, view::PageHost};

/// Interval used by live panels and overlays.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(5_000);
/// Interval used by the judge page itself.
pub const JUDGE_PAGE_INTERVAL: Duration = Duration::from_millis(4_000);
/// Floor applied to every configured interval.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1_000);

/// Read a version counter from JSON.
///
/// Accepts non-negative integers and numeric strings. Anything else, including
/// `0`, means "no version".
pub fn normalize_version(value: &Value) -> Option<u64> {
    let version = match value {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|v| v.is_finite() && *v >= 0.0 && v.fract() == 0.0)
                .map(|v| v as u64)
        }),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    (version != 0).then_some(version)
}

/// Version published under `meta.version`, if any.
pub fn extract_version(data: &Value) -> Option<u64> {
    data.get("meta")
        .and_then(|meta| meta.get("version"))
        .and_then(normalize_version)
}

/// One polling target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    pub state_url: String,
    /// Version the surface was rendered from.
    pub version: u64,
    pub interval: Duration,
    /// Skip fetching while the page is in a background tab.
    pub skip_when_hidden: bool,
    /// Reload the page on change when no custom handler is installed.
    pub reload: bool,
}

impl PollerConfig {
    pub fn new(state_url: impl Into<String>) -> Self {
        Self {
            state_url: state_url.into(),
            version: 0,
            interval: DEFAULT_INTERVAL,
            skip_when_hidden: true,
            reload: true,
        }
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Zero selects the default interval; anything else is floored at [`MIN_INTERVAL`].
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = if interval.is_zero() {
            DEFAULT_INTERVAL
        } else {
            interval.max(MIN_INTERVAL)
        };
        self
    }

    pub fn skip_when_hidden(mut self, skip: bool) -> Self {
        self.skip_when_hidden = skip;
        self
    }

    pub fn reload(mut self, reload: bool) -> Self {
        self.reload = reload;
        self
    }

    /// Poller for the judge page's own state endpoint, when it advertises one.
    pub fn for_judge_page(page: &JudgePageConfig) -> Option<Self> {
        let url = page.api.state.as_deref()?.trim();
        if url.is_empty() {
            return None;
        }
        Some(
            Self::new(url)
                .with_version(page.meta.version())
                .with_interval(JUDGE_PAGE_INTERVAL)
                .skip_when_hidden(false)
                .reload(true),
        )
    }
}

/// Entry of the host's list of live surfaces to keep fresh.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveConfig {
    #[serde(default)]
    pub state_url: Option<String>,
    #[serde(default)]
    pub version: Value,
    /// Milliseconds.
    #[serde(default)]
    pub interval: Value,
    #[serde(default)]
    pub reload: Option<bool>,
    #[serde(default)]
    pub skip_when_hidden: Option<bool>,
}

impl TryFrom<LiveConfig> for PollerConfig {
    type Error = LiveConfig;

    /// Entries without a state URL are handed back untouched.
    fn try_from(live: LiveConfig) -> Result<Self, Self::Error> {
        let Some(url) = live
            .state_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
        else {
            return Err(live);
        };

        let interval = normalize_version(&live.interval)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_INTERVAL);
        Ok(Self::new(url)
            .with_version(normalize_version(&live.version).unwrap_or(0))
            .with_interval(interval)
            .reload(live.reload != Some(false))
            .skip_when_hidden(live.skip_when_hidden != Some(false)))
    }
}

/// Fetches the state snapshot behind a URL.
pub trait StateSource: Send + Sync {
    /// GET `url` without caching and decode it as JSON.
    fn fetch_state(&self, url: String) -> BoxFuture<'static, Result<Value, PollError>>;
}

/// Payload handed to an update handler.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncUpdate {
    pub data: Value,
    pub version: u64,
    pub previous_version: u64,
}

/// Reaction to a version change.
pub type UpdateHandler = Box<dyn FnMut(SyncUpdate) + Send>;

/// Result of one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollCycle {
    /// Page hidden; nothing fetched.
    Skipped,
    /// Snapshot fetched but its version did not move (or was missing).
    Unchanged,
    /// Handler fired.
    Updated { version: u64, previous_version: u64 },
    /// Transient failure, already logged.
    Failed,
}

/// Polls one target and notifies on version changes.
pub struct LiveSyncPoller<S> {
    config: PollerConfig,
    source: S,
    host: Arc<dyn PageHost>,
    handler: Option<UpdateHandler>,
    current_version: u64,
}

impl<S: StateSource + 'static> LiveSyncPoller<S> {
    /// Poller using the default handler: reload when `config.reload` is set.
    pub fn new(config: PollerConfig, source: S, host: Arc<dyn PageHost>) -> Self {
        let current_version = config.version;
        Self {
            config,
            source,
            host,
            handler: None,
            current_version,
        }
    }

    /// Replace the default reload with a custom handler.
    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: FnMut(SyncUpdate) + Send + 'static,
    {
        self.handler = Some(Box::new(handler));
        self
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Last version seen (or rendered).
    pub fn current_version(&self) -> u64 {
        self.current_version
    }

    /// Run a single cycle now.
    pub async fn poll_once(&mut self) -> PollCycle {
        if self.config.skip_when_hidden && self.host.is_hidden() {
            debug!(url = %self.config.state_url, "page hidden; skipping poll");
            return PollCycle::Skipped;
        }

        let data = match self
            .source
            .fetch_state(self.config.state_url.clone())
            .await
        {
            Ok(data) => data,
            Err(err) => {
                warn!(url = %self.config.state_url, error = %err, "live poll error");
                return PollCycle::Failed;
            }
        };

        let Some(version) = extract_version(&data) else {
            return PollCycle::Unchanged;
        };
        if version == self.current_version {
            return PollCycle::Unchanged;
        }

        let previous_version = self.current_version;
        self.current_version = version;
        debug!(
            url = %self.config.state_url,
            version,
            previous_version,
            "state version advanced"
        );
        self.dispatch(SyncUpdate {
            data,
            version,
            previous_version,
        });
        PollCycle::Updated {
            version,
            previous_version,
        }
    }

    fn dispatch(&mut self, update: SyncUpdate) {
        match self.handler.as_mut() {
            Some(handler) => handler(update),
            None if self.config.reload => self.host.reload(),
            None => {}
        }
    }

    /// Poll forever on a background task, first cycle one interval from now.
    pub fn spawn(mut self) -> PollerHandle {
        let interval = self.config.interval;
        let task = tokio::spawn(async move {
            loop {
                sleep(interval).await;
                self.poll_once().await;
            }
        });
        PollerHandle { task }
    }
}

/// Handle to a spawned poller. Dropping it leaves the poller running.
#[derive(Debug)]
pub struct PollerHandle {
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Stop polling: the pending timer is cleared and any in-flight fetch abandoned.
    pub fn stop(self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Build pollers for every surface the host page asks to keep fresh.
pub fn pollers_for_page(
    page: Option<&JudgePageConfig>,
    live: impl IntoIterator<Item = LiveConfig>,
) -> Vec<PollerConfig> {
    page.and_then(PollerConfig::for_judge_page)
        .into_iter()
        .chain(
            live.into_iter()
                .filter_map(|entry| PollerConfig::try_from(entry).ok()),
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{
            Mutex,
            atomic::{AtomicBool, AtomicUsize, Ordering},
        },
    };

    use futures::FutureExt;
    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct FakeHost {
        hidden: AtomicBool,
        reloads: AtomicUsize,
    }

    impl PageHost for FakeHost {
        fn is_hidden(&self) -> bool {
            self.hidden.load(Ordering::SeqCst)
        }

        fn reload(&self) {
            self.reloads.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Clone, Default)]
    struct ScriptedSource {
        replies: Arc<Mutex<VecDeque<Result<Value, u16>>>>,
        fetches: Arc<AtomicUsize>,
    }

    impl ScriptedSource {
        fn with(replies: Vec<Result<Value, u16>>) -> Self {
            Self {
                replies: Arc::new(Mutex::new(replies.into())),
                fetches: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl StateSource for ScriptedSource {
        fn fetch_state(&self, url: String) -> BoxFuture<'static, Result<Value, PollError>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(json!({})));
            futures::future::ready(reply.map_err(|status| PollError::Status { url, status }))
                .boxed()
        }
    }

    fn versioned(version: Value) -> Value {
        json!({"current": null, "meta": {"version": version}})
    }

    #[test]
    fn version_normalization() {
        assert_eq!(normalize_version(&json!(8)), Some(8));
        assert_eq!(normalize_version(&json!("8")), Some(8));
        assert_eq!(normalize_version(&json!(8.0)), Some(8));
        assert_eq!(normalize_version(&json!(0)), None);
        assert_eq!(normalize_version(&json!(-2)), None);
        assert_eq!(normalize_version(&json!("soon")), None);
        assert_eq!(normalize_version(&Value::Null), None);
        assert_eq!(extract_version(&json!({"status": "empty"})), None);
    }

    #[test]
    fn interval_floor_and_default() {
        let config = PollerConfig::new("/s").with_interval(Duration::from_millis(200));
        assert_eq!(config.interval, MIN_INTERVAL);
        let config = PollerConfig::new("/s").with_interval(Duration::ZERO);
        assert_eq!(config.interval, DEFAULT_INTERVAL);
    }

    #[test]
    fn host_configs_are_collected() {
        let page = JudgePageConfig::from_json(
            r#"{"api": {"submit": "/s", "state": "/api/judge/state"}, "meta": {"version": 3}}"#,
        )
        .unwrap();
        let live: Vec<LiveConfig> = serde_json::from_value(json!([
            {"stateUrl": "/api/judge/state", "version": "5", "interval": 2500, "skipWhenHidden": false},
            {"version": 1},
            {"stateUrl": "/overlay", "reload": false}
        ]))
        .unwrap();

        let configs = pollers_for_page(Some(&page), live);
        assert_eq!(configs.len(), 3);
        assert_eq!(configs[0].interval, JUDGE_PAGE_INTERVAL);
        assert_eq!(configs[0].version, 3);
        assert!(!configs[0].skip_when_hidden);
        assert_eq!(configs[1].version, 5);
        assert_eq!(configs[1].interval, Duration::from_millis(2500));
        assert!(configs[1].reload);
        assert!(!configs[1].skip_when_hidden);
        assert_eq!(configs[2].state_url, "/overlay");
        assert!(!configs[2].reload);
        assert!(configs[2].skip_when_hidden);
        assert_eq!(configs[2].interval, DEFAULT_INTERVAL);
    }

    #[tokio::test]
    async fn same_version_is_silent_and_new_version_fires_once() {
        let source = ScriptedSource::with(vec![
            Ok(versioned(json!(7))),
            Ok(versioned(json!(8))),
            Ok(versioned(json!(8))),
        ]);
        let host = Arc::new(FakeHost::default());
        let fired = Arc::new(Mutex::new(Vec::new()));
        let sink = fired.clone();

        let mut poller = LiveSyncPoller::new(
            PollerConfig::new("/api/judge/state").with_version(7),
            source,
            host.clone(),
        )
        .with_handler(move |update| sink.lock().unwrap().push(update));

        assert_eq!(poller.poll_once().await, PollCycle::Unchanged);
        assert!(fired.lock().unwrap().is_empty());

        assert_eq!(
            poller.poll_once().await,
            PollCycle::Updated {
                version: 8,
                previous_version: 7
            }
        );
        assert_eq!(poller.poll_once().await, PollCycle::Unchanged);

        let fired = fired.lock().unwrap();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].version, 8);
        assert_eq!(fired[0].previous_version, 7);
        assert_eq!(host.reloads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_version_never_refreshes() {
        let source = ScriptedSource::with(vec![
            Ok(json!({"status": "empty"})),
            Ok(json!({"meta": {}})),
            Ok(json!({"meta": {"version": null}})),
        ]);
        let host = Arc::new(FakeHost::default());
        let mut poller =
            LiveSyncPoller::new(PollerConfig::new("/overlay").with_version(3), source, host.clone());

        for _ in 0..3 {
            assert_eq!(poller.poll_once().await, PollCycle::Unchanged);
        }
        assert_eq!(poller.current_version(), 3);
        assert_eq!(host.reloads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn default_handler_reloads_unless_disabled() {
        let host = Arc::new(FakeHost::default());
        let mut reloading = LiveSyncPoller::new(
            PollerConfig::new("/s"),
            ScriptedSource::with(vec![Ok(versioned(json!(2)))]),
            host.clone(),
        );
        reloading.poll_once().await;
        assert_eq!(host.reloads.load(Ordering::SeqCst), 1);

        let mut quiet = LiveSyncPoller::new(
            PollerConfig::new("/s").reload(false),
            ScriptedSource::with(vec![Ok(versioned(json!(2)))]),
            host.clone(),
        );
        assert!(matches!(quiet.poll_once().await, PollCycle::Updated { .. }));
        assert_eq!(host.reloads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn hidden_page_skips_fetch_only_when_configured() {
        let host = Arc::new(FakeHost::default());
        host.hidden.store(true, Ordering::SeqCst);
        let source = ScriptedSource::with(vec![Ok(versioned(json!(4)))]);

        let mut skipping = LiveSyncPoller::new(PollerConfig::new("/s"), source.clone(), host.clone());
        assert_eq!(skipping.poll_once().await, PollCycle::Skipped);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);

        let mut eager = LiveSyncPoller::new(
            PollerConfig::new("/s").skip_when_hidden(false),
            source.clone(),
            host.clone(),
        );
        assert!(matches!(eager.poll_once().await, PollCycle::Updated { .. }));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn errors_do_not_advance_the_version() {
        let source = ScriptedSource::with(vec![Err(503), Ok(versioned(json!(9)))]);
        let host = Arc::new(FakeHost::default());
        let mut poller = LiveSyncPoller::new(PollerConfig::new("/s").with_version(1), source, host);

        assert_eq!(poller.poll_once().await, PollCycle::Failed);
        assert_eq!(poller.current_version(), 1);
        assert_eq!(
            poller.poll_once().await,
            PollCycle::Updated {
                version: 9,
                previous_version: 1
            }
        );
    }
}
