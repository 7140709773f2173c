//! Shared test utilities: URL-keyed HTTP mock, manual clock, client builders

#![allow(dead_code)]

use kimaaka::config::{Config, Environment};
use kimaaka::core::failover::{
    FailoverContext, FailoverSelector, HealthProbe, HealthProbeOptions, OperationRunner,
    ServerRegistry,
};
use kimaaka::core::network::{ClockTrait, HttpClientTrait, HttpRequest, HttpResponse, LocalStore};
use kimaaka::core::KimaakaClient;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub const A: &str = "http://a.test";
pub const B: &str = "http://b.test";
pub const C: &str = "http://c.test";

pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

pub fn health_url(base: &str) -> String {
    format!("{}/api/health", base)
}

pub fn key_url(base: &str) -> String {
    format!("{}/api/gemini-key", base)
}

pub fn stats_url(base: &str) -> String {
    format!("{}/api/admin/stats", base)
}

type Reply = Result<HttpResponse, String>;

/// HTTP mock keyed by full URL
///
/// Queued replies are consumed first; the standing reply (if any) answers
/// afterwards. Unmocked URLs fail like a refused connection. A hung URL
/// sleeps on the tokio clock before answering, so callers' own timeouts fire.
#[derive(Default)]
pub struct MockHttpClient {
    standing: Mutex<HashMap<String, Reply>>,
    queued: Mutex<HashMap<String, VecDeque<Reply>>>,
    hangs: Mutex<HashMap<String, Hang>>,
    requests: Mutex<Vec<HttpRequest>>,
}

#[derive(Clone, Copy)]
struct Hang {
    delay: Duration,
    /// `None` hangs on every call
    remaining: Option<usize>,
}

fn response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status_code: status,
        body: body.as_bytes().to_vec(),
        duration: Duration::from_millis(5),
        headers: HashMap::new(),
    }
}

impl MockHttpClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, url: &str, status: u16, body: &str) {
        self.standing
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(response(status, body)));
    }

    pub fn fail(&self, url: &str, error: &str) {
        self.standing
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(error.to_string()));
    }

    pub fn timeout(&self, url: &str) {
        self.fail(url, "Request timed out");
    }

    pub fn healthy(&self, base: &str) {
        self.respond(&health_url(base), 200, r#"{"status":"healthy"}"#);
    }

    pub fn queue(&self, url: &str, status: u16, body: &str) {
        self.queued
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(Ok(response(status, body)));
    }

    pub fn queue_failure(&self, url: &str, error: &str) {
        self.queued
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(Err(error.to_string()));
    }

    /// Delay every reply from `url` by `delay`
    pub fn hang(&self, url: &str, delay: Duration) {
        self.hangs.lock().unwrap().insert(
            url.to_string(),
            Hang {
                delay,
                remaining: None,
            },
        );
    }

    /// Delay only the next reply from `url`
    pub fn hang_once(&self, url: &str, delay: Duration) {
        self.hangs.lock().unwrap().insert(
            url.to_string(),
            Hang {
                delay,
                remaining: Some(1),
            },
        );
    }

    fn take_delay(&self, url: &str) -> Option<Duration> {
        let mut hangs = self.hangs.lock().unwrap();
        let hang = *hangs.get(url)?;
        match hang.remaining {
            None => {}
            Some(n) if n <= 1 => {
                hangs.remove(url);
            }
            Some(n) => {
                hangs.insert(
                    url.to_string(),
                    Hang {
                        remaining: Some(n - 1),
                        ..hang
                    },
                );
            }
        }
        Some(hang.delay)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls().iter().filter(|u| u.as_str() == url).count()
    }

    pub fn reset_calls(&self) {
        self.requests.lock().unwrap().clear();
    }
}

#[async_trait::async_trait]
impl HttpClientTrait for MockHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, String> {
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);

        if let Some(delay) = self.take_delay(&url) {
            tokio::time::sleep(delay).await;
        }

        if let Some(reply) = self
            .queued
            .lock()
            .unwrap()
            .get_mut(&url)
            .and_then(|q| q.pop_front())
        {
            return reply;
        }
        self.standing
            .lock()
            .unwrap()
            .get(&url)
            .cloned()
            .unwrap_or_else(|| Err("Connection refused".to_string()))
    }
}

/// Clock advanced by hand
pub struct MockClock {
    now: AtomicI64,
}

impl MockClock {
    pub fn new(start_ms: i64) -> Arc<Self> {
        Arc::new(Self {
            now: AtomicI64::new(start_ms),
        })
    }

    pub fn advance(&self, ms: i64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, ms: i64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl ClockTrait for MockClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Production-environment config over `urls` with no retry pause
pub fn test_config(urls: &[&str]) -> Config {
    let mut config = Config::default();
    config.environment = Environment::Production;
    config.production.urls = urls.iter().map(|u| u.to_string()).collect();
    config.failover.last_server_retry_delay_ms = 0;
    config.failover.fallback_health_path = None;
    config
}

pub struct Failover {
    pub context: Arc<FailoverContext>,
    pub selector: Arc<FailoverSelector>,
    pub runner: Arc<OperationRunner>,
    pub store: Arc<LocalStore>,
}

pub async fn build_failover(
    urls: &[&str],
    http: Arc<MockHttpClient>,
    clock: Arc<MockClock>,
    store: Arc<LocalStore>,
) -> Failover {
    let config = test_config(urls);
    let registry = ServerRegistry::from_config(&config).unwrap();
    let context = Arc::new(
        FailoverContext::new(registry, store.clone(), clock, config.failover.quarantine_reset_secs)
            .await,
    );
    let probe = Arc::new(HealthProbe::new(
        http,
        HealthProbeOptions {
            health_path: config.failover.health_path.clone(),
            fallback_path: None,
            require_healthy_status: false,
        },
    ));
    let selector = Arc::new(FailoverSelector::new(
        context.clone(),
        probe,
        config.timeouts.sticky_probe_ms,
        config.timeouts.scan_probe_ms,
    ));
    let runner = Arc::new(OperationRunner::new(selector.clone(), 0));
    Failover {
        context,
        selector,
        runner,
        store,
    }
}

pub async fn build_client(
    config: Config,
    http: Arc<MockHttpClient>,
    clock: Arc<MockClock>,
) -> (KimaakaClient, Arc<LocalStore>) {
    let store = Arc::new(LocalStore::in_memory());
    let client = KimaakaClient::with_dependencies(config, http, store.clone(), clock)
        .await
        .unwrap();
    (client, store)
}
