use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use async_trait::async_trait;
use firebase_bootstrap::bootstrap::{Bootstrap, BootstrapErrorCode, SignalState};
use firebase_bootstrap::config::{BootstrapConfig, FirebaseAppSettings, FirebaseOptions};
use firebase_bootstrap::logger::{LogLevel, Logger};
use firebase_bootstrap::platform::{
    internal_error, service_unavailable, BackendPlatform, MemoryAnalytics, MemoryApp, MemoryAuth,
    MemoryDatabase, MemoryPlatform, MemorySubscription, PlatformResult, ValueListener,
};
use futures::executor::block_on;
use futures::FutureExt;

type Records = Arc<Mutex<Vec<(LogLevel, String)>>>;

fn options(measurement_id: Option<&str>) -> FirebaseOptions {
    FirebaseOptions {
        api_key: Some("demo-api-key".into()),
        project_id: Some("lifecycle".into()),
        database_url: Some("http://127.0.0.1:9000/?ns=lifecycle".into()),
        measurement_id: measurement_id.map(str::to_string),
        ..Default::default()
    }
}

fn capturing_logger(name: &str) -> (Logger, Records) {
    let logger = Logger::new(name);
    logger.set_log_level(LogLevel::Debug);
    let records: Records = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&records);
    logger.set_user_log_handler(move |_, level, message| {
        sink.lock().unwrap().push((level, message.to_string()));
    });
    (logger, records)
}

fn build(
    platform: &MemoryPlatform,
    measurement_id: Option<&str>,
) -> (Bootstrap<MemoryPlatform>, Records) {
    let (logger, records) = capturing_logger("@firebase-bootstrap/lifecycle");
    let config = BootstrapConfig::new(options(measurement_id));
    let bootstrap = Bootstrap::new(platform.clone(), config).with_logger(logger);
    (bootstrap, records)
}

fn warnings(records: &Records) -> Vec<String> {
    records
        .lock()
        .unwrap()
        .iter()
        .filter(|(level, _)| *level == LogLevel::Warn)
        .map(|(_, message)| message.clone())
        .collect()
}

#[test]
fn sequential_initialize_creates_one_app() {
    let platform = MemoryPlatform::new();
    let (bootstrap, _) = build(&platform, None);

    assert_eq!(block_on(bootstrap.initialize()), Ok(()));
    assert_eq!(block_on(bootstrap.initialize()), Ok(()));

    assert_eq!(platform.apps_created(), 1);
    assert_eq!(platform.listener_count(), 1);
    assert_eq!(bootstrap.signal_state(), SignalState::Fulfilled);
}

#[tokio::test]
async fn concurrent_initialize_on_one_task_creates_one_app() {
    let platform = MemoryPlatform::new();
    let (bootstrap, _) = build(&platform, Some("G-CONCURRENT"));

    let (first, second, waiter) = futures::future::join3(
        bootstrap.initialize(),
        bootstrap.initialize(),
        bootstrap.wait_for_ready(),
    )
    .await;

    assert_eq!(first, Ok(()));
    assert_eq!(second, Ok(()));
    assert_eq!(waiter, Ok(()));
    assert_eq!(platform.apps_created(), 1);
    assert_eq!(platform.analytics_calls(), 2);
    assert_eq!(platform.listener_count(), 1);
}

/// Memory platform whose analytics support check never completes while `stalled` is set.
#[derive(Clone)]
struct StallingPlatform {
    inner: MemoryPlatform,
    stalled: Arc<AtomicBool>,
}

impl StallingPlatform {
    fn new(inner: MemoryPlatform) -> Self {
        Self {
            inner,
            stalled: Arc::new(AtomicBool::new(true)),
        }
    }

    fn release(&self) {
        self.stalled.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl BackendPlatform for StallingPlatform {
    type App = MemoryApp;
    type Auth = MemoryAuth;
    type Database = MemoryDatabase;
    type Analytics = MemoryAnalytics;
    type Subscription = MemorySubscription;

    fn existing_app(&self, name: &str) -> Option<MemoryApp> {
        self.inner.existing_app(name)
    }

    fn initialize_app(
        &self,
        options: &FirebaseOptions,
        settings: &FirebaseAppSettings,
    ) -> PlatformResult<MemoryApp> {
        self.inner.initialize_app(options, settings)
    }

    fn auth(&self, app: &MemoryApp) -> PlatformResult<MemoryAuth> {
        self.inner.auth(app)
    }

    fn database(&self, app: &MemoryApp) -> PlatformResult<MemoryDatabase> {
        self.inner.database(app)
    }

    async fn analytics_supported(&self) -> PlatformResult<bool> {
        if self.stalled.load(Ordering::SeqCst) {
            futures::future::pending::<()>().await;
        }
        self.inner.analytics_supported().await
    }

    async fn analytics(&self, app: &MemoryApp) -> PlatformResult<MemoryAnalytics> {
        self.inner.analytics(app).await
    }

    fn on_value(
        &self,
        database: &MemoryDatabase,
        path: &str,
        listener: ValueListener,
    ) -> PlatformResult<MemorySubscription> {
        self.inner.on_value(database, path, listener)
    }
}

#[test]
fn dropped_initialize_is_resumed_by_next_call() {
    let memory = MemoryPlatform::new();
    let platform = StallingPlatform::new(memory.clone());
    let config = BootstrapConfig::new(options(Some("G-STALLED")));
    let bootstrap = Bootstrap::new(platform.clone(), config)
        .with_logger(Logger::new("@firebase-bootstrap/stalled"));

    let mut first = Box::pin(bootstrap.initialize());
    assert!(first.as_mut().now_or_never().is_none());
    drop(first);

    assert_eq!(bootstrap.signal_state(), SignalState::Pending);
    assert!(bootstrap.context().is_some());
    assert!(!bootstrap.is_listening());

    platform.release();
    assert_eq!(block_on(bootstrap.initialize()), Ok(()));
    assert_eq!(block_on(bootstrap.wait_for_ready()), Ok(()));

    assert_eq!(bootstrap.signal_state(), SignalState::Fulfilled);
    assert_eq!(memory.apps_created(), 1);
    assert_eq!(memory.listener_count(), 1);
    assert!(bootstrap.analytics().is_some());
}

#[tokio::test]
async fn waiting_caller_takes_over_dropped_attempt() {
    let memory = MemoryPlatform::new();
    let platform = StallingPlatform::new(memory.clone());
    let config = BootstrapConfig::new(options(Some("G-TAKEOVER")));
    let bootstrap = Bootstrap::new(platform.clone(), config)
        .with_logger(Logger::new("@firebase-bootstrap/takeover"));

    let mut first = Box::pin(bootstrap.initialize());
    assert!(first.as_mut().now_or_never().is_none());
    let mut second = Box::pin(bootstrap.initialize());
    assert!(second.as_mut().now_or_never().is_none());

    platform.release();
    drop(first);

    assert_eq!(second.await, Ok(()));
    assert_eq!(memory.apps_created(), 1);
    assert_eq!(memory.listener_count(), 1);
}

#[test]
fn concurrent_initialize_across_threads_creates_one_app() {
    let platform = MemoryPlatform::new();
    let (bootstrap, _) = build(&platform, None);
    let bootstrap = Arc::new(bootstrap);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let bootstrap = Arc::clone(&bootstrap);
            thread::spawn(move || block_on(bootstrap.initialize()))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), Ok(()));
    }
    assert_eq!(platform.apps_created(), 1);
    assert_eq!(platform.listener_count(), 1);
}

#[test]
fn second_bootstrap_reuses_registered_app() {
    let platform = MemoryPlatform::new();
    let (first, _) = build(&platform, None);
    let (second, records) = build(&platform, None);

    block_on(first.initialize()).unwrap();
    block_on(second.initialize()).unwrap();

    assert_eq!(platform.apps_created(), 1);
    let (first_app, second_app) = (first.app().unwrap(), second.app().unwrap());
    assert!(first_app.ptr_eq(second_app));
    assert!(records
        .lock()
        .unwrap()
        .iter()
        .any(|(_, message)| message == "Reusing existing Firebase app"));
}

#[test]
fn app_creation_failure_rejects_signal() {
    let platform = MemoryPlatform::new();
    platform.fail_app_initialization(internal_error("registry unavailable"));
    let (bootstrap, records) = build(&platform, Some("G-FAIL"));

    let err = block_on(bootstrap.initialize()).unwrap_err();

    assert_eq!(err.code, BootstrapErrorCode::AppInit);
    assert_eq!(
        err.platform_error().map(|source| source.message()),
        Some("registry unavailable")
    );
    assert_eq!(bootstrap.signal_state(), SignalState::Rejected);
    assert!(!bootstrap.is_ready());
    assert!(!bootstrap.is_initialized());
    assert!(bootstrap.context().is_none());
    assert_eq!(platform.analytics_calls(), 0);
    assert_eq!(platform.listener_count(), 0);
    assert!(records
        .lock()
        .unwrap()
        .iter()
        .any(|(level, _)| *level == LogLevel::Error));
}

#[test]
fn failed_attempt_is_final() {
    let platform = MemoryPlatform::new();
    platform.fail_database(service_unavailable("database", "no url"));
    let (bootstrap, _) = build(&platform, None);

    let first = block_on(bootstrap.initialize()).unwrap_err();
    platform.clear_failures();
    let second = block_on(bootstrap.initialize()).unwrap_err();

    assert_eq!(first, second);
    assert_eq!(block_on(bootstrap.wait_for_ready()), Err(first));
    assert!(bootstrap.context().is_none());
}

#[test]
fn auth_failure_is_fatal() {
    let platform = MemoryPlatform::new();
    platform.fail_auth(service_unavailable("auth", "component missing"));
    let (bootstrap, _) = build(&platform, None);

    let err = block_on(bootstrap.initialize()).unwrap_err();
    assert_eq!(err.code_str(), "bootstrap/app-init");
}

#[test]
fn unsupported_analytics_is_skipped() {
    let platform = MemoryPlatform::new();
    platform.set_analytics_supported(false);
    let (bootstrap, records) = build(&platform, Some("G-UNSUPPORTED"));

    assert_eq!(block_on(bootstrap.initialize()), Ok(()));

    assert!(bootstrap.analytics().is_none());
    assert_eq!(platform.analytics_calls(), 1);
    assert!(warnings(&records).is_empty());
}

#[test]
fn missing_measurement_id_skips_every_analytics_call() {
    let platform = MemoryPlatform::new();
    let (bootstrap, _) = build(&platform, None);

    assert_eq!(block_on(bootstrap.initialize()), Ok(()));

    assert!(bootstrap.analytics().is_none());
    assert_eq!(platform.analytics_calls(), 0);
}

#[test]
fn analytics_failure_is_logged_and_isolated() {
    let platform = MemoryPlatform::new();
    platform.fail_analytics(internal_error("gtag script blocked"));
    let (bootstrap, records) = build(&platform, Some("G-BLOCKED"));

    assert_eq!(block_on(bootstrap.initialize()), Ok(()));

    assert!(bootstrap.analytics().is_none());
    assert!(bootstrap.database().is_some());
    let warnings = warnings(&records);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("bootstrap/analytics-init"));
}

#[test]
fn analytics_support_check_failure_is_isolated() {
    let platform = MemoryPlatform::new();
    platform.fail_analytics_support_check(internal_error("indexedDB unavailable"));
    let (bootstrap, records) = build(&platform, Some("G-CHECK"));

    assert_eq!(block_on(bootstrap.initialize()), Ok(()));
    assert!(bootstrap.analytics().is_none());
    assert_eq!(warnings(&records).len(), 1);
}

#[test]
fn analytics_is_published_when_supported() {
    let platform = MemoryPlatform::new();
    let (bootstrap, _) = build(&platform, Some("G-LIVE"));

    block_on(bootstrap.initialize()).unwrap();

    let analytics = bootstrap.analytics().expect("analytics handle");
    assert_eq!(analytics.measurement_id, "G-LIVE");
}

#[test]
fn wait_after_success_has_no_side_effects() {
    let platform = MemoryPlatform::new();
    let (bootstrap, _) = build(&platform, Some("G-WAIT"));

    block_on(bootstrap.initialize()).unwrap();
    let calls = platform.analytics_calls();

    for _ in 0..3 {
        assert_eq!(block_on(bootstrap.wait_for_ready()), Ok(()));
    }
    assert_eq!(bootstrap.outcome(), Some(Ok(())));
    assert_eq!(platform.apps_created(), 1);
    assert_eq!(platform.analytics_calls(), calls);
    assert_eq!(platform.listener_count(), 1);
}

#[tokio::test]
async fn waiters_resume_once_initialize_runs() {
    let platform = MemoryPlatform::new();
    let (bootstrap, _) = build(&platform, None);
    let bootstrap = Arc::new(bootstrap);

    let waiter = {
        let bootstrap = Arc::clone(&bootstrap);
        tokio::spawn(async move { bootstrap.wait_for_ready().await })
    };
    tokio::task::yield_now().await;
    assert_eq!(bootstrap.signal_state(), SignalState::Pending);

    assert_eq!(bootstrap.initialize().await, Ok(()));
    assert_eq!(waiter.await.unwrap(), Ok(()));
}

#[test]
fn loads_configuration_from_console_json() {
    let config = BootstrapConfig::from_json_str(
        r#"{
            "apiKey": "demo",
            "authDomain": "demo.firebaseapp.com",
            "databaseURL": "https://demo-default-rtdb.firebaseio.com",
            "projectId": "demo"
        }"#,
    )
    .unwrap();
    let platform = MemoryPlatform::new();
    let bootstrap = Bootstrap::new(platform.clone(), config);

    block_on(bootstrap.initialize()).unwrap();

    assert_eq!(
        bootstrap.auth().and_then(|auth| auth.auth_domain.as_deref()),
        Some("demo.firebaseapp.com")
    );
    assert_eq!(
        bootstrap.database().map(|db| db.url.as_str()),
        Some("https://demo-default-rtdb.firebaseio.com")
    );
}
