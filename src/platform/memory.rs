//! In-process [`BackendPlatform`] implementation.
//!
//! `MemoryPlatform` keeps an app registry, hands out lightweight service handles and serves
//! value listeners from an in-memory path/value table. The `.info/connected` path starts out
//! `false` and changes through [`MemoryPlatform::set_connected`]. Failures can be injected per
//! operation, and counters record how often each SDK entry point was hit.
//!
//! Cloning a `MemoryPlatform` shares the underlying registry, which is how two bootstraps in
//! one process see the same apps.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use async_trait::async_trait;
use serde_json::Value;

use crate::bootstrap::CONNECTED_PATH;
use crate::config::{FirebaseAppSettings, FirebaseOptions};
use crate::platform::error::{
    duplicate_app, internal_error, listener_error, no_options, service_unavailable, PlatformError,
    PlatformResult,
};
use crate::platform::{BackendPlatform, ValueListener};

#[derive(Clone)]
pub struct MemoryPlatform {
    inner: Arc<MemoryPlatformInner>,
}

struct MemoryPlatformInner {
    apps: Mutex<HashMap<String, MemoryApp>>,
    values: Mutex<HashMap<String, Value>>,
    listeners: Mutex<BTreeMap<u64, RegisteredListener>>,
    failures: Mutex<FailurePlan>,
    analytics_supported: Mutex<bool>,
    next_listener_id: AtomicU64,
    apps_created: AtomicUsize,
    analytics_support_checks: AtomicUsize,
    analytics_instances: AtomicUsize,
}

struct RegisteredListener {
    path: String,
    callback: ValueListener,
}

#[derive(Default)]
struct FailurePlan {
    app_initialization: Option<PlatformError>,
    auth: Option<PlatformError>,
    database: Option<PlatformError>,
    analytics_support_check: Option<PlatformError>,
    analytics: Option<PlatformError>,
    listener_registration: Option<PlatformError>,
}

impl MemoryPlatform {
    pub fn new() -> Self {
        let mut values = HashMap::new();
        values.insert(CONNECTED_PATH.to_string(), Value::Bool(false));
        Self {
            inner: Arc::new(MemoryPlatformInner {
                apps: Mutex::new(HashMap::new()),
                values: Mutex::new(values),
                listeners: Mutex::new(BTreeMap::new()),
                failures: Mutex::new(FailurePlan::default()),
                analytics_supported: Mutex::new(true),
                next_listener_id: AtomicU64::new(1),
                apps_created: AtomicUsize::new(0),
                analytics_support_checks: AtomicUsize::new(0),
                analytics_instances: AtomicUsize::new(0),
            }),
        }
    }

    /// Pushes a new `.info/connected` value to every listener on that path.
    pub fn set_connected(&self, connected: bool) {
        self.set_value(CONNECTED_PATH, Value::Bool(connected));
    }

    /// Stores `value` at `path` and notifies the listeners registered there.
    pub fn set_value(&self, path: &str, value: Value) {
        let path = normalize_path(path);
        lock(&self.inner.values).insert(path.clone(), value.clone());
        for callback in self.callbacks_for(&path) {
            callback(Ok(value.clone()));
        }
    }

    pub fn value(&self, path: &str) -> Value {
        lock(&self.inner.values)
            .get(&normalize_path(path))
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Delivers a listener error to every listener registered at `path`.
    pub fn emit_listener_error(&self, path: &str, message: impl Into<String>) {
        let error = listener_error(message);
        for callback in self.callbacks_for(&normalize_path(path)) {
            callback(Err(error.clone()));
        }
    }

    pub fn set_analytics_supported(&self, supported: bool) {
        *lock(&self.inner.analytics_supported) = supported;
    }

    pub fn fail_app_initialization(&self, error: PlatformError) {
        lock(&self.inner.failures).app_initialization = Some(error);
    }

    pub fn fail_auth(&self, error: PlatformError) {
        lock(&self.inner.failures).auth = Some(error);
    }

    pub fn fail_database(&self, error: PlatformError) {
        lock(&self.inner.failures).database = Some(error);
    }

    pub fn fail_analytics_support_check(&self, error: PlatformError) {
        lock(&self.inner.failures).analytics_support_check = Some(error);
    }

    pub fn fail_analytics(&self, error: PlatformError) {
        lock(&self.inner.failures).analytics = Some(error);
    }

    pub fn fail_listener_registration(&self, error: PlatformError) {
        lock(&self.inner.failures).listener_registration = Some(error);
    }

    pub fn clear_failures(&self) {
        *lock(&self.inner.failures) = FailurePlan::default();
    }

    /// Number of apps created (registry hits are not counted).
    pub fn apps_created(&self) -> usize {
        self.inner.apps_created.load(Ordering::SeqCst)
    }

    /// Number of analytics SDK calls, support checks included.
    pub fn analytics_calls(&self) -> usize {
        self.inner.analytics_support_checks.load(Ordering::SeqCst)
            + self.inner.analytics_instances.load(Ordering::SeqCst)
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.inner.listeners).len()
    }

    pub fn app_names(&self) -> Vec<String> {
        let mut names: Vec<_> = lock(&self.inner.apps).keys().cloned().collect();
        names.sort();
        names
    }

    fn callbacks_for(&self, path: &str) -> Vec<ValueListener> {
        lock(&self.inner.listeners)
            .values()
            .filter(|listener| listener.path == path)
            .map(|listener| Arc::clone(&listener.callback))
            .collect()
    }

    fn injected<F>(&self, select: F) -> PlatformResult<()>
    where
        F: FnOnce(&FailurePlan) -> &Option<PlatformError>,
    {
        match select(&lock(&self.inner.failures)) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

impl Default for MemoryPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryPlatform")
            .field("apps", &self.app_names())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[async_trait]
impl BackendPlatform for MemoryPlatform {
    type App = MemoryApp;
    type Auth = MemoryAuth;
    type Database = MemoryDatabase;
    type Analytics = MemoryAnalytics;
    type Subscription = MemorySubscription;

    fn existing_app(&self, name: &str) -> Option<MemoryApp> {
        lock(&self.inner.apps).get(name).cloned()
    }

    fn initialize_app(
        &self,
        options: &FirebaseOptions,
        settings: &FirebaseAppSettings,
    ) -> PlatformResult<MemoryApp> {
        self.injected(|plan| &plan.app_initialization)?;
        if !options.is_defined() {
            return Err(no_options());
        }

        let name = settings.app_name().to_string();
        let mut apps = lock(&self.inner.apps);
        if let Some(existing) = apps.get(&name) {
            return if existing.options() == options
                && existing.automatic_data_collection_enabled()
                    == settings.automatic_data_collection()
            {
                Ok(existing.clone())
            } else {
                Err(duplicate_app(&name))
            };
        }

        let app = MemoryApp {
            inner: Arc::new(MemoryAppInner {
                name: name.clone(),
                options: options.clone(),
                automatic_data_collection_enabled: settings.automatic_data_collection(),
            }),
        };
        apps.insert(name, app.clone());
        self.inner.apps_created.fetch_add(1, Ordering::SeqCst);
        Ok(app)
    }

    fn auth(&self, app: &MemoryApp) -> PlatformResult<MemoryAuth> {
        self.injected(|plan| &plan.auth)?;
        Ok(MemoryAuth {
            app_name: app.name().to_string(),
            auth_domain: app.options().auth_domain.clone(),
        })
    }

    fn database(&self, app: &MemoryApp) -> PlatformResult<MemoryDatabase> {
        self.injected(|plan| &plan.database)?;
        let url = app
            .options()
            .database_url
            .clone()
            .or_else(|| {
                app.options()
                    .project_id
                    .as_ref()
                    .map(|project| format!("https://{project}-default-rtdb.firebaseio.com"))
            })
            .ok_or_else(|| {
                service_unavailable(
                    "database",
                    "Can't determine Firebase Database URL; set databaseURL or projectId",
                )
            })?;
        Ok(MemoryDatabase {
            app_name: app.name().to_string(),
            url,
        })
    }

    async fn analytics_supported(&self) -> PlatformResult<bool> {
        self.inner
            .analytics_support_checks
            .fetch_add(1, Ordering::SeqCst);
        self.injected(|plan| &plan.analytics_support_check)?;
        Ok(*lock(&self.inner.analytics_supported))
    }

    async fn analytics(&self, app: &MemoryApp) -> PlatformResult<MemoryAnalytics> {
        self.inner.analytics_instances.fetch_add(1, Ordering::SeqCst);
        self.injected(|plan| &plan.analytics)?;
        let measurement_id = app
            .options()
            .measurement_id()
            .ok_or_else(|| internal_error("Analytics requires a measurementId"))?;
        Ok(MemoryAnalytics {
            app_name: app.name().to_string(),
            measurement_id: measurement_id.to_string(),
        })
    }

    fn on_value(
        &self,
        _database: &MemoryDatabase,
        path: &str,
        listener: ValueListener,
    ) -> PlatformResult<MemorySubscription> {
        self.injected(|plan| &plan.listener_registration)?;
        let path = normalize_path(path);
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.inner.listeners).insert(
            id,
            RegisteredListener {
                path: path.clone(),
                callback: Arc::clone(&listener),
            },
        );

        // New listeners see the current value right away.
        listener(Ok(self.value(&path)));

        Ok(MemorySubscription {
            platform: Arc::downgrade(&self.inner),
            id: Some(id),
        })
    }
}

fn normalize_path(path: &str) -> String {
    path.trim_matches('/').to_string()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Clone)]
pub struct MemoryApp {
    inner: Arc<MemoryAppInner>,
}

struct MemoryAppInner {
    name: String,
    options: FirebaseOptions,
    automatic_data_collection_enabled: bool,
}

impl MemoryApp {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn options(&self) -> &FirebaseOptions {
        &self.inner.options
    }

    pub fn automatic_data_collection_enabled(&self) -> bool {
        self.inner.automatic_data_collection_enabled
    }

    /// Whether two handles refer to the same registered app.
    pub fn ptr_eq(&self, other: &MemoryApp) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for MemoryApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryApp")
            .field("name", &self.name())
            .field("project_id", &self.options().project_id)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryAuth {
    pub app_name: String,
    pub auth_domain: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryDatabase {
    pub app_name: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryAnalytics {
    pub app_name: String,
    pub measurement_id: String,
}

/// Listener registration; dropping it detaches the listener.
pub struct MemorySubscription {
    platform: Weak<MemoryPlatformInner>,
    id: Option<u64>,
}

impl MemorySubscription {
    pub fn detach(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if let (Some(id), Some(platform)) = (self.id.take(), self.platform.upgrade()) {
            lock(&platform.listeners).remove(&id);
        }
    }
}

impl Drop for MemorySubscription {
    fn drop(&mut self) {
        self.remove();
    }
}

impl fmt::Debug for MemorySubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySubscription")
            .field("id", &self.id)
            .finish()
    }
}
