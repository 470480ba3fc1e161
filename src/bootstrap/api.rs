use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_lock::Mutex as AsyncMutex;
use once_cell::sync::OnceCell;

use crate::bootstrap::constants::CONNECTED_PATH;
use crate::bootstrap::context::ClientContext;
use crate::bootstrap::error::{
    analytics_init_error, app_init_error, connection_listener_error,
    connection_listener_setup_error, BootstrapResult,
};
use crate::bootstrap::readiness::ReadinessFlag;
use crate::bootstrap::signal::{InitOutcome, InitSignal, SignalState};
use crate::config::BootstrapConfig;
use crate::logger::{Logger, LOGGER};
use crate::platform::{BackendPlatform, PlatformResult, ValueListener};

/// One-time bootstrap of the backend client context.
///
/// The hosting application builds one `Bootstrap` at startup, calls
/// [`initialize`](Self::initialize) once (extra calls are harmless), and hands the value, or
/// an `Arc` of it, to everything that needs the backend. Consumers call
/// [`wait_for_ready`](Self::wait_for_ready) before touching the handles.
///
/// Only failures creating the app, auth or database handles reject the init signal.
/// Analytics and the connection listener are best effort: their failures are logged and
/// leave analytics absent or the readiness flag unchanged.
pub struct Bootstrap<P: BackendPlatform> {
    platform: P,
    config: BootstrapConfig,
    logger: Logger,
    // Held by the caller driving initialization; released on completion or cancellation.
    attempt: AsyncMutex<()>,
    initialized: AtomicBool,
    context: OnceCell<ClientContext<P>>,
    readiness: ReadinessFlag,
    signal: InitSignal,
    // Held for the lifetime of the bootstrap; there is no explicit unsubscribe.
    connection: Mutex<Option<P::Subscription>>,
}

impl<P: BackendPlatform> Bootstrap<P> {
    pub fn new(platform: P, config: BootstrapConfig) -> Self {
        Self {
            platform,
            config,
            logger: LOGGER.clone(),
            attempt: AsyncMutex::new(()),
            initialized: AtomicBool::new(false),
            context: OnceCell::new(),
            readiness: ReadinessFlag::new(),
            signal: InitSignal::new(),
            connection: Mutex::new(None),
        }
    }

    /// Routes this bootstrap's log output through `logger` instead of [`LOGGER`].
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Runs initialization on the first call and returns the settled outcome.
    ///
    /// Later or concurrent calls perform no side effects; they wait for the outcome of the
    /// running attempt. A failed attempt is not retried. If the future driving an attempt is
    /// dropped before the signal settles, the attempt lock is released and the next caller
    /// picks the attempt up, reusing any context already published.
    pub async fn initialize(&self) -> InitOutcome {
        if let Some(outcome) = self.signal.outcome() {
            return outcome;
        }

        let _attempt = match self.attempt.try_lock() {
            Some(guard) => guard,
            None => {
                self.logger
                    .debug("Initialization already started; waiting for the running attempt");
                self.attempt.lock().await
            }
        };
        if let Some(outcome) = self.signal.outcome() {
            return outcome;
        }

        self.run_attempt().await
    }

    async fn run_attempt(&self) -> InitOutcome {
        let context = match self.context.get() {
            Some(context) => {
                self.logger
                    .debug("Resuming an interrupted initialization attempt");
                context
            }
            None => {
                self.logger.info(format!(
                    "Bootstrapping Firebase app '{}'",
                    self.config.app_name()
                ));
                match self.create_context() {
                    Ok(context) => self.context.get_or_init(|| context),
                    Err(err) => {
                        self.logger
                            .error(format!("Firebase initialization failed: {err}"));
                        self.signal.reject(err).await;
                        return self.wait_for_ready().await;
                    }
                }
            }
        };

        if context.analytics().is_none() {
            if let Some(analytics) = self.initialize_analytics(context.app()).await {
                context.publish_analytics(analytics);
            }
        }
        self.watch_connection(context.database());

        self.initialized.store(true, Ordering::SeqCst);
        if self.signal.resolve().await {
            self.logger.info("Firebase bootstrap complete");
        }
        self.wait_for_ready().await
    }

    /// Waits until initialization settles and returns its outcome.
    ///
    /// Once settled, returns the stored outcome immediately.
    pub async fn wait_for_ready(&self) -> InitOutcome {
        self.signal.wait().await
    }

    fn create_context(&self) -> BootstrapResult<ClientContext<P>> {
        let app = match self.platform.existing_app(self.config.app_name()) {
            Some(app) => {
                self.logger.info("Reusing existing Firebase app");
                app
            }
            None => {
                let app = self
                    .platform
                    .initialize_app(self.config.options(), self.config.settings())
                    .map_err(|err| app_init_error("Failed to initialize Firebase app", err))?;
                self.logger.info("Firebase app initialized");
                app
            }
        };

        let auth = self
            .platform
            .auth(&app)
            .map_err(|err| app_init_error("Failed to obtain Auth", err))?;
        let database = self
            .platform
            .database(&app)
            .map_err(|err| app_init_error("Failed to obtain Realtime Database", err))?;

        Ok(ClientContext::new(app, auth, database))
    }

    async fn initialize_analytics(&self, app: &P::App) -> Option<P::Analytics> {
        if self.config.options().measurement_id().is_none() {
            self.logger
                .info("Analytics skipped: no measurementId configured");
            return None;
        }

        match self.probe_analytics(app).await {
            Ok(Some(analytics)) => {
                self.logger.info("Analytics initialized");
                Some(analytics)
            }
            Ok(None) => {
                self.logger
                    .info("Analytics skipped: not supported in this environment");
                None
            }
            Err(err) => {
                self.logger.warn(analytics_init_error(err).to_string());
                None
            }
        }
    }

    async fn probe_analytics(&self, app: &P::App) -> PlatformResult<Option<P::Analytics>> {
        if !self.platform.analytics_supported().await? {
            return Ok(None);
        }
        self.platform.analytics(app).await.map(Some)
    }

    fn watch_connection(&self, database: &P::Database) {
        let readiness = self.readiness.clone();
        let logger = self.logger.clone();
        let listener: ValueListener = Arc::new(move |event| match event {
            Ok(value) => {
                if readiness.set_from_value(&value) {
                    logger.info("Connected to Firebase");
                } else {
                    logger.info("Disconnected from Firebase");
                }
            }
            Err(err) => {
                logger.warn(connection_listener_error(err).to_string());
                readiness.set(false);
            }
        });

        match self.platform.on_value(database, CONNECTED_PATH, listener) {
            Ok(subscription) => {
                *self
                    .connection
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(subscription);
            }
            Err(err) => self
                .logger
                .warn(connection_listener_setup_error(err).to_string()),
        }
    }

    /// The published handle bundle, once initialization got past the core services.
    pub fn context(&self) -> Option<&ClientContext<P>> {
        self.context.get()
    }

    pub fn app(&self) -> Option<&P::App> {
        self.context().map(ClientContext::app)
    }

    pub fn auth(&self) -> Option<&P::Auth> {
        self.context().map(ClientContext::auth)
    }

    pub fn database(&self) -> Option<&P::Database> {
        self.context().map(ClientContext::database)
    }

    pub fn analytics(&self) -> Option<&P::Analytics> {
        self.context().and_then(ClientContext::analytics)
    }

    /// Latest known connection state.
    pub fn is_ready(&self) -> bool {
        self.readiness.get()
    }

    /// Shareable handle on the connection state.
    pub fn readiness(&self) -> ReadinessFlag {
        self.readiness.clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn signal_state(&self) -> SignalState {
        self.signal.state()
    }

    /// The settled outcome without waiting, `None` while pending.
    pub fn outcome(&self) -> Option<InitOutcome> {
        self.signal.outcome()
    }

    pub fn is_listening(&self) -> bool {
        self.connection
            .lock()
            .map(|connection| connection.is_some())
            .unwrap_or(false)
    }

    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    pub fn data_root(&self) -> &str {
        self.config.data_root()
    }

    /// Joins `path` under the data root, e.g. `workArrangementV3/staff/42`.
    pub fn data_path(&self, path: &str) -> String {
        let relative = path.trim_matches('/');
        if relative.is_empty() {
            self.data_root().to_string()
        } else {
            format!("{}/{relative}", self.data_root())
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }
}

impl<P: BackendPlatform> fmt::Debug for Bootstrap<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bootstrap")
            .field("app_name", &self.config.app_name())
            .field("initialized", &self.is_initialized())
            .field("ready", &self.is_ready())
            .field("signal", &self.signal_state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FirebaseOptions;
    use crate::platform::MemoryPlatform;
    use futures::executor::block_on;

    fn bootstrap() -> Bootstrap<MemoryPlatform> {
        let config = BootstrapConfig::new(FirebaseOptions {
            project_id: Some("unit".into()),
            ..Default::default()
        });
        Bootstrap::new(MemoryPlatform::new(), config)
            .with_logger(Logger::new("@firebase-bootstrap/unit"))
    }

    #[test]
    fn starts_pending_and_empty() {
        let bootstrap = bootstrap();
        assert_eq!(bootstrap.signal_state(), SignalState::Pending);
        assert!(bootstrap.context().is_none());
        assert!(bootstrap.outcome().is_none());
        assert!(!bootstrap.is_ready());
        assert!(!bootstrap.is_initialized());
        assert!(!bootstrap.is_listening());
    }

    #[test]
    fn initialize_publishes_context() {
        let bootstrap = bootstrap();
        assert_eq!(block_on(bootstrap.initialize()), Ok(()));

        assert!(bootstrap.is_initialized());
        assert!(bootstrap.is_listening());
        assert_eq!(bootstrap.app().map(|app| app.name()), Some("[DEFAULT]"));
        assert_eq!(
            bootstrap.database().map(|db| db.url.as_str()),
            Some("https://unit-default-rtdb.firebaseio.com")
        );
        assert!(bootstrap.auth().is_some());
        assert!(bootstrap.analytics().is_none());
    }

    #[test]
    fn data_path_joins_under_root() {
        let bootstrap = bootstrap();
        assert_eq!(bootstrap.data_path("/staff/42/"), "workArrangementV3/staff/42");
        assert_eq!(bootstrap.data_path(""), "workArrangementV3");
    }
}
