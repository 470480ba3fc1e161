//! Named, level-filtered logger used by the bootstrap.
//!
//! Each [`Logger`] carries its own threshold and an optional user handler. The default
//! handler forwards records to the [`log`] facade using the logger name as the target, so
//! any `log` implementation installed by the host application receives them.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, LazyLock, Mutex, RwLock, Weak};

static GLOBAL_LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);
static INSTANCES: LazyLock<Mutex<Vec<Weak<LoggerInner>>>> =
    LazyLock::new(|| Mutex::new(Vec::new()));

/// Crate-wide logger used when a [`Bootstrap`](crate::bootstrap::Bootstrap) is not given one.
pub static LOGGER: LazyLock<Logger> = LazyLock::new(|| Logger::new("@firebase-bootstrap"));

pub type LogHandler = Arc<dyn Fn(&Logger, LogLevel, &str) + Send + Sync + 'static>;

#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

struct LoggerInner {
    name: String,
    log_level: AtomicU8,
    user_log_handler: RwLock<Option<LogHandler>>,
}

impl Logger {
    pub fn new(name: impl Into<String>) -> Self {
        let inner = Arc::new(LoggerInner {
            name: name.into(),
            log_level: AtomicU8::new(GLOBAL_LOG_LEVEL.load(Ordering::SeqCst)),
            user_log_handler: RwLock::new(None),
        });
        track_instance(&inner);
        Self { inner }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn log_level(&self) -> LogLevel {
        LogLevel::from_u8(self.inner.log_level.load(Ordering::SeqCst))
    }

    pub fn set_log_level(&self, level: LogLevel) {
        self.inner.log_level.store(level as u8, Ordering::SeqCst);
    }

    /// Installs a handler that sees every record at or above this logger's level.
    ///
    /// The handler runs in addition to the `log` forwarding, never instead of it.
    pub fn set_user_log_handler<F>(&self, handler: F)
    where
        F: Fn(&Logger, LogLevel, &str) + Send + Sync + 'static,
    {
        *self.write_handler() = Some(Arc::new(handler));
    }

    pub fn clear_user_log_handler(&self) {
        self.write_handler().take();
    }

    pub fn has_user_log_handler(&self) -> bool {
        self.read_handler().is_some()
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        self.dispatch(LogLevel::Debug, message.as_ref());
    }

    pub fn log(&self, message: impl AsRef<str>) {
        self.dispatch(LogLevel::Verbose, message.as_ref());
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.dispatch(LogLevel::Info, message.as_ref());
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.dispatch(LogLevel::Warn, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.dispatch(LogLevel::Error, message.as_ref());
    }

    fn dispatch(&self, level: LogLevel, message: &str) {
        if level == LogLevel::Silent || level < self.log_level() {
            return;
        }
        let handler = self.read_handler().clone();
        if let Some(handler) = handler {
            handler(self, level, message);
        }
        forward_to_log(self.name(), level, message);
    }

    fn read_handler(&self) -> std::sync::RwLockReadGuard<'_, Option<LogHandler>> {
        self.inner
            .user_log_handler
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_handler(&self) -> std::sync::RwLockWriteGuard<'_, Option<LogHandler>> {
        self.inner
            .user_log_handler
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name())
            .field("log_level", &self.log_level())
            .finish()
    }
}

fn forward_to_log(target: &str, level: LogLevel, message: &str) {
    let level = match level {
        LogLevel::Debug => log::Level::Debug,
        LogLevel::Verbose => log::Level::Trace,
        LogLevel::Info => log::Level::Info,
        LogLevel::Warn => log::Level::Warn,
        LogLevel::Error => log::Level::Error,
        LogLevel::Silent => return,
    };
    log::log!(target: target, level, "{message}");
}

fn track_instance(inner: &Arc<LoggerInner>) {
    let mut instances = INSTANCES.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    instances.retain(|weak| weak.strong_count() > 0);
    instances.push(Arc::downgrade(inner));
}

/// Sets the level of every live logger and of loggers created afterwards.
pub fn set_log_level(level: LogLevel) {
    GLOBAL_LOG_LEVEL.store(level as u8, Ordering::SeqCst);
    let instances = INSTANCES.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    for inner in instances.iter().filter_map(Weak::upgrade) {
        Logger { inner }.set_log_level(level);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum LogLevel {
    Debug = 0,
    Verbose = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Silent = 5,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Verbose => "verbose",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Silent => "silent",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Debug,
            1 => LogLevel::Verbose,
            2 => LogLevel::Info,
            3 => LogLevel::Warn,
            4 => LogLevel::Error,
            _ => LogLevel::Silent,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

impl FromStr for LogLevel {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "verbose" | "trace" => Ok(LogLevel::Verbose),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "silent" | "off" => Ok(LogLevel::Silent),
            other => Err(LogError::InvalidLogLevel(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogError {
    InvalidLogLevel(String),
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogError::InvalidLogLevel(level) => write!(f, "Invalid log level \"{level}\""),
        }
    }
}

impl std::error::Error for LogError {}
