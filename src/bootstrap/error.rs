use std::fmt::{Display, Formatter};

use crate::platform::PlatformError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BootstrapErrorCode {
    /// App, auth or database creation failed; fatal to the init signal.
    AppInit,
    AnalyticsInit,
    ConnectionListenerSetup,
    ConnectionListener,
}

impl BootstrapErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BootstrapErrorCode::AppInit => "bootstrap/app-init",
            BootstrapErrorCode::AnalyticsInit => "bootstrap/analytics-init",
            BootstrapErrorCode::ConnectionListenerSetup => "bootstrap/connection-listener-setup",
            BootstrapErrorCode::ConnectionListener => "bootstrap/connection-listener",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BootstrapError {
    pub code: BootstrapErrorCode,
    message: String,
    source: Option<PlatformError>,
}

impl BootstrapError {
    pub fn new(code: BootstrapErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The platform error this failure wraps, if any.
    pub fn platform_error(&self) -> Option<&PlatformError> {
        self.source.as_ref()
    }

    fn from_platform(code: BootstrapErrorCode, context: &str, err: PlatformError) -> Self {
        Self {
            code,
            message: format!("{context}: {err}"),
            source: Some(err),
        }
    }
}

impl Display for BootstrapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl std::error::Error for BootstrapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|err| err as &(dyn std::error::Error + 'static))
    }
}

pub type BootstrapResult<T> = Result<T, BootstrapError>;

pub fn app_init_error(context: &str, err: PlatformError) -> BootstrapError {
    BootstrapError::from_platform(BootstrapErrorCode::AppInit, context, err)
}

pub fn analytics_init_error(err: PlatformError) -> BootstrapError {
    BootstrapError::from_platform(
        BootstrapErrorCode::AnalyticsInit,
        "Analytics initialization failed",
        err,
    )
}

pub fn connection_listener_setup_error(err: PlatformError) -> BootstrapError {
    BootstrapError::from_platform(
        BootstrapErrorCode::ConnectionListenerSetup,
        "Failed to attach connection listener",
        err,
    )
}

pub fn connection_listener_error(err: PlatformError) -> BootstrapError {
    BootstrapError::from_platform(
        BootstrapErrorCode::ConnectionListener,
        "Connection listener error",
        err,
    )
}
