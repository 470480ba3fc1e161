use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlatformErrorCode {
    NoOptions,
    DuplicateApp,
    ServiceUnavailable,
    Listener,
    Internal,
}

impl PlatformErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformErrorCode::NoOptions => "app/no-options",
            PlatformErrorCode::DuplicateApp => "app/duplicate-app",
            PlatformErrorCode::ServiceUnavailable => "app/service-unavailable",
            PlatformErrorCode::Listener => "database/listener",
            PlatformErrorCode::Internal => "app/internal",
        }
    }
}

/// Error reported by the backend platform SDK.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlatformError {
    pub code: PlatformErrorCode,
    message: String,
}

impl PlatformError {
    pub fn new(code: PlatformErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for PlatformError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl std::error::Error for PlatformError {}

pub type PlatformResult<T> = Result<T, PlatformError>;

pub fn no_options() -> PlatformError {
    PlatformError::new(
        PlatformErrorCode::NoOptions,
        "Need to provide options when initializing an app",
    )
}

pub fn duplicate_app(app_name: &str) -> PlatformError {
    PlatformError::new(
        PlatformErrorCode::DuplicateApp,
        format!("App named '{app_name}' already exists with different options or config"),
    )
}

pub fn service_unavailable(service: &str, message: impl Into<String>) -> PlatformError {
    PlatformError::new(
        PlatformErrorCode::ServiceUnavailable,
        format!("{service}: {}", message.into()),
    )
}

pub fn listener_error(message: impl Into<String>) -> PlatformError {
    PlatformError::new(PlatformErrorCode::Listener, message)
}

pub fn internal_error(message: impl Into<String>) -> PlatformError {
    PlatformError::new(PlatformErrorCode::Internal, message)
}
