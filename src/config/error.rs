use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigErrorCode {
    NoOptions,
    InvalidArgument,
    InvalidJson,
    Io,
}

impl ConfigErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigErrorCode::NoOptions => "config/no-options",
            ConfigErrorCode::InvalidArgument => "config/invalid-argument",
            ConfigErrorCode::InvalidJson => "config/invalid-json",
            ConfigErrorCode::Io => "config/io",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigError {
    pub code: ConfigErrorCode,
    message: String,
}

impl ConfigError {
    pub fn new(code: ConfigErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl std::error::Error for ConfigError {}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        invalid_json(err.to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

pub fn no_options() -> ConfigError {
    ConfigError::new(
        ConfigErrorCode::NoOptions,
        "No Firebase options were provided; \
         set at least one of apiKey, projectId, appId or databaseURL",
    )
}

pub fn invalid_argument(message: impl Into<String>) -> ConfigError {
    ConfigError::new(ConfigErrorCode::InvalidArgument, message)
}

pub fn invalid_json(message: impl Into<String>) -> ConfigError {
    ConfigError::new(ConfigErrorCode::InvalidJson, message)
}

pub fn io_error(message: impl Into<String>) -> ConfigError {
    ConfigError::new(ConfigErrorCode::Io, message)
}
