//! Static configuration for the bootstrap: Firebase web options, app settings and the data
//! root, plus loaders for JSON documents, files and the process environment.

mod environment;
mod error;
mod types;

#[doc(inline)]
pub use error::{ConfigError, ConfigErrorCode, ConfigResult};

#[doc(inline)]
pub use types::{
    BootstrapConfig, FirebaseAppSettings, FirebaseOptions, DEFAULT_APP_NAME, DEFAULT_DATA_ROOT,
};
