//! # Bootstrap
//!
//! Builds the shared backend client context once and publishes it through [`Bootstrap`]:
//! the app, auth and database handles, an optional analytics handle, a readiness flag that
//! mirrors `.info/connected`, and an init signal that settles exactly once.
//!
//! ## Example
//!
//! ```
//! use firebase_bootstrap::bootstrap::Bootstrap;
//! use firebase_bootstrap::config::{BootstrapConfig, FirebaseOptions};
//! use firebase_bootstrap::platform::MemoryPlatform;
//!
//! # futures::executor::block_on(async {
//! let config = BootstrapConfig::new(FirebaseOptions {
//!     project_id: Some("demo-project".into()),
//!     ..Default::default()
//! });
//! let bootstrap = Bootstrap::new(MemoryPlatform::new(), config);
//!
//! bootstrap.initialize().await.expect("bootstrap");
//! assert!(bootstrap.wait_for_ready().await.is_ok());
//! assert!(bootstrap.database().is_some());
//! # });
//! ```

mod api;
mod constants;
mod context;
mod error;
mod readiness;
mod signal;

#[doc(inline)]
pub use api::Bootstrap;

#[doc(inline)]
pub use constants::CONNECTED_PATH;

#[doc(inline)]
pub use context::ClientContext;

#[doc(inline)]
pub use error::{BootstrapError, BootstrapErrorCode, BootstrapResult};

#[doc(inline)]
pub use readiness::{is_truthy, ReadinessFlag};

#[doc(inline)]
pub use signal::{InitOutcome, InitSignal, SignalState};
