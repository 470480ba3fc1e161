//! Seam between the bootstrap and the backend platform SDK.
//!
//! [`BackendPlatform`] names the handful of SDK calls the bootstrap makes: app registry
//! lookup and creation, the auth and database services, analytics, and value listeners.
//! Handles are opaque associated types so the bootstrap never depends on a concrete SDK.

mod error;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::{FirebaseAppSettings, FirebaseOptions};

#[doc(inline)]
pub use error::{
    duplicate_app, internal_error, listener_error, no_options, service_unavailable,
    PlatformError, PlatformErrorCode, PlatformResult,
};

#[doc(inline)]
pub use memory::{
    MemoryAnalytics, MemoryApp, MemoryAuth, MemoryDatabase, MemoryPlatform, MemorySubscription,
};

/// Callback invoked for every value (or error) delivered at a listened path.
pub type ValueListener = Arc<dyn Fn(PlatformResult<Value>) + Send + Sync + 'static>;

#[async_trait]
pub trait BackendPlatform: Send + Sync + 'static {
    type App: Clone + Send + Sync + 'static;
    type Auth: Clone + Send + Sync + 'static;
    type Database: Clone + Send + Sync + 'static;
    type Analytics: Clone + Send + Sync + 'static;
    /// Keeps a listener attached; dropping it detaches the listener.
    type Subscription: Send + 'static;

    /// Looks up an app already present in the SDK registry.
    fn existing_app(&self, name: &str) -> Option<Self::App>;

    fn initialize_app(
        &self,
        options: &FirebaseOptions,
        settings: &FirebaseAppSettings,
    ) -> PlatformResult<Self::App>;

    fn auth(&self, app: &Self::App) -> PlatformResult<Self::Auth>;

    fn database(&self, app: &Self::App) -> PlatformResult<Self::Database>;

    /// Reports whether analytics can run in the current environment.
    async fn analytics_supported(&self) -> PlatformResult<bool>;

    async fn analytics(&self, app: &Self::App) -> PlatformResult<Self::Analytics>;

    /// Registers a value listener at `path`.
    fn on_value(
        &self,
        database: &Self::Database,
        path: &str,
        listener: ValueListener,
    ) -> PlatformResult<Self::Subscription>;
}
