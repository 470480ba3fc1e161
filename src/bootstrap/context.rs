use std::fmt;

use once_cell::sync::OnceCell;

use crate::platform::BackendPlatform;

/// Shared handle bundle produced by a successful bootstrap.
///
/// App, auth and database are fixed when the context is published; analytics is filled in
/// afterwards if it comes up at all.
pub struct ClientContext<P: BackendPlatform> {
    app: P::App,
    auth: P::Auth,
    database: P::Database,
    analytics: OnceCell<P::Analytics>,
}

impl<P: BackendPlatform> ClientContext<P> {
    pub(crate) fn new(app: P::App, auth: P::Auth, database: P::Database) -> Self {
        Self {
            app,
            auth,
            database,
            analytics: OnceCell::new(),
        }
    }

    pub fn app(&self) -> &P::App {
        &self.app
    }

    pub fn auth(&self) -> &P::Auth {
        &self.auth
    }

    pub fn database(&self) -> &P::Database {
        &self.database
    }

    pub fn analytics(&self) -> Option<&P::Analytics> {
        self.analytics.get()
    }

    pub(crate) fn publish_analytics(&self, analytics: P::Analytics) {
        let published = self.analytics.set(analytics).is_ok();
        debug_assert!(published, "analytics handle published twice");
    }
}

impl<P: BackendPlatform> Clone for ClientContext<P> {
    fn clone(&self) -> Self {
        Self {
            app: self.app.clone(),
            auth: self.auth.clone(),
            database: self.database.clone(),
            analytics: self.analytics.clone(),
        }
    }
}

impl<P: BackendPlatform> fmt::Debug for ClientContext<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientContext")
            .field("analytics", &self.analytics.get().is_some())
            .finish_non_exhaustive()
    }
}
