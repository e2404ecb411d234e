//! Application state

use drydock_auth::TokenService;
use drydock_db::Database;
use drydock_mail::Mailer;
use drydock_storage::StorageBackend;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub storage: Arc<dyn StorageBackend>,
    pub tokens: Arc<TokenService>,
    pub mailer: Arc<Mailer>,
    /// Session cookies carry the `Secure` attribute when true
    pub cookie_secure: bool,
    /// Public base URL used in emailed links
    pub app_base_url: String,
}

impl AppState {
    pub fn new(
        db: Database,
        storage: Arc<dyn StorageBackend>,
        tokens: Arc<TokenService>,
        mailer: Arc<Mailer>,
        cookie_secure: bool,
        app_base_url: String,
    ) -> Self {
        Self {
            db,
            storage,
            tokens,
            mailer,
            cookie_secure,
            app_base_url,
        }
    }
}

/// Prometheus render handle exposed on the metrics endpoint
#[derive(Clone)]
pub struct MetricsHandle {
    handle: PrometheusHandle,
}

impl MetricsHandle {
    pub fn new(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }
}
