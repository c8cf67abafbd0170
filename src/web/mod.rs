//! Web server module (Axum + API).

pub mod api;
pub mod router;
pub mod server;

pub use router::create_app_router;
pub use server::run_server;

use std::sync::Arc;

use crate::config::Settings;
use crate::store::Store;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(store: Store, settings: Settings) -> Self {
        Self {
            store,
            settings: Arc::new(settings),
        }
    }
}
