//! Shared application state for the HTTP server.

use std::sync::Arc;

use life::io::store::Store;
use life::service::BoardService;

/// Service type shared by every handler; the backend is chosen at startup.
pub type Service = BoardService<Box<dyn Store>>;

/// Shared state accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<Service>,
}

impl AppState {
    pub fn new(service: Service) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
