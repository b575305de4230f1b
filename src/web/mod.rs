pub mod handlers;
pub mod server;

pub use server::start_web_server;

use crate::config::Config;
use crate::database::Store;
use crate::maintenance::Scheduler;
use std::sync::Arc;

/// Application state shared across all handlers via `State<Arc<AppState>>`.
pub struct AppState {
    pub config: Config,
    pub store: Arc<Store>,
    pub scheduler: Arc<Scheduler>,
}
