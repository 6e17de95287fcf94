pub mod compositor;
pub mod config;
pub mod error;
pub mod generation;
pub mod geometry;
pub mod history;
pub mod logging;
pub mod mapper;
pub mod pipeline;
pub mod session;
pub mod snapshot;
pub mod state;
pub mod storage;

use std::sync::Arc;

pub use error::{AppError, AppResult};
pub use generation::{GenerationRequest, GenerativeService};
pub use session::{ActionOutcome, EditSession, ToolMode};
pub use snapshot::ImageSnapshot;

/// Entrypoint used by embedders: installs logging, reads `config.json` and opens a session.
pub fn start_session(service: Arc<dyn GenerativeService>) -> EditSession {
    logging::init();
    let config = config::load_app_config();
    tracing::info!(
        brush_size = config.brush_size,
        brush_opacity = config.brush_opacity,
        "starting snapmend session"
    );
    EditSession::with_config(service, &config)
}
