//! HTTP server for Corkboard.
//!
//! Maps each route onto a single document-store operation (preceded, for
//! post creation, by at most one blob write) and serializes the result as
//! JSON. Uploaded attachments are served back statically under `/uploads`.

pub mod config;
pub mod error;
pub mod form;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use router::build_router;
pub use server::CorkServer;
pub use state::AppState;
