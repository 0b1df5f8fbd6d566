//! HTTP API of the TubeMind backend
//!
//! Auth, video notes, PDF notes, per-document chat and the admin panel, served
//! by axum on top of the `auth` and `notes` crates.

pub mod error;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod storage;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::{AppState, NoteServices};
