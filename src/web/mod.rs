//! HTTP query interface.
//!
//! Read-only: handlers serve whatever snapshot the refresh loop last
//! published and never wait on the feeds themselves.

mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
