//! symdx-web — Web UI and JSON API.
//!
//! Pages mirror the desktop mockup's controls: symptom text entry, a
//! Top 1/3/5 selector, a KB / classifier / both mode selector, and an
//! explanation toggle, with results, explanation, and performance panes.

pub mod error;
pub mod state;
pub mod router;
pub mod sse;
pub mod handlers;

pub use error::ApiError;
pub use router::build_router;
pub use state::{AppEvent, AppState, SharedState};
