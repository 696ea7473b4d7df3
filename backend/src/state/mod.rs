// State management module
// Holds the configuration, upstream backend, artifact store and template catalog

/// Shared application state
pub mod app_state;

pub use app_state::{AppState, SharedState};
