// State management module
// Handles shared application state, per-user workspaces, and persistence

pub mod app_state;
pub mod persistence;

pub use app_state::{AppState, SharedState, ThreadWorkspaces};
pub use persistence::{FileStorage, MemoryStorage, PersistenceError, Storage};
