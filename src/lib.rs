//! Agent Chat Backend Library
//!
//! This library exposes modules for testing and external use.
//! The main binary is in `src/main.rs`.

pub mod agent;
pub mod api;
pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
/// Application state management
///
/// Holds shared state, per-user conversation stores, and persistence.
pub mod state;
