//! Interfaces exposing the answer service to clients.

pub mod http;

pub use http::{router, serve, AppState};
