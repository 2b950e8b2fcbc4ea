//! HTTP surface over the refresh job and the reader

pub mod handlers;
pub mod server;

pub use server::AppState;
