//! Session management and persistence
//!
//! This module provides the session and interaction records, their SQLite
//! storage, and the service that keeps one session active per client.

mod database;
mod errors;
mod queries;
mod service;
mod session;

pub use database::*;
pub use errors::*;
pub use service::*;
