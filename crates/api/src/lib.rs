//! FanatikJersey API library.
//!
//! The HTTP service is built as a library so the binary, the CLI and the
//! integration tests share the same router, repositories and migrations.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use routes::router;
pub use state::AppState;
