//! Log analytics API: library crate for the ingestion and search server.
//!
//! Re-exports all modules so the binary (`main.rs`) and external crates
//! (e.g. `la-e2e-tests`) can reach `AppState`, `build_router` and the
//! PostgreSQL store.

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod state;
