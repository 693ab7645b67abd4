//! Sigrelay API server library.
//!
//! Exposes the building blocks (config, state, error handling, routes,
//! telemetry forwarding) so unit tests and the binary entrypoint can both
//! access them.

pub mod config;
pub mod error;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod telemetry;
