//! Domain logic for the Sigfox callback relay.
//!
//! Everything in this crate is pure computation: the downlink payload
//! encoder, the uplink reading decoder, and the shared types and error
//! type they use. All I/O (HTTP, database, telemetry forwarding) lives
//! in the `sigrelay-db` and `sigrelay-api` crates.

pub mod codec;
pub mod error;
pub mod types;
