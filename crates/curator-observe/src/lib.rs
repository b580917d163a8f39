//! Observability setup for the collection curator.
//!
//! The library crates only emit `tracing` events; embedding binaries call
//! [`tracing_setup::init_tracing`] once at startup.

pub mod tracing_setup;

pub use tracing_setup::{init_tracing, shutdown_tracing, TracingOptions};
