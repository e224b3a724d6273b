//! Observability setup for Tattle.

pub mod tracing_setup;
