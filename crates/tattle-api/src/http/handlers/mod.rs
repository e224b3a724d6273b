//! REST API handlers.

pub mod auth;
pub mod gossip;
pub mod room;
pub mod story;
pub mod trend;
pub mod world;
