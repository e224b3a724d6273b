//! Shared domain types for Tattle.
//!
//! This crate contains the core domain types used across the Tattle platform:
//! Profile, Actor, Room, ChatMessage, Story, GossipArticle, TrendTag, and
//! their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror,
//! secrecy.

pub mod actor;
pub mod config;
pub mod credential;
pub mod error;
pub mod gateway;
pub mod gossip;
pub mod interaction;
pub mod message;
pub mod profile;
pub mod room;
pub mod story;
pub mod trend;
