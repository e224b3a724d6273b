//! Business logic for Tattle.
//!
//! This crate holds the content pipeline -- persona builder, chat round
//! orchestrator, story miner, gossip publisher -- plus the trait "ports"
//! (repositories, model gateway, credential source) that tattle-infra
//! implements. It never depends on any specific storage or transport
//! technology.

pub mod gateway;
pub mod miner;
pub mod modeljson;
pub mod persona;
pub mod publisher;
pub mod repository;
pub mod round;

#[cfg(test)]
pub(crate) mod testutil;
