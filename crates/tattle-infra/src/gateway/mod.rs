//! Model gateway and OAuth provider clients.
//!
//! The provider exposes a streaming chat endpoint (SSE) plus a standard
//! OAuth code/refresh token flow. `client` consumes the event stream and
//! joins text deltas into a single reply; `oauth` handles the token
//! lifecycle and user-info fetch.

pub mod client;
pub mod oauth;

pub use client::HttpModelGateway;
pub use oauth::OAuthClient;
