//! Model gateway request/response types.
//!
//! The gateway wraps an external conversational-AI endpoint. The real
//! implementation consumes an incremental event stream and concatenates
//! text deltas; callers only ever see the final joined text.

use serde::{Deserialize, Serialize};

/// Options for a generation call.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Continue an existing provider-side conversation.
    pub session_id: Option<String>,
    /// Persona frame for the speaking actor. Absent for analysis calls
    /// (story mining, article synthesis).
    pub system_prompt: Option<String>,
}

/// The joined result of a generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    pub text: String,
    /// Provider-side session id, when the stream surfaced one.
    pub session_id: Option<String>,
}

/// Errors from model gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("gateway returned status {status}: {message}")]
    Http { status: u16, message: String },

    #[error("stream error: {0}")]
    Stream(String),

    #[error("gateway produced no text")]
    EmptyResponse,
}
