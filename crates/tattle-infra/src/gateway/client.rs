//! HTTP model gateway -- concrete [`ModelGateway`] implementation.
//!
//! Sends a chat request to the provider's streaming endpoint and consumes
//! the SSE response, concatenating `choices[0].delta.content` text deltas
//! into the final reply. A `sessionId` surfaced by any event is passed
//! through. Streaming is an implementation detail: callers only ever see
//! the joined text.

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use tattle_core::gateway::ModelGateway;
use tattle_types::credential::Credential;
use tattle_types::gateway::{GatewayError, GenerateOptions, Generation};

/// HTTP client for the provider's chat/stream endpoint.
pub struct HttpModelGateway {
    client: reqwest::Client,
    base_url: String,
    app_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_prompt: Option<&'a str>,
}

/// One SSE data payload. Session events carry `sessionId`; content events
/// carry an OpenAI-style delta.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamPayload {
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Default, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

impl HttpModelGateway {
    pub fn new(base_url: String, app_id: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            app_id,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Fold one SSE data payload into the accumulated reply. Returns true when
/// the stream signalled completion. Non-JSON payloads are skipped.
fn apply_event(data: &str, text: &mut String, session_id: &mut Option<String>) -> bool {
    let data = data.trim();
    if data == "[DONE]" {
        return true;
    }

    let Ok(payload) = serde_json::from_str::<StreamPayload>(data) else {
        return false;
    };

    if let Some(session) = payload.session_id {
        *session_id = Some(session);
        return false;
    }

    if let Some(delta) = payload
        .choices
        .first()
        .and_then(|c| c.delta.content.as_deref())
    {
        text.push_str(delta);
    }

    false
}

impl ModelGateway for HttpModelGateway {
    async fn generate(
        &self,
        credential: &Credential,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<Generation, GatewayError> {
        let body = ChatRequest {
            message: prompt,
            session_id: options.session_id.as_deref(),
            system_prompt: options.system_prompt.as_deref(),
        };

        let response = self
            .client
            .post(self.url("/api/secondme/chat/stream"))
            .bearer_auth(credential.access_token.expose_secret())
            .header("X-App-Id", &self.app_id)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let mut stream = response.bytes_stream().eventsource();
        let mut text = String::new();
        let mut session_id = None;

        while let Some(event) = stream.next().await {
            let event = event.map_err(|e| GatewayError::Stream(e.to_string()))?;
            if apply_event(&event.data, &mut text, &mut session_id) {
                break;
            }
        }

        if text.is_empty() {
            return Err(GatewayError::EmptyResponse);
        }

        Ok(Generation { text, session_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_event_accumulates_deltas() {
        let mut text = String::new();
        let mut session = None;

        assert!(!apply_event(
            r#"{"choices":[{"delta":{"content":"Hel"}}]}"#,
            &mut text,
            &mut session
        ));
        assert!(!apply_event(
            r#"{"choices":[{"delta":{"content":"lo"}}]}"#,
            &mut text,
            &mut session
        ));
        assert_eq!(text, "Hello");
        assert!(session.is_none());
    }

    #[test]
    fn test_apply_event_captures_session() {
        let mut text = String::new();
        let mut session = None;

        assert!(!apply_event(
            r#"{"sessionId":"sess-42"}"#,
            &mut text,
            &mut session
        ));
        assert_eq!(session.as_deref(), Some("sess-42"));
        assert!(text.is_empty());
    }

    #[test]
    fn test_apply_event_done_marker() {
        let mut text = String::new();
        let mut session = None;
        assert!(apply_event("[DONE]", &mut text, &mut session));
    }

    #[test]
    fn test_apply_event_skips_non_json() {
        let mut text = String::new();
        let mut session = None;
        assert!(!apply_event("keepalive", &mut text, &mut session));
        assert!(text.is_empty());
    }

    #[test]
    fn test_chat_request_serialization() {
        let body = ChatRequest {
            message: "hi",
            session_id: None,
            system_prompt: Some("be brief"),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["message"], "hi");
        assert_eq!(json["systemPrompt"], "be brief");
        assert!(json.get("sessionId").is_none());
    }
}
