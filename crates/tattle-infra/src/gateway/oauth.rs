//! OAuth client for the identity provider.
//!
//! Token exchange and refresh both use `application/x-www-form-urlencoded`
//! bodies and return a `{code, data}` envelope; `code == 0` means success.
//! A successful refresh invalidates the old refresh token, so callers must
//! persist the returned pair immediately.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use tattle_types::credential::TokenResponse;
use tattle_types::error::CredentialError;

/// Authorization page for the login redirect.
const AUTHORIZE_URL: &str = "https://go.second.me/oauth/";

/// Remote user profile as returned by the provider's user-info endpoint.
#[derive(Debug, Clone)]
pub struct RemoteProfile {
    /// Stable identifier (the provider's route, falling back to email).
    pub external_id: String,
    pub name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
}

/// Client for the provider's OAuth and user-info endpoints.
pub struct OAuthClient {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: SecretString,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    data: Option<T>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenData {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserData {
    #[serde(default)]
    route: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
    #[serde(default)]
    bio: Option<String>,
}

impl OAuthClient {
    pub fn new(base_url: String, client_id: String, client_secret: SecretString) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            client_id,
            client_secret,
        }
    }

    /// Build the authorization URL the browser is redirected to.
    pub fn auth_url(&self, redirect_uri: &str, state: &str) -> String {
        format!(
            "{AUTHORIZE_URL}?client_id={}&redirect_uri={}&response_type=code&state={}",
            urlencode(&self.client_id),
            urlencode(redirect_uri),
            urlencode(state),
        )
    }

    /// Exchange an authorization code for a token pair.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, CredentialError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
        ];

        self.token_request("/api/oauth/token/code", &form)
            .await
            .map_err(CredentialError::ExchangeFailed)
    }

    /// Refresh an expiring token pair. The old refresh token dies here.
    pub async fn refresh(
        &self,
        refresh_token: &SecretString,
    ) -> Result<TokenResponse, CredentialError> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.expose_secret()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
        ];

        self.token_request("/api/oauth/token/refresh", &form)
            .await
            .map_err(CredentialError::RefreshFailed)
    }

    /// Fetch the signed-in user's profile.
    pub async fn user_info(&self, access_token: &SecretString) -> Result<RemoteProfile, CredentialError> {
        let response = self
            .client
            .get(format!("{}/api/secondme/user/info", self.base_url))
            .bearer_auth(access_token.expose_secret())
            .send()
            .await
            .map_err(|e| CredentialError::ExchangeFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CredentialError::ExchangeFailed(format!(
                "user info returned status {status}"
            )));
        }

        let envelope: Envelope<UserData> = response
            .json()
            .await
            .map_err(|e| CredentialError::ExchangeFailed(e.to_string()))?;

        let Envelope { code: 0, data: Some(user) } = envelope else {
            return Err(CredentialError::ExchangeFailed(
                "provider returned a non-zero code".to_string(),
            ));
        };

        let external_id = user
            .route
            .clone()
            .or_else(|| user.email.clone())
            .ok_or_else(|| {
                CredentialError::ExchangeFailed("user info has no stable identifier".to_string())
            })?;

        Ok(RemoteProfile {
            external_id,
            name: user.name.unwrap_or_else(|| "Mystery Guest".to_string()),
            email: user.email,
            avatar_url: user.avatar_url,
            bio: user.bio,
        })
    }

    async fn token_request(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<TokenResponse, String> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .form(form)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, %body, "token request failed");
            return Err(format!("token endpoint returned status {status}"));
        }

        let envelope: Envelope<TokenData> = response.json().await.map_err(|e| e.to_string())?;

        let Envelope { code: 0, data: Some(token) } = envelope else {
            return Err("provider returned a non-zero code".to_string());
        };

        Ok(TokenResponse {
            access_token: SecretString::from(token.access_token),
            refresh_token: SecretString::from(token.refresh_token),
            expires_in_secs: token.expires_in,
        })
    }
}

/// Minimal percent-encoding for query components.
fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OAuthClient {
        OAuthClient::new(
            "https://provider.example".to_string(),
            "app-123".to_string(),
            SecretString::from("secret"),
        )
    }

    #[test]
    fn test_auth_url_encodes_params() {
        let url = client().auth_url("https://tattle.example/callback?x=1", "st ate");
        assert!(url.starts_with(AUTHORIZE_URL));
        assert!(url.contains("client_id=app-123"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Ftattle.example%2Fcallback%3Fx%3D1"));
        assert!(url.contains("state=st%20ate"));
    }

    #[test]
    fn test_token_envelope_parsing() {
        let json = r#"{"code":0,"data":{"accessToken":"a","refreshToken":"r","expiresIn":7200}}"#;
        let envelope: Envelope<TokenData> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.code, 0);
        let token = envelope.data.unwrap();
        assert_eq!(token.access_token, "a");
        assert_eq!(token.expires_in, 7200);
    }

    #[test]
    fn test_user_envelope_parsing() {
        let json = r#"{"code":0,"data":{"route":"u-1","name":"Alice","avatarUrl":"http://img","email":"a@b.c"}}"#;
        let envelope: Envelope<UserData> = serde_json::from_str(json).unwrap();
        let user = envelope.data.unwrap();
        assert_eq!(user.route.as_deref(), Some("u-1"));
        assert_eq!(user.avatar_url.as_deref(), Some("http://img"));
    }
}
