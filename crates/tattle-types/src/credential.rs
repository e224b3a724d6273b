use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;

/// An access token (plus refresh token and expiry) permitting generation
/// calls on behalf of a profile's actor.
///
/// Tokens are wrapped in [`SecretString`] so they never appear in Debug
/// output or tracing logs. Seeded demo profiles carry no credential and
/// rely on the "borrowed voice" fallback during rounds.
#[derive(Debug, Clone)]
pub struct Credential {
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// Refresh horizon: a credential expiring within this window is treated
    /// as stale and refreshed before use.
    pub const REFRESH_HORIZON_SECS: i64 = 5 * 60;

    /// True when the credential expires within the refresh horizon of `now`
    /// (or already has). A credential with no recorded expiry never reports
    /// stale.
    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expiry) => expiry < now + Duration::seconds(Self::REFRESH_HORIZON_SECS),
            None => false,
        }
    }

    /// True when the credential is usable at `now` without a refresh.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expiry) => expiry > now,
            None => true,
        }
    }
}

/// Token triple returned by the provider's refresh and code-exchange
/// endpoints. The old refresh token is invalidated by a successful refresh.
#[derive(Debug, Clone)]
pub struct TokenResponse {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    pub expires_in_secs: i64,
}
