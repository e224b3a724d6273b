//! Refreshing credential source.
//!
//! Implements [`CredentialSource`] over the profile store plus the OAuth
//! client. A credential expiring within the 5-minute horizon is refreshed
//! before use and the new pair is persisted (last-writer-wins; concurrent
//! duplicate refreshes are not guarded against at expected call volume).
//! Any failure degrades to `None` -- callers treat a missing credential as
//! a skip condition, never as a request failure.

use chrono::{Duration, Utc};

use tattle_core::gateway::CredentialSource;
use tattle_core::repository::profile::ProfileRepository;
use tattle_types::credential::Credential;
use tattle_types::profile::ProfileId;

use crate::gateway::OAuthClient;

/// Credential source backed by the profile store and the OAuth refresh
/// endpoint.
pub struct RefreshingCredentialSource<P: ProfileRepository> {
    profiles: P,
    oauth: OAuthClient,
}

impl<P: ProfileRepository> RefreshingCredentialSource<P> {
    pub fn new(profiles: P, oauth: OAuthClient) -> Self {
        Self { profiles, oauth }
    }

    /// Refresh a stale credential and persist the new pair. `None` when
    /// there is no refresh token or the provider rejects the refresh.
    async fn refresh_and_store(
        &self,
        profile_id: &ProfileId,
        credential: &Credential,
    ) -> Option<Credential> {
        let refresh_token = credential.refresh_token.as_ref()?;

        let token = match self.oauth.refresh(refresh_token).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(profile = %profile_id, error = %e, "token refresh failed");
                return None;
            }
        };

        let refreshed = Credential {
            access_token: token.access_token,
            refresh_token: Some(token.refresh_token),
            expires_at: Some(Utc::now() + Duration::seconds(token.expires_in_secs)),
        };

        if let Err(e) = self.profiles.save_credential(profile_id, &refreshed).await {
            tracing::warn!(profile = %profile_id, error = %e, "refreshed credential not persisted");
        }

        Some(refreshed)
    }

    async fn resolve(&self, profile_id: &ProfileId, credential: Credential) -> Option<Credential> {
        if credential.is_stale_at(Utc::now()) {
            self.refresh_and_store(profile_id, &credential).await
        } else {
            Some(credential)
        }
    }
}

impl<P: ProfileRepository> CredentialSource for RefreshingCredentialSource<P> {
    async fn for_profile(&self, profile_id: &ProfileId) -> Option<Credential> {
        let credential = match self.profiles.get_credential(profile_id).await {
            Ok(Some(credential)) => credential,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(profile = %profile_id, error = %e, "credential load failed");
                return None;
            }
        };

        self.resolve(profile_id, credential).await
    }

    async fn any_valid(&self) -> Option<Credential> {
        // Prefer a credential that needs no work.
        match self.profiles.latest_with_valid_credential(Utc::now()).await {
            Ok(Some((profile_id, credential))) => {
                return self.resolve(&profile_id, credential).await;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "credential scan failed");
                return None;
            }
        }

        // Otherwise try to revive the most recently updated stored pair.
        match self.profiles.latest_with_credential().await {
            Ok(Some((profile_id, credential))) => {
                self.refresh_and_store(&profile_id, &credential).await
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "credential scan failed");
                None
            }
        }
    }
}
