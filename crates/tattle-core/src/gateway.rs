//! Model gateway and credential source trait definitions.
//!
//! These are the core abstractions over the external conversational-AI
//! endpoint and the OAuth credential store. Uses RPITIT (Rust 2024
//! edition); implementations live in tattle-infra.

use tattle_types::credential::Credential;
use tattle_types::gateway::{GatewayError, GenerateOptions, Generation};
use tattle_types::profile::ProfileId;

/// Trait for the external generation endpoint.
///
/// The real implementation consumes an incremental SSE stream and
/// concatenates text deltas; callers only see the final joined text.
pub trait ModelGateway: Send + Sync {
    /// Ask for one generation. Fails with a transport-kind error on any
    /// non-success response.
    fn generate(
        &self,
        credential: &Credential,
        prompt: &str,
        options: &GenerateOptions,
    ) -> impl std::future::Future<Output = Result<Generation, GatewayError>> + Send;
}

/// Capability lookup for generation credentials.
pub trait CredentialSource: Send + Sync {
    /// A usable credential for a specific profile, refreshing a stale one
    /// behind the scenes. `None` when the profile has no credential or the
    /// refresh fails.
    fn for_profile(
        &self,
        profile_id: &ProfileId,
    ) -> impl std::future::Future<Output = Option<Credential>> + Send;

    /// Any currently-valid credential from any profile, preferring the
    /// most recently updated. `None` when nobody is signed in.
    fn any_valid(&self) -> impl std::future::Future<Output = Option<Credential>> + Send;
}

// Forwarding impls so one gateway / credential source instance can be
// shared (behind Arc) across the round engine, miner, and publisher.

impl<T: ModelGateway> ModelGateway for std::sync::Arc<T> {
    fn generate(
        &self,
        credential: &Credential,
        prompt: &str,
        options: &GenerateOptions,
    ) -> impl std::future::Future<Output = Result<Generation, GatewayError>> + Send {
        (**self).generate(credential, prompt, options)
    }
}

impl<T: CredentialSource> CredentialSource for std::sync::Arc<T> {
    fn for_profile(
        &self,
        profile_id: &ProfileId,
    ) -> impl std::future::Future<Output = Option<Credential>> + Send {
        (**self).for_profile(profile_id)
    }

    fn any_valid(&self) -> impl std::future::Future<Output = Option<Credential>> + Send {
        (**self).any_valid()
    }
}
