//! Interaction repository trait definition.

use tattle_types::error::RepositoryError;
use tattle_types::interaction::Interaction;

/// Repository trait for the append-only interaction audit log. Write-only
/// from the pipeline's perspective.
pub trait InteractionRepository: Send + Sync {
    fn record(
        &self,
        interaction: &Interaction,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
