//! Package registry lookup trait.

use curator_types::error::LookupError;
use curator_types::resolution::ResolutionResult;

/// Read-only, idempotent access to the package registry.
///
/// `Err` is reserved for transport failures; a package that does not exist
/// is `Ok(ResolutionResult::NotFound)`.
pub trait RegistryLookup: Send + Sync {
    /// Resolve `package_id` at `version` (a semver range or `latest`).
    fn lookup(
        &self,
        package_id: &str,
        version: &str,
    ) -> impl std::future::Future<Output = Result<ResolutionResult, LookupError>> + Send;
}
