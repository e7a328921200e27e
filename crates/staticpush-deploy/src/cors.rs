use staticpush_core::CorsPolicy;
use staticpush_storage::Storage;

use crate::error::DeployError;

/// Read the current CORS policy, transform it with `f` and persist the result.
///
/// `None` from `f` persists an empty policy. Returns what was persisted.
pub async fn alter_cors<F>(storage: &dyn Storage, f: F) -> Result<CorsPolicy, DeployError>
where
    F: FnOnce(CorsPolicy) -> Option<CorsPolicy>,
{
    let current = storage.cors_policy().await?;
    let updated = f(current).unwrap_or_default();

    storage.set_cors_policy(&updated).await?;

    tracing::info!(
        container = %storage.container(),
        rule_count = updated.rules.len(),
        "CORS policy updated"
    );

    Ok(updated)
}

/// Replace all rules with a single rule allowing `GET` from any origin.
pub async fn set_wildcard_cors(storage: &dyn Storage) -> Result<CorsPolicy, DeployError> {
    alter_cors(storage, |_| Some(CorsPolicy::wildcard_get())).await
}
