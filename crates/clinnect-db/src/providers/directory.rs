use clinnect_core::{ProviderDirectory, ProviderRecord, UpstreamError};
use futures::future::{BoxFuture, FutureExt};
use sqlx::PgPool;

use super::read::find_providers_by_insurance;

/// Postgres-backed directory port.
#[derive(Debug, Clone)]
pub struct PgProviderDirectory {
    pool: PgPool,
}

impl PgProviderDirectory {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl ProviderDirectory for PgProviderDirectory {
    fn find_providers_by_insurance<'a>(
        &'a self,
        substr: &'a str,
    ) -> BoxFuture<'a, Result<Vec<ProviderRecord>, UpstreamError>> {
        async move {
            find_providers_by_insurance(&self.pool, substr)
                .await
                .map_err(|e| UpstreamError::Unavailable(e.to_string()))
        }
        .boxed()
    }
}
