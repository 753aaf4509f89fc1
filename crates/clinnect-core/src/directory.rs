//! In-memory provider directory, used for offline search and in tests.

use futures::future::{self, BoxFuture, FutureExt};

use crate::error::UpstreamError;
use crate::ports::ProviderDirectory;
use crate::provider::ProviderRecord;

/// Holds `(provider, insurance)` rows and answers the directory read contract
/// with the same case-insensitive substring match as the database.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    records: Vec<ProviderRecord>,
}

impl StaticDirectory {
    #[must_use]
    pub fn new(records: Vec<ProviderRecord>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn matching(&self, substr: &str) -> Vec<ProviderRecord> {
        let needle = substr.to_lowercase();
        self.records
            .iter()
            .filter(|r| {
                r.insurance_name
                    .as_deref()
                    .is_some_and(|name| name.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect()
    }
}

impl ProviderDirectory for StaticDirectory {
    fn find_providers_by_insurance<'a>(
        &'a self,
        substr: &'a str,
    ) -> BoxFuture<'a, Result<Vec<ProviderRecord>, UpstreamError>> {
        future::ready(Ok(self.matching(substr))).boxed()
    }
}
