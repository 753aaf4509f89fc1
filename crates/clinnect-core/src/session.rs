//! Search orchestration for one interactive session.
//!
//! A [`SearchSession`] owns the [`SearchContext`] and is the only thing that
//! mutates it. Lookups run in two phases so that a caller can keep several
//! requests in flight: `begin_*` records intent and hands out a ticket,
//! the ticket is resolved against the port without touching the session, and
//! `apply_*` folds the response back in. A response is applied only if it
//! still matches the session's latest intent (the last query, or the currently
//! selected provider); anything else is discarded as stale.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::aggregate::aggregate;
use crate::app_config::AppConfig;
use crate::error::{RouteError, UpstreamError};
use crate::geo::{Coordinate, DEFAULT_ORIGIN};
use crate::ports::{ProviderDirectory, RoutingProvider};
use crate::provider::{AggregatedProvider, ProviderKey, ProviderRecord, Site};
use crate::proximity::{filter_within_radius, DEFAULT_SEARCH_RADIUS_KM};
use crate::route::{annotate_path, fetch_geometry, AnnotatedRoute};

const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(8);

/// Outcome of the most recent search, for display to the user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchStatus {
    #[default]
    Idle,
    /// The query was blank; nothing was looked up.
    Rejected,
    /// The lookup matched and this many providers are in the results.
    Found(usize),
    /// The directory returned no rows for the query.
    NoMatch,
    UpstreamUnavailable(String),
}

/// Transient per-session state.
#[derive(Debug, Clone, Default)]
pub struct SearchContext {
    pub origin: Option<Coordinate>,
    pub last_query: String,
    pub current_results: Vec<AggregatedProvider>,
    pub selected_provider: Option<AggregatedProvider>,
    pub current_route: Option<AnnotatedRoute>,
    pub status: SearchStatus,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    pub lookup_timeout: Duration,
    pub radius_km: f64,
    pub default_origin: Coordinate,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            radius_km: DEFAULT_SEARCH_RADIUS_KM,
            default_origin: DEFAULT_ORIGIN,
        }
    }
}

impl SessionSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            lookup_timeout: Duration::from_secs(config.upstream_timeout_secs),
            radius_km: config.search_radius_km,
            default_origin: config.default_origin,
        }
    }
}

/// Whether a response was folded into the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Current,
    /// Superseded by a newer request; the context was left untouched.
    Stale,
}

/// A pending directory lookup for one query.
#[derive(Debug, Clone)]
pub struct SearchTicket {
    query: String,
}

impl SearchTicket {
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Run the lookup, bounded by `limit`. Expiry becomes
    /// [`UpstreamError::Timeout`].
    pub async fn resolve(self, directory: &dyn ProviderDirectory, limit: Duration) -> SearchResponse {
        let result = tokio::time::timeout(limit, directory.find_providers_by_insurance(&self.query))
            .await
            .unwrap_or(Err(UpstreamError::Timeout(limit)));
        SearchResponse {
            query: self.query,
            result,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub query: String,
    pub result: Result<Vec<ProviderRecord>, UpstreamError>,
}

/// A pending geometry lookup toward one selected provider.
#[derive(Debug, Clone)]
pub struct RouteTicket {
    destination: ProviderKey,
    from: Coordinate,
    to: Coordinate,
}

impl RouteTicket {
    #[must_use]
    pub fn destination(&self) -> &ProviderKey {
        &self.destination
    }

    pub async fn resolve(self, router: &dyn RoutingProvider, limit: Duration) -> RouteResponse {
        let result = fetch_geometry(router, self.from, self.to, limit).await;
        RouteResponse {
            destination: self.destination,
            result,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouteResponse {
    pub destination: ProviderKey,
    pub result: Result<Vec<Coordinate>, RouteError>,
}

pub struct SearchSession {
    context: SearchContext,
    directory: Arc<dyn ProviderDirectory>,
    router: Arc<dyn RoutingProvider>,
    rng: StdRng,
    settings: SessionSettings,
}

impl SearchSession {
    /// Session with an OS-seeded congestion source.
    #[must_use]
    pub fn new(
        directory: Arc<dyn ProviderDirectory>,
        router: Arc<dyn RoutingProvider>,
        settings: SessionSettings,
    ) -> Self {
        Self::with_rng(directory, router, settings, StdRng::from_os_rng())
    }

    /// Session whose congestion labels are reproducible for a given seed.
    #[must_use]
    pub fn with_seed(
        directory: Arc<dyn ProviderDirectory>,
        router: Arc<dyn RoutingProvider>,
        settings: SessionSettings,
        seed: u64,
    ) -> Self {
        Self::with_rng(directory, router, settings, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        directory: Arc<dyn ProviderDirectory>,
        router: Arc<dyn RoutingProvider>,
        settings: SessionSettings,
        rng: StdRng,
    ) -> Self {
        Self {
            context: SearchContext::default(),
            directory,
            router,
            rng,
            settings,
        }
    }

    #[must_use]
    pub fn context(&self) -> &SearchContext {
        &self.context
    }

    #[must_use]
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn set_origin(&mut self, origin: Coordinate) {
        self.context.origin = Some(origin);
    }

    /// Resolve the session origin from a one-shot position fix.
    ///
    /// If the fix fails, is denied, or does not arrive within the lookup
    /// timeout, the configured default origin is used instead.
    pub async fn acquire_origin<F, E>(&mut self, fix: F) -> Coordinate
    where
        F: Future<Output = Result<Coordinate, E>>,
        E: std::fmt::Display,
    {
        let origin = match tokio::time::timeout(self.settings.lookup_timeout, fix).await {
            Ok(Ok(position)) => position,
            Ok(Err(e)) => {
                tracing::info!(error = %e, fallback = %self.settings.default_origin, "position unavailable; using default origin");
                self.settings.default_origin
            }
            Err(_) => {
                tracing::info!(fallback = %self.settings.default_origin, "position fix timed out; using default origin");
                self.settings.default_origin
            }
        };
        self.context.origin = Some(origin);
        origin
    }

    /// Record a new query. Returns `None` (status `Rejected`) for blank input.
    pub fn begin_search(&mut self, query: &str) -> Option<SearchTicket> {
        self.context.last_query = query.to_string();

        if query.trim().is_empty() {
            self.context.status = SearchStatus::Rejected;
            return None;
        }

        Some(SearchTicket {
            query: query.to_string(),
        })
    }

    /// Fold a directory response into the context if it answers the latest query.
    pub fn apply_search(&mut self, response: SearchResponse) -> Applied {
        if response.query != self.context.last_query {
            tracing::debug!(
                stale = %response.query,
                current = %self.context.last_query,
                "discarding superseded search response"
            );
            return Applied::Stale;
        }

        let rows = match response.result {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(query = %response.query, error = %e, "provider lookup failed");
                self.context.current_results.clear();
                self.context.status = SearchStatus::UpstreamUnavailable(e.to_string());
                return Applied::Current;
            }
        };

        if rows.is_empty() {
            tracing::info!(query = %response.query, "no providers accept this insurance");
            self.context.current_results.clear();
            self.context.status = SearchStatus::NoMatch;
            return Applied::Current;
        }

        let providers = aggregate(&rows);
        let results = match self.context.origin {
            Some(origin) => filter_within_radius(&providers, origin, self.settings.radius_km),
            None => providers,
        };

        let selection_survives = self
            .context
            .selected_provider
            .as_ref()
            .is_none_or(|selected| {
                let key = selected.key();
                results.iter().any(|p| p.key() == key)
            });
        if !selection_survives {
            self.context.selected_provider = None;
            self.context.current_route = None;
        }

        tracing::info!(
            query = %response.query,
            rows = rows.len(),
            results = results.len(),
            filtered = self.context.origin.is_some(),
            "search applied"
        );
        self.context.status = SearchStatus::Found(results.len());
        self.context.current_results = results;
        Applied::Current
    }

    /// Look up `query` and apply the result.
    pub async fn search(&mut self, query: &str) -> &SearchStatus {
        if let Some(ticket) = self.begin_search(query) {
            let directory = Arc::clone(&self.directory);
            let response = ticket
                .resolve(directory.as_ref(), self.settings.lookup_timeout)
                .await;
            self.apply_search(response);
        }
        &self.context.status
    }

    /// Select `provider` and, when a route can be computed, return a ticket for it.
    ///
    /// Any route to a previously selected provider is dropped immediately.
    /// Without a known origin, or if the provider cannot be located, no ticket
    /// is issued and `current_route` stays empty.
    pub fn begin_route(&mut self, provider: AggregatedProvider) -> Option<RouteTicket> {
        let destination = provider.key();
        let target = provider.coordinate();
        self.context.selected_provider = Some(provider);
        self.context.current_route = None;

        let from = self.context.origin?;
        match target {
            Ok(to) => Some(RouteTicket {
                destination,
                from,
                to,
            }),
            Err(e) => {
                tracing::debug!(error = %e, "selected provider has no usable position");
                None
            }
        }
    }

    /// Fold a routing response into the context if it is for the current selection.
    pub fn apply_route(&mut self, response: RouteResponse) -> Applied {
        let is_current = self
            .context
            .selected_provider
            .as_ref()
            .is_some_and(|p| p.key() == response.destination);
        if !is_current {
            tracing::debug!(stale = %response.destination, "discarding superseded route response");
            return Applied::Stale;
        }

        match response.result {
            Ok(points) => {
                let route = annotate_path(&points, &mut self.rng);
                tracing::info!(
                    destination = %response.destination,
                    segments = route.segments().len(),
                    "route annotated"
                );
                self.context.current_route = Some(route);
            }
            Err(e) => {
                tracing::warn!(destination = %response.destination, error = %e, "route unavailable");
                self.context.current_route = None;
            }
        }
        Applied::Current
    }

    /// Select `provider` and route to it when the origin is known.
    pub async fn select_provider(&mut self, provider: AggregatedProvider) -> Option<&AnnotatedRoute> {
        if let Some(ticket) = self.begin_route(provider) {
            let router = Arc::clone(&self.router);
            let response = ticket
                .resolve(router.as_ref(), self.settings.lookup_timeout)
                .await;
            self.apply_route(response);
        }
        self.context.current_route.as_ref()
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
