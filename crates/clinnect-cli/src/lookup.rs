//! Search, route and geocode commands.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clinnect_core::{
    annotate_route, rank_by_distance, AggregatedProvider, AppConfig, Coordinate,
    ProviderDirectory, RoutingProvider, SearchSession, SearchStatus, SessionSettings,
    StaticDirectory, UpstreamError,
};
use clinnect_maps::{NominatimClient, OsrmClient};
use futures::future::{self, BoxFuture, FutureExt};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Router for sessions that only search; any route request is refused.
struct SearchOnly;

impl RoutingProvider for SearchOnly {
    fn route(
        &self,
        _origin: Coordinate,
        _destination: Coordinate,
    ) -> BoxFuture<'_, Result<Option<Vec<Coordinate>>, UpstreamError>> {
        future::ready(Err(UpstreamError::Unavailable(
            "routing is not available during search; use `route`".to_string(),
        )))
        .boxed()
    }
}

/// Search by insurance, either against the database or an offline providers file.
///
/// The offline mode reads no environment and uses default session settings.
pub(crate) async fn run_search(
    query: &str,
    origin: Option<Coordinate>,
    radius_km: Option<f64>,
    providers_file: Option<&Path>,
) -> anyhow::Result<()> {
    let (directory, base): (Arc<dyn ProviderDirectory>, _) = match providers_file {
        Some(path) => {
            let file = clinnect_core::load_providers_file(path)?;
            let directory = StaticDirectory::new(file.to_records());
            tracing::debug!(rows = directory.len(), path = %path.display(), "offline directory loaded");
            (Arc::new(directory), SessionSettings::default())
        }
        None => {
            let config = clinnect_core::load_app_config()?;
            let pool_config = clinnect_db::PoolConfig::from_app_config(&config);
            let pool = clinnect_db::connect_pool(&config.database_url, pool_config).await?;
            (
                Arc::new(clinnect_db::PgProviderDirectory::new(pool)),
                SessionSettings::from_app_config(&config),
            )
        }
    };

    let settings = match radius_km {
        Some(r) if !(r.is_finite() && r > 0.0) => {
            anyhow::bail!("--radius-km must be a positive number, got {r}")
        }
        Some(r) => SessionSettings {
            radius_km: r,
            ..base
        },
        None => base,
    };

    let mut session = SearchSession::new(directory, Arc::new(SearchOnly), settings);
    if let Some(origin) = origin {
        session.set_origin(origin);
    }

    match session.search(query).await {
        SearchStatus::Rejected => anyhow::bail!("query must not be blank"),
        SearchStatus::UpstreamUnavailable(reason) => {
            anyhow::bail!("provider lookup failed: {reason}")
        }
        SearchStatus::NoMatch => {
            println!("no providers accept insurance matching {query:?}");
            return Ok(());
        }
        SearchStatus::Found(0) => {
            println!(
                "providers accept {query:?}, but none within {} km",
                settings.radius_km
            );
            return Ok(());
        }
        SearchStatus::Idle | SearchStatus::Found(_) => {}
    }

    let results = &session.context().current_results;
    let rows: Vec<(AggregatedProvider, Option<f64>)> = match origin {
        Some(origin) => rank_by_distance(results, origin)
            .into_iter()
            .map(|(p, km)| (p, Some(km)))
            .collect(),
        None => results.iter().cloned().map(|p| (p, None)).collect(),
    };

    println!("{:<40}{:<10}{:>9}  INSURANCES", "NAME", "TYPE", "KM");
    for (provider, km) in &rows {
        let km = km.map_or_else(|| "-".to_string(), |d| format!("{d:.2}"));
        let insurances: Vec<&str> = provider.insurances.iter().map(String::as_str).collect();
        println!(
            "{:<40}{:<10}{:>9}  {}",
            provider.name,
            provider.kind.to_string(),
            km,
            insurances.join(", ")
        );
    }

    Ok(())
}

fn osrm_client(config: &AppConfig) -> anyhow::Result<OsrmClient> {
    Ok(OsrmClient::with_base_url(
        &config.osrm_base_url,
        config.upstream_timeout_secs,
        &config.user_agent,
    )?)
}

pub(crate) async fn run_route(
    config: &AppConfig,
    from: Coordinate,
    to: Coordinate,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    let router = osrm_client(config)?;
    let mut rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
    let limit = Duration::from_secs(config.upstream_timeout_secs);

    let route = annotate_route(&router, from, to, limit, &mut rng).await?;

    println!("{:<24}{:<24}{:>8}  CONGESTION", "FROM", "TO", "KM");
    for segment in route.segments() {
        println!(
            "{:<24}{:<24}{:>8.3}  {:?} ({})",
            segment.from.to_string(),
            segment.to.to_string(),
            segment.length_km(),
            segment.congestion,
            segment.congestion.color()
        );
    }
    println!(
        "{} segments, {:.2} km; congestion is simulated, not live traffic",
        route.segments().len(),
        route.total_km()
    );

    Ok(())
}

pub(crate) async fn run_geocode(config: &AppConfig, text: &str) -> anyhow::Result<()> {
    if text.trim().is_empty() {
        anyhow::bail!("geocode text must not be blank");
    }
    let client = NominatimClient::with_base_url(
        &config.nominatim_base_url,
        config.upstream_timeout_secs,
        &config.user_agent,
    )?;

    let places = client.search(text.trim()).await?;
    if places.is_empty() {
        println!("no places found for {text:?}");
        return Ok(());
    }
    for place in places {
        println!("{}  {}", place.coordinate, place.display_name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn search_only_router_refuses_routes() {
        let a = Coordinate::new(14.5995, 120.9842).unwrap();
        let b = Coordinate::new(14.6, 121.0).unwrap();
        let err = SearchOnly.route(a, b).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Unavailable(ref m) if m.contains("route")));
    }

    #[tokio::test]
    async fn offline_search_reads_the_providers_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
            .join("providers.yaml");
        let file = clinnect_core::load_providers_file(&path).unwrap();
        let mut session = SearchSession::new(
            Arc::new(StaticDirectory::new(file.to_records())),
            Arc::new(SearchOnly),
            SessionSettings::default(),
        );
        assert!(matches!(session.search("maxicare").await, SearchStatus::Found(n) if *n > 0));
    }
}
