use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::MapsError;

/// Build the shared `reqwest` client used by both services.
pub(crate) fn build_client(timeout_secs: u64, user_agent: &str) -> Result<Client, MapsError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

/// Parse a base URL, normalised to end with exactly one slash so that
/// relative joins append to it rather than replacing its last segment.
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, MapsError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|e| MapsError::InvalidBaseUrl(format!("'{base_url}': {e}")))
}

/// Join `path` onto a normalised base URL.
pub(crate) fn join(base: &Url, path: &str) -> Result<Url, MapsError> {
    base.join(path)
        .map_err(|e| MapsError::InvalidBaseUrl(format!("cannot join '{path}' onto '{base}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_single_trailing_slash() {
        assert_eq!(
            parse_base_url("https://router.project-osrm.org").unwrap().as_str(),
            "https://router.project-osrm.org/"
        );
        assert_eq!(
            parse_base_url("https://example.test/osrm//").unwrap().as_str(),
            "https://example.test/osrm/"
        );
    }

    #[test]
    fn join_keeps_base_path() {
        let base = parse_base_url("https://example.test/osrm").unwrap();
        let url = join(&base, "route/v1/driving/1,2;3,4").unwrap();
        assert_eq!(url.as_str(), "https://example.test/osrm/route/v1/driving/1,2;3,4");
    }

    #[test]
    fn garbage_base_url_is_rejected() {
        assert!(matches!(
            parse_base_url("not a url"),
            Err(MapsError::InvalidBaseUrl(_))
        ));
    }
}
