//! HTTP client for the route computation backend.

use crate::error::TransportError;
use crate::model::{Endpoint, Fragment, SessionConfig};
use crate::query::RouteQuery;
use reqwest::{Client, ClientBuilder, StatusCode, Url};

#[derive(Debug, Clone)]
pub struct RouteClient {
    http: Client,
    base_url: Url,
}

impl RouteClient {
    pub fn new(cfg: &SessionConfig) -> Result<Self, TransportError> {
        let base_url = Url::parse(&cfg.base_url)
            .map_err(|e| TransportError::InvalidBaseUrl(format!("{}: {e}", cfg.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(TransportError::InvalidBaseUrl(cfg.base_url.clone()));
        }

        let mut builder = ClientBuilder::new().user_agent(cfg.user_agent.clone());
        if let Some(timeout) = cfg.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full URL for an endpoint, with the route query attached as-is.
    pub fn url_for(&self, endpoint: Endpoint, query: Option<&RouteQuery>) -> Url {
        let mut url = self.base_url.clone();
        let base_path = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{base_path}{}", endpoint.path()));
        url.set_query(query.map(RouteQuery::to_query_string).as_deref());
        url
    }

    /// Issue one GET. Only a 200 response counts as a fragment.
    pub async fn fetch(
        &self,
        endpoint: Endpoint,
        query: Option<&RouteQuery>,
    ) -> Result<Fragment, TransportError> {
        let url = self.url_for(endpoint, query);
        tracing::debug!(%url, "GET");

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if status != StatusCode::OK {
            tracing::warn!(%endpoint, %status, "backend returned non-200");
            return Err(TransportError::Status { endpoint, status });
        }

        let body = resp.text().await?;
        tracing::debug!(%endpoint, bytes = body.len(), "fragment received");
        Ok(Fragment::new(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Mode, RunParameters};
    use crate::stops::StopPairStore;

    fn client(base: &str) -> RouteClient {
        RouteClient::new(&SessionConfig {
            base_url: base.into(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn stops_url_has_no_query() {
        let url = client("http://localhost:5000").url_for(Endpoint::Stops, None);
        assert_eq!(url.as_str(), "http://localhost:5000/generate_stops");
    }

    #[test]
    fn routes_url_keeps_the_encoded_query() {
        let store = StopPairStore::from_pairs([("A&B", "C")]);
        let params = RunParameters {
            ant_count: "10".into(),
            iteration_count: "5".into(),
            mode: Mode::from("fastest"),
        };
        let q = RouteQuery::build(store.pairs(), Some(&params));
        let url = client("http://localhost:5000/").url_for(Endpoint::Routes, Some(&q));
        assert_eq!(
            url.as_str(),
            "http://localhost:5000/generate_routes?start_node=A%26B&end_node=C&num_ants=10&num_iterations=5&mode=fastest"
        );
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let url = client("http://example.test/planner/").url_for(Endpoint::Stops, None);
        assert_eq!(url.as_str(), "http://example.test/planner/generate_stops");
    }

    #[test]
    fn rejects_bad_base_url() {
        let err = RouteClient::new(&SessionConfig {
            base_url: "not a url".into(),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, TransportError::InvalidBaseUrl(_)));
    }
}
