//! HTTP client for the fare-search provider.

use super::types::{FareError, FareRequest};
use log::debug;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/qpxExpress/v1/trips/search";

const USER_AGENT: &str = concat!("FareScout/", env!("CARGO_PKG_VERSION"));

/// Anything that can answer a fare search with the provider's raw JSON body.
pub trait FareSearch {
    fn search(&self, request: &FareRequest) -> Result<String, FareError>;
}

/// QPX Express style `trips/search` endpoint, keyed by query parameter.
pub struct QpxClient {
    endpoint: String,
    api_key: String,
    agent: ureq::Agent,
}

impl QpxClient {
    pub fn new(endpoint: &str, api_key: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(60))
            .user_agent(USER_AGENT)
            .build();
        Self {
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            agent,
        }
    }
}

impl FareSearch for QpxClient {
    fn search(&self, request: &FareRequest) -> Result<String, FareError> {
        debug!("POST {} ({} slices)", self.endpoint, request.request.slice.len());

        let response = self
            .agent
            .post(&self.endpoint)
            .query("key", &self.api_key)
            .send_json(request);

        match response {
            Ok(resp) => resp
                .into_string()
                .map_err(|e| FareError::InvalidResponse(e.to_string())),
            Err(ureq::Error::Status(status, resp)) => Err(FareError::Http {
                status,
                body: resp.into_string().unwrap_or_default(),
            }),
            Err(e) => Err(FareError::Network(e.to_string())),
        }
    }
}
