//! Challenge server client
//!
//! Fetches the problem and submits the solution. Both calls are single
//! attempts with a fixed timeout; any failure is returned to the caller.

use crate::{Error, Problem, Result, Solution};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Challenge client configuration
#[derive(Clone)]
pub struct ClientConfig {
    /// Server base URL, ending in `/`
    pub base_url: Url,
    /// Challenge name, e.g. `mini_miner`
    pub challenge: String,
    /// Access token sent as the `access_token` query parameter
    pub token: String,
    /// Connect and response timeout for each request
    pub timeout: Duration,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("challenge", &self.challenge)
            .field("token", &crate::utils::redact(&self.token))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Response from the solve endpoint, passed through uninterpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw response body
    pub body: String,
}

impl SubmitResponse {
    /// The body as JSON, if it is JSON
    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Client for the problem and solve endpoints of one challenge
pub struct ChallengeClient {
    client: Client,
    config: ClientConfig,
}

impl ChallengeClient {
    /// Create a new challenge client
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::APP_VERSION))
            .build()
            .map_err(scrub)?;

        Ok(Self { client, config })
    }

    /// The configuration in use
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build `{base}/challenges/{challenge}/{action}?access_token=...`
    fn endpoint(&self, action: &str) -> Result<Url> {
        let mut url = self
            .config
            .base_url
            .join(&format!("challenges/{}/{}", self.config.challenge, action))
            .map_err(|e| Error::transport(format!("Failed to build {} URL: {}", action, e)))?;

        url.query_pairs_mut()
            .append_pair("access_token", &self.config.token);

        Ok(url)
    }

    /// Fetch the problem to solve
    #[instrument(skip(self), fields(challenge = %self.config.challenge))]
    pub async fn fetch_problem(&self) -> Result<Problem> {
        let url = self.endpoint("problem")?;
        debug!(path = url.path(), "Fetching problem");

        let response = self.client.get(url).send().await.map_err(scrub)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::transport(format!(
                "Problem request failed: HTTP {}: {}",
                status,
                body.trim()
            )));
        }

        let body = response.bytes().await.map_err(scrub)?;
        let problem: Problem = serde_json::from_slice(&body)
            .map_err(|e| Error::decoding(format!("Invalid problem body: {}", e)))?;

        info!(
            difficulty = problem.difficulty,
            records = problem.block.data.len(),
            "Got problem"
        );
        debug!(problem = ?problem, "Problem details");

        Ok(problem)
    }

    /// Submit a solution as `{"nonce": <int>}`
    #[instrument(skip(self), fields(challenge = %self.config.challenge, nonce = %solution.nonce))]
    pub async fn submit_solution(&self, solution: &Solution) -> Result<SubmitResponse> {
        let url = self.endpoint("solve")?;
        debug!(path = url.path(), "Submitting solution");

        let response = self
            .client
            .post(url)
            .json(solution)
            .send()
            .await
            .map_err(scrub)?;

        let status = response.status();
        let body = response.text().await.map_err(scrub)?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Solve request failed");
            return Err(Error::transport(format!(
                "Solve request failed: HTTP {}: {}",
                status,
                body.trim()
            )));
        }

        info!(status = status.as_u16(), "Submitted solution");

        Ok(SubmitResponse {
            status: status.as_u16(),
            body,
        })
    }
}

/// Drop the request URL from a `reqwest` error, it carries the token
fn scrub(err: reqwest::Error) -> Error {
    Error::Http(err.without_url())
}
