// src/fetch/mod.rs
mod profiles;
mod retry;

pub use profiles::{ProfileKind, RequestProfile};
pub use retry::RetryPolicy;

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::header::USER_AGENT;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::error::{NetworkError, SiteguardError, SiteguardResult};

/// Outcome of a successful fetch.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub url: String,
    /// URL after redirects.
    pub final_url: String,
    pub status_code: u16,
    /// Response headers in wire order; repeated names (Set-Cookie) keep
    /// one entry per value.
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub elapsed: Duration,
    /// Which tier of the evasion ladder produced this response.
    pub method_used: ProfileKind,
    /// Recorded transport-level warning, if the winning tier still saw
    /// retries along the way.
    pub error: Option<String>,
}

/// HTTP fetcher that walks the evasion ladder: an ordered list of request
/// profiles tried until one yields HTTP 200.
pub struct Fetcher {
    clients: Vec<(ProfileKind, Client)>,
    retry_policy: RetryPolicy,
    timeout: Duration,
}

impl Fetcher {
    /// Build one client per ladder tier so connections are reused across
    /// requests within a tier.
    pub fn new(timeout: Duration, verify_tls: bool) -> SiteguardResult<Self> {
        Self::with_retry_policy(timeout, verify_tls, RetryPolicy::default())
    }

    pub fn with_retry_policy(
        timeout: Duration,
        verify_tls: bool,
        retry_policy: RetryPolicy,
    ) -> SiteguardResult<Self> {
        let mut clients = Vec::with_capacity(ProfileKind::LADDER.len());
        for kind in ProfileKind::LADDER {
            let profile = RequestProfile::build(kind);
            let client = Client::builder()
                .timeout(timeout + profile.extra_timeout)
                .default_headers(profile.headers.clone())
                .redirect(reqwest::redirect::Policy::limited(10))
                .gzip(true)
                .cookie_store(true)
                .danger_accept_invalid_certs(!verify_tls)
                .build()
                .context("Failed to build HTTP client")
                .map_err(SiteguardError::from)?;
            clients.push((kind, client));
        }
        Ok(Self {
            clients,
            retry_policy,
            timeout,
        })
    }

    /// Per-request timeout this fetcher was configured with.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch a URL, advancing through the ladder until a tier returns
    /// HTTP 200. Returns a structured error once every tier is exhausted.
    pub async fn fetch(&self, url: &str) -> SiteguardResult<FetchResult> {
        let mut last_error = NetworkError::Other("no request attempted".to_string());
        let mut saw_retries = false;

        for (kind, client) in &self.clients {
            let profile = RequestProfile::build(*kind);
            if !profile.pre_request_delay.is_zero() {
                tokio::time::sleep(profile.pre_request_delay).await;
            }

            match self
                .fetch_with_profile(client, &profile, url, &mut saw_retries)
                .await
            {
                Ok(result) => {
                    debug!("Fetched {} via {} profile", url, kind.as_str());
                    return Ok(result);
                }
                Err(ProfileFailure::Advance(err)) => {
                    debug!(
                        "Profile {} failed for {} ({}), advancing ladder",
                        kind.as_str(),
                        url,
                        err
                    );
                    last_error = err;
                }
                Err(ProfileFailure::Terminal(status)) => {
                    warn!("Terminal HTTP {} for {}", status, url);
                    return Err(SiteguardError::Http {
                        status,
                        url: url.to_string(),
                    });
                }
            }
        }

        warn!("All request profiles exhausted for {}", url);
        Err(SiteguardError::Network(last_error))
    }

    /// Run one ladder tier with its retry policy. A 403 or transport
    /// failure advances the ladder; a definitive client error (404 and
    /// friends) is terminal.
    async fn fetch_with_profile(
        &self,
        client: &Client,
        profile: &RequestProfile,
        url: &str,
        saw_retries: &mut bool,
    ) -> std::result::Result<FetchResult, ProfileFailure> {
        let mut last_error = NetworkError::Other("no attempt made".to_string());

        for attempt in 0..self.retry_policy.max_attempts {
            if attempt > 0 {
                *saw_retries = true;
                tokio::time::sleep(self.retry_policy.backoff(attempt - 1)).await;
            }

            let start = Instant::now();
            let response = client
                .get(url)
                .header(USER_AGENT, &profile.user_agent)
                .send()
                .await;

            match response {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::OK {
                        return self
                            .build_result(response, url, profile.kind, start, *saw_retries)
                            .await
                            .map_err(|e| ProfileFailure::Advance(e));
                    }
                    if status == StatusCode::FORBIDDEN {
                        // Likely bot detection; a different identity may pass.
                        return Err(ProfileFailure::Advance(NetworkError::Forbidden));
                    }
                    if self.retry_policy.is_retryable_status(status.as_u16()) {
                        debug!(
                            "Retryable status {} for {} (attempt {})",
                            status,
                            url,
                            attempt + 1
                        );
                        last_error =
                            NetworkError::Other(format!("server returned {}", status));
                        continue;
                    }
                    return Err(ProfileFailure::Terminal(status.as_u16()));
                }
                Err(err) => {
                    last_error = NetworkError::classify(&err);
                    if matches!(last_error, NetworkError::Tls) {
                        // Retrying will not fix a certificate failure.
                        return Err(ProfileFailure::Advance(last_error));
                    }
                    debug!(
                        "Transport failure for {} (attempt {}): {}",
                        url,
                        attempt + 1,
                        last_error
                    );
                }
            }
        }

        Err(ProfileFailure::Advance(last_error))
    }

    async fn build_result(
        &self,
        response: reqwest::Response,
        url: &str,
        kind: ProfileKind,
        start: Instant,
        saw_retries: bool,
    ) -> std::result::Result<FetchResult, NetworkError> {
        let final_url = response.url().to_string();
        let status_code = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| NetworkError::classify(&e))?;
        Ok(FetchResult {
            url: url.to_string(),
            final_url,
            status_code,
            headers,
            body,
            elapsed: start.elapsed(),
            method_used: kind,
            error: saw_retries.then(|| "succeeded after retries".to_string()),
        })
    }
}

enum ProfileFailure {
    /// Try the next ladder tier.
    Advance(NetworkError),
    /// Definitive response; no tier will change it.
    Terminal(u16),
}

/// Build a plain probe client: no ladder, no cookie jar, bounded
/// redirects. Used by the vulnerability scanner where the raw status
/// code of every response matters.
pub fn probe_client(timeout: Duration, verify_tls: bool) -> Result<Client> {
    let profile = RequestProfile::build(ProfileKind::Baseline);
    Client::builder()
        .timeout(timeout)
        .user_agent(profile.user_agent)
        .redirect(reqwest::redirect::Policy::limited(3))
        .gzip(true)
        .danger_accept_invalid_certs(!verify_tls)
        .build()
        .context("Failed to build probe client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetcher_builds_one_client_per_tier() {
        let fetcher = Fetcher::new(Duration::from_secs(5), true).unwrap();
        assert_eq!(fetcher.clients.len(), ProfileKind::LADDER.len());
        let kinds: Vec<ProfileKind> = fetcher.clients.iter().map(|(k, _)| *k).collect();
        assert_eq!(kinds, ProfileKind::LADDER.to_vec());
    }

    #[test]
    fn insecure_mode_is_constructible() {
        // verify_tls=false is the explicit opt-out path.
        assert!(Fetcher::new(Duration::from_secs(5), false).is_ok());
    }

    #[test]
    fn probe_client_builds() {
        assert!(probe_client(Duration::from_secs(5), true).is_ok());
    }
}
