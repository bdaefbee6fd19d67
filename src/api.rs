use std::thread;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use serde::{Deserialize, Serialize};

use crate::domain::{FormatTag, RawExport};
use crate::error::QpcrError;
use crate::experiment::ExperimentResults;

pub const DEFAULT_BASE_URL: &str = "http://api.qpcrbox.com";

/// Body of a successful (201) submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReceipt {
    #[serde(rename = "ExperimentId")]
    pub experiment_id: String,
    #[serde(rename = "ExpiresAt", default)]
    pub expires_at: Option<String>,
}

/// Consumer-facing rate-limit status from `GET /v1/rate-limit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitStatus {
    #[serde(rename = "Exceeded")]
    pub exceeded: bool,
    #[serde(rename = "Limit", default)]
    pub limit: u32,
    #[serde(rename = "Current", default)]
    pub current: u32,
    #[serde(rename = "RetryAfter", default)]
    pub retry_after: Option<String>,
}

/// Seam for the remote quantification service.
pub trait QpcrApi: Send + Sync {
    fn submit_experiment(
        &self,
        tag: FormatTag,
        raw: &RawExport,
        reference: &str,
    ) -> Result<SubmitReceipt, QpcrError>;

    fn fetch_results(&self, experiment_id: &str) -> Result<ExperimentResults, QpcrError>;

    fn rate_limit(&self) -> Result<RateLimitStatus, QpcrError>;
}

#[derive(Clone)]
pub struct QpcrHttpClient {
    client: Client,
    base_url: String,
}

impl QpcrHttpClient {
    pub fn new(base_url: Option<String>, consumer_token: Option<String>) -> Result<Self, QpcrError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("qpcrbox/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| QpcrError::ApiHttp(err.to_string()))?,
        );
        if let Some(token) = consumer_token {
            if !token.trim().is_empty() {
                headers.insert(
                    "Consumer-Token",
                    HeaderValue::from_str(token.trim())
                        .map_err(|err| QpcrError::ApiHttp(err.to_string()))?,
                );
            }
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| QpcrError::ApiHttp(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    /// Retries transport failures (connect, timeout) with a linear backoff.
    /// HTTP statuses are never retried here: a 429 must reach the caller
    /// with its retry-after value intact.
    fn send_with_retries<F>(
        &self,
        mut make_req: F,
    ) -> Result<reqwest::blocking::Response, QpcrError>
    where
        F: FnMut() -> reqwest::blocking::RequestBuilder,
    {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            match make_req().send() {
                Ok(resp) => return Ok(resp),
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Err(QpcrError::ApiHttp(err.to_string()));
                }
            }
        }
    }

    fn expect_status(
        response: reqwest::blocking::Response,
        expected: StatusCode,
    ) -> Result<reqwest::blocking::Response, QpcrError> {
        let status = response.status();
        if status == expected {
            return Ok(response);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(rate_limited(response));
        }
        let message = response
            .text()
            .unwrap_or_else(|_| "quantification API request failed".to_string());
        Err(QpcrError::ApiStatus {
            status: status.as_u16(),
            message,
        })
    }
}

impl QpcrApi for QpcrHttpClient {
    fn submit_experiment(
        &self,
        tag: FormatTag,
        raw: &RawExport,
        reference: &str,
    ) -> Result<SubmitReceipt, QpcrError> {
        let url = format!("{}/v1/qpcr/{}", self.base_url, tag);
        let body = raw.as_str().to_string();
        let response = self.send_with_retries(|| {
            self.client
                .post(&url)
                .query(&[("mock", reference)])
                .body(body.clone())
        })?;
        let response = Self::expect_status(response, StatusCode::CREATED)?;
        response
            .json()
            .map_err(|err| QpcrError::ApiDecode(err.to_string()))
    }

    fn fetch_results(&self, experiment_id: &str) -> Result<ExperimentResults, QpcrError> {
        let url = format!("{}/v1/experiment/{}", self.base_url, experiment_id);
        let response = self.send_with_retries(|| {
            self.client
                .get(&url)
                .header(ACCEPT, HeaderValue::from_static("application/json"))
        })?;
        let response = Self::expect_status(response, StatusCode::OK)?;
        response
            .json()
            .map_err(|err| QpcrError::ApiDecode(err.to_string()))
    }

    fn rate_limit(&self) -> Result<RateLimitStatus, QpcrError> {
        let url = format!("{}/v1/rate-limit", self.base_url);
        let response = self.send_with_retries(|| self.client.get(&url))?;
        let response = Self::expect_status(response, StatusCode::OK)?;
        response
            .json()
            .map_err(|err| QpcrError::ApiDecode(err.to_string()))
    }
}

fn rate_limited(response: reqwest::blocking::Response) -> QpcrError {
    let header = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());
    let body = response.text().unwrap_or_default();
    QpcrError::RateLimited {
        retry_after: retry_after_from(&body, header.as_deref()),
    }
}

/// The service sets a `Retry-After` header; older deployments also put a
/// `RetryAfter` field in the 429 body. The body wins when both are present.
fn retry_after_from(body: &str, header: Option<&str>) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("RetryAfter")
                .and_then(|v| v.as_str())
                .map(|v| v.to_string())
        })
        .or_else(|| header.map(|v| v.to_string()))
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
