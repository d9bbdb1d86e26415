//! Signed HTTP request plumbing
//!
//! Builds signed requests, executes them with bounded retries for transient
//! failures, and maps HTTP statuses to structured errors before any body is
//! parsed.

use std::time::Duration;

use chrono::Utc;
use reqwest::RequestBuilder;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::client::{SberCloudDns, Service};
use crate::error::{ApiError, Result};
use crate::types::ApiErrorResponse;
use crate::util::truncate_for_log;

impl SberCloudDns {
    /// Headers included in the request signature.
    ///
    /// `X-Project-Id` is only attached once a project scope has been
    /// resolved.
    fn signed_headers(
        &self,
        service: Service,
        timestamp: &str,
        has_body: bool,
    ) -> Vec<(String, String)> {
        let mut headers = vec![
            ("Host".to_string(), self.host(service).to_string()),
            ("X-Sdk-Date".to_string(), timestamp.to_string()),
        ];
        if has_body {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        if let Some(project_id) = &self.project_id {
            headers.push(("X-Project-Id".to_string(), project_id.to_string()));
        }
        headers
    }

    /// Executes a signed GET and parses the JSON response.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        service: Service,
        path: &str,
        query: &str,
    ) -> Result<T> {
        let timestamp = sdk_timestamp();
        let headers = self.signed_headers(service, &timestamp, false);
        let authorization = self
            .signer
            .authorization("GET", path, query, &headers, "", &timestamp);

        let url = if query.is_empty() {
            format!("{}{path}", self.base(service))
        } else {
            format!("{}{path}?{query}", self.base(service))
        };

        let mut request = self.client.get(&url);
        for (name, value) in &headers {
            request = request.header(name, value);
        }
        let request = request.header("Authorization", authorization);

        let (status, body) =
            execute_request_with_retry(request, "GET", &url, self.max_retries).await?;
        check_status(status, &body)?;
        parse_json(&body)
    }

    /// Executes a signed POST with a JSON body and parses the response.
    pub(crate) async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        service: Service,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let payload = serde_json::to_string(body).map_err(|e| ApiError::Serialization {
            detail: e.to_string(),
        })?;

        log::debug!("Request Body: {}", truncate_for_log(&payload));

        let timestamp = sdk_timestamp();
        let headers = self.signed_headers(service, &timestamp, true);
        let authorization =
            self.signer
                .authorization("POST", path, "", &headers, &payload, &timestamp);

        let url = format!("{}{path}", self.base(service));
        let mut request = self.client.post(&url);
        for (name, value) in &headers {
            request = request.header(name, value);
        }
        let request = request.header("Authorization", authorization).body(payload);

        let (status, body) =
            execute_request_with_retry(request, "POST", &url, self.max_retries).await?;
        check_status(status, &body)?;
        parse_json(&body)
    }

    /// Executes a signed DELETE, discarding any response body.
    pub(crate) async fn delete(&self, service: Service, path: &str) -> Result<()> {
        let timestamp = sdk_timestamp();
        let headers = self.signed_headers(service, &timestamp, false);
        let authorization = self
            .signer
            .authorization("DELETE", path, "", &headers, "", &timestamp);

        let url = format!("{}{path}", self.base(service));
        let mut request = self.client.delete(&url);
        for (name, value) in &headers {
            request = request.header(name, value);
        }
        let request = request.header("Authorization", authorization);

        let (status, body) =
            execute_request_with_retry(request, "DELETE", &url, self.max_retries).await?;
        check_status(status, &body)
    }
}

/// Current UTC time in the `X-Sdk-Date` wire format.
fn sdk_timestamp() -> String {
    Utc::now().format("%Y%m%dT%H%M%SZ").to_string()
}

/// Maps non-2xx statuses to structured errors before any parsing happens.
///
/// Error bodies are `{code, message}` JSON objects when the gateway produced
/// them; anything else is carried through raw.
pub(crate) fn check_status(status: u16, body: &str) -> Result<()> {
    if (200..300).contains(&status) {
        return Ok(());
    }

    let parsed: Option<ApiErrorResponse> = serde_json::from_str(body).ok();
    let error_code = parsed.as_ref().and_then(|e| e.code.clone());
    let message = parsed
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.to_string());

    match status {
        401 => Err(ApiError::InvalidCredentials {
            raw_message: Some(message),
        }),
        403 => Err(ApiError::PermissionDenied {
            raw_message: Some(message),
        }),
        _ => Err(ApiError::ApiStatus {
            status,
            error_code,
            message,
        }),
    }
}

/// Performs an HTTP request and returns the status code and response text.
///
/// Transport failures, HTTP 429, and HTTP 502-504 are turned into their
/// retryable error variants here; all other statuses are returned to the
/// caller for [`check_status`].
pub(crate) async fn execute_request(
    request_builder: RequestBuilder,
    method: &str,
    url: &str,
) -> Result<(u16, String)> {
    log::debug!("{method} {url}");

    let response = request_builder.send().await.map_err(|e| {
        if e.is_timeout() {
            ApiError::Timeout {
                detail: e.to_string(),
            }
        } else {
            ApiError::Network {
                detail: e.to_string(),
            }
        }
    })?;

    let status = response.status().as_u16();
    log::debug!("Response Status: {status}");

    // Extract Retry-After before consuming the response body.
    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    if status == 429 {
        let body = response.text().await.unwrap_or_default();
        log::warn!("Rate limited (HTTP 429), retry_after={retry_after:?}");
        return Err(ApiError::RateLimited {
            retry_after,
            raw_message: Some(body),
        });
    }

    if matches!(status, 502..=504) {
        let body = response.text().await.unwrap_or_default();
        log::warn!("Server error (HTTP {status})");
        return Err(ApiError::Network {
            detail: format!("HTTP {status}: {body}"),
        });
    }

    let body = response.text().await.map_err(|e| ApiError::Network {
        detail: format!("Failed to read response body: {e}"),
    })?;

    log::debug!("Response Body: {}", truncate_for_log(&body));

    Ok((status, body))
}

/// [`execute_request`] with automatic retries for transient failures.
///
/// Only retryable errors (network, timeout, rate limit) are retried, with
/// exponential backoff. Business errors return immediately.
pub(crate) async fn execute_request_with_retry(
    request_builder: RequestBuilder,
    method: &str,
    url: &str,
    max_retries: u32,
) -> Result<(u16, String)> {
    if max_retries == 0 {
        return execute_request(request_builder, method, url).await;
    }

    let mut last_error = None;

    for attempt in 0..=max_retries {
        // RequestBuilder is single-use; clone for each attempt.
        let Some(request) = request_builder.try_clone() else {
            log::warn!("Cannot clone request, disabling retry");
            return execute_request(request_builder, method, url).await;
        };

        match execute_request(request, method, url).await {
            Ok(resp) => return Ok(resp),
            Err(e) if attempt < max_retries && e.is_retryable() => {
                let delay = retry_delay(&e, attempt);
                log::warn!(
                    "Request failed (attempt {}/{}), retrying in {:.1}s: {}",
                    attempt + 1,
                    max_retries,
                    delay.as_secs_f32(),
                    e
                );
                tokio::time::sleep(delay).await;
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_error.unwrap_or_else(|| ApiError::Network {
        detail: "All retries exhausted with no error captured".to_string(),
    }))
}

/// Parses a JSON response body.
pub(crate) fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| {
        log::error!("JSON parse failed: {e}");
        log::error!("Raw response: {}", truncate_for_log(body));
        ApiError::Parse {
            detail: e.to_string(),
        }
    })
}

/// Delay before the next attempt.
///
/// `Retry-After` is honored (capped at 30s) when present; otherwise
/// exponential backoff.
fn retry_delay(error: &ApiError, attempt: u32) -> Duration {
    if let ApiError::RateLimited {
        retry_after: Some(secs),
        ..
    } = error
    {
        Duration::from_secs((*secs).min(30))
    } else {
        backoff_delay(attempt)
    }
}

/// Exponential backoff: 100ms, 200ms, 400ms, ... capped at 10s.
fn backoff_delay(attempt: u32) -> Duration {
    let capped_attempt = attempt.min(20); // keep 2^attempt in range
    let delay_ms = 100_u64.saturating_mul(1_u64 << capped_attempt);
    Duration::from_millis(delay_ms.min(10_000))
}
