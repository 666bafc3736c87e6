//! SerpAPI Google Jobs provider.
//!
//! Issues one `GET` per search against the configured endpoint with
//! `engine`, `q`, `location`, `api_key` and `output=json` parameters, then
//! normalises `jobs_results` into [`NormalizedPosting`] values.

use chrono::{Days, NaiveDate, Utc};
use serde::Deserialize;

use crate::config::JobSearchConfig;
use crate::error::{JobSearchError, ProviderError};
use crate::http;
use crate::provider::JobProvider;
use crate::types::{NormalizedPosting, SearchQuery};

/// SerpAPI client for the Google Jobs engine.
pub struct SerpApiProvider {
    client: reqwest::Client,
    endpoint: String,
    engine: String,
    api_key: String,
}

impl SerpApiProvider {
    /// Create a provider from the engine configuration.
    ///
    /// # Errors
    ///
    /// Returns [`JobSearchError::Config`] if no API key is configured, or
    /// [`JobSearchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &JobSearchConfig) -> Result<Self, JobSearchError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                JobSearchError::Config("api_key is required for the SerpAPI provider".into())
            })?;

        Ok(Self {
            client: http::build_client(config)?,
            endpoint: config.endpoint.clone(),
            engine: config.engine.clone(),
            api_key: api_key.to_owned(),
        })
    }
}

impl JobProvider for SerpApiProvider {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<NormalizedPosting>, ProviderError> {
        tracing::trace!(role = query.role_title(), location = ?query.location(), "SerpAPI search");

        let mut params = vec![
            ("engine", self.engine.as_str()),
            ("q", query.role_title()),
            ("api_key", self.api_key.as_str()),
            ("output", "json"),
        ];
        if let Some(location) = query.location() {
            params.push(("location", location));
        }

        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_transport_error)?;

        if !status.is_success() {
            tracing::debug!(status = %status, "SerpAPI returned error status");
            return Err(map_http_error(status, &body));
        }

        parse_response(&body, Utc::now().date_naive())
    }

    fn name(&self) -> &'static str {
        "serpapi"
    }
}

// ── Error Mapping ──────────────────────────────────────────────

/// Map a transport-level failure. The request URL carries the API key and
/// is stripped before the error is rendered.
fn map_transport_error(err: reqwest::Error) -> ProviderError {
    let err = err.without_url();
    if err.is_timeout() {
        ProviderError::Unavailable(format!("request timed out: {err}"))
    } else if err.is_decode() {
        ProviderError::InvalidResponse(format!("failed to read body: {err}"))
    } else {
        ProviderError::Unavailable(err.to_string())
    }
}

/// Map HTTP error responses to typed errors.
pub fn map_http_error(status: reqwest::StatusCode, body: &str) -> ProviderError {
    let detail = extract_error_message(body);

    match status.as_u16() {
        401 | 403 => ProviderError::Unauthorized(detail),
        408 | 429 => ProviderError::Unavailable(format!("HTTP {status}: {detail}")),
        s if s >= 500 => ProviderError::Unavailable(format!("HTTP {status}: {detail}")),
        _ => ProviderError::InvalidResponse(format!("HTTP {status}: {detail}")),
    }
}

/// Extract the `error` field from a SerpAPI error body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "no error detail".to_owned()
            } else {
                trimmed.chars().take(200).collect()
            }
        })
}

/// Classify an error SerpAPI reports inside a 200 response.
fn classify_in_band_error(message: String) -> Result<Vec<NormalizedPosting>, ProviderError> {
    let lower = message.to_lowercase();
    if lower.contains("hasn't returned any results") {
        Ok(Vec::new())
    } else if lower.contains("invalid api key") {
        Err(ProviderError::Unauthorized(message))
    } else {
        Err(ProviderError::InvalidResponse(message))
    }
}

// ── Response Normalisation ─────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SerpResponse {
    #[serde(default)]
    jobs_results: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawJob {
    job_id: Option<String>,
    title: Option<String>,
    company_name: Option<String>,
    location: Option<String>,
    description: Option<String>,
    snippet: Option<String>,
    share_link: Option<String>,
    apply_link: Option<String>,
    serpapi_link: Option<String>,
    #[serde(default)]
    apply_options: Vec<ApplyOption>,
    detected_extensions: Option<DetectedExtensions>,
}

#[derive(Debug, Deserialize)]
struct ApplyOption {
    link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetectedExtensions {
    posted_at: Option<String>,
}

/// Parse a successful response body into postings.
///
/// Entries that fail to deserialise or lack a title or URL are skipped.
/// Relative posting dates are resolved against `today`.
fn parse_response(body: &str, today: NaiveDate) -> Result<Vec<NormalizedPosting>, ProviderError> {
    let payload: SerpResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::InvalidResponse(format!("malformed JSON payload: {e}")))?;

    if let Some(message) = payload.error {
        return classify_in_band_error(message);
    }

    let raw_jobs = payload.jobs_results.unwrap_or_default();
    let total = raw_jobs.len();
    let postings: Vec<NormalizedPosting> = raw_jobs
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<RawJob>(value) {
            Ok(job) => normalise_job(job, today),
            Err(e) => {
                tracing::trace!(error = %e, "skipping undecodable job entry");
                None
            }
        })
        .collect();

    if postings.len() < total {
        tracing::debug!(total, kept = postings.len(), "dropped malformed job entries");
    }
    Ok(postings)
}

fn normalise_job(job: RawJob, today: NaiveDate) -> Option<NormalizedPosting> {
    let title = non_blank(job.title)?;
    let url = job
        .apply_options
        .into_iter()
        .find_map(|o| non_blank(o.link))
        .or_else(|| non_blank(job.share_link))
        .or_else(|| non_blank(job.apply_link))
        .or_else(|| non_blank(job.serpapi_link))?;

    let posted_date = job
        .detected_extensions
        .and_then(|ext| ext.posted_at)
        .and_then(|raw| parse_posted_at(&raw, today));

    Some(NormalizedPosting {
        title,
        company: non_blank(job.company_name).unwrap_or_default(),
        location: non_blank(job.location).unwrap_or_default(),
        description: non_blank(job.description)
            .or_else(|| non_blank(job.snippet))
            .unwrap_or_default(),
        provider_id: non_blank(job.job_id).unwrap_or_else(|| url.clone()),
        url,
        posted_date,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Resolve a posting age such as `"3 days ago"` or `"2024-01-05"` to a date.
///
/// Hours and minutes resolve to `today`; months count as 30 days.
/// Unrecognised phrases yield `None`.
pub fn parse_posted_at(raw: &str, today: NaiveDate) -> Option<NaiveDate> {
    let text = raw.trim().to_lowercase();
    match text.as_str() {
        "today" | "just posted" | "just now" => return Some(today),
        "yesterday" => return today.checked_sub_days(Days::new(1)),
        _ => {}
    }

    if let Ok(date) = NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
        return Some(date);
    }

    let mut parts = text.split_whitespace();
    let amount: u64 = parts.next()?.trim_end_matches('+').parse().ok()?;
    let unit = parts.next()?;
    let days = match unit.trim_end_matches('s') {
        "minute" | "min" | "hour" | "hr" => 0,
        "day" => amount,
        "week" => amount.checked_mul(7)?,
        "month" => amount.checked_mul(30)?,
        _ => return None,
    };
    today.checked_sub_days(Days::new(days))
}
