// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use fabwatch_app::ToolRecord;
use reqwest::StatusCode;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client as HttpClient, Response};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Outcome envelope of the reload and upload endpoints. The server replies
/// with this shape on every application-level outcome, including non-2xx
/// statuses, so `success: false` here is a reported failure rather than a
/// transport error.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub tools: Option<Vec<ToolRecord>>,
}

/// Blocking client for the dashboard service.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("server.base_url must not be empty");
        }
        Url::parse(&base_url)
            .with_context(|| format!("server.base_url {base_url:?} is not a valid URL"))?;

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Asks the server to reload its backing CSV from the default location.
    pub fn reload(&self) -> Result<ApiOutcome> {
        let response = self
            .http
            .post(format!("{}/api/reload", self.base_url))
            .json(&serde_json::json!({}))
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        read_envelope(response)
    }

    /// Sends a replacement CSV as a multipart form under the field name
    /// the server expects (`file`).
    pub fn upload_csv(&self, file_name: &str, bytes: Vec<u8>) -> Result<ApiOutcome> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_owned())
            .mime_str("text/csv")
            .context("build upload part")?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/api/upload", self.base_url))
            .multipart(form)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        read_envelope(response)
    }

    /// Fetches the current full record list. No envelope on this endpoint;
    /// any non-2xx or undecodable body is a transport-class failure.
    pub fn fetch_tools(&self) -> Result<Vec<ToolRecord>> {
        let response = self
            .http
            .get(format!("{}/api/tools", self.base_url))
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        response.json().context("decode tool list")
    }
}

/// Decodes the outcome envelope, preferring it over the HTTP status: the
/// server pairs `success: false` envelopes with 4xx/5xx codes, and those
/// are application-level outcomes, not transport errors.
fn read_envelope(response: Response) -> Result<ApiOutcome> {
    let status = response.status();
    let body = response.text().context("read response body")?;

    match serde_json::from_str::<ApiOutcome>(&body) {
        Ok(outcome) => Ok(outcome),
        Err(_) if !status.is_success() => Err(clean_error_response(status, &body)),
        Err(error) => Err(error).context("decode status envelope"),
    }
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- is the dashboard server running? ({} )",
        base_url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(message) = parsed.message
        && !message.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), message);
    }

    if body.len() < 100 && !body.contains('{') {
        return anyhow!("server error ({}): {}", status.as_u16(), body);
    }

    anyhow!("server returned {}", status.as_u16())
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    message: Option<String>,
}
