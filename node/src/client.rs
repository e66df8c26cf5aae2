//! # Node Client
//!
//! HTTP client for the `wallet` and `status` subcommands, built on
//! `reqwest`. Each call is one request; non-2xx statuses are errors.

use anyhow::{Context, Result};

fn http() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .context("failed to build HTTP client")
}

/// Sends `GET url` and returns the response body.
pub async fn get(url: &str) -> Result<String> {
    let response = http()?
        .get(url)
        .send()
        .await
        .with_context(|| format!("GET {} failed", url))?
        .error_for_status()?;
    Ok(response.text().await?)
}

/// Sends `POST url` with `body` as JSON and returns the response body.
pub async fn post(url: &str, body: &[u8]) -> Result<String> {
    let response = http()?
        .post(url)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(body.to_vec())
        .send()
        .await
        .with_context(|| format!("POST {} failed", url))?
        .error_for_status()?;
    Ok(response.text().await?)
}
