use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;

use crate::core::config::Settings;

/// Shared HTTP client for catalog requests and file downloads.
pub fn build_http_client(settings: &Settings) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(settings.user_agent.as_str())
        .default_headers(default_headers)
        .timeout(settings.request_timeout())
        .build()
}
