// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The HTTP seam between [`crate::SentryClient`] and the network.

use crate::{CaptureError, DsnError};
use bytes::Bytes;
use std::time::Duration;

/// Default per-request timeout of [`ReqwestTransport`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A POST to the store endpoint, fully encoded.
#[derive(Debug, Clone)]
pub struct StoreRequest {
    pub url: String,
    /// Insertion ordered. Names are sent as given.
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

/// Whatever came back, whatever the status.
#[derive(Debug, Clone)]
pub struct StoreResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

impl StoreRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

impl StoreResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Sends one request and returns the response.
///
/// This trait uses native AFIT and is not object-safe: the client holds a
/// concrete transport type, never a `dyn Transport`. Any HTTP status is a
/// successful send at this level; only failing to obtain a response is an
/// error.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&self, request: StoreRequest) -> Result<StoreResponse, CaptureError>;
}

/// A transport backed by a connection-pooling [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, DsnError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DsnError::InvalidConfig(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: StoreRequest) -> Result<StoreResponse, CaptureError> {
        let mut builder = self.client.post(&request.url);
        for (name, value) in &request.headers {
            // reqwest derives the length from the body itself.
            if name.eq_ignore_ascii_case("content-length") {
                continue;
            }
            builder = builder.header(name, value);
        }

        let response = builder
            .body(request.body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        Ok(StoreResponse {
            status,
            headers,
            body,
        })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> CaptureError {
    if e.is_timeout() {
        CaptureError::Transport(format!("request timed out: {e}"))
    } else if e.is_connect() {
        CaptureError::Transport(format!("connection failed: {e}"))
    } else {
        CaptureError::Transport(e.to_string())
    }
}
