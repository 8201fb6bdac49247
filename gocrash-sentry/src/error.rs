// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Error types for `gocrash-sentry`.

use std::time::Duration;
use thiserror::Error;

/// Why a DSN string could not be turned into a client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DsnError {
    /// The string is not a URL at all.
    #[error("invalid DSN: {0}")]
    InvalidUrl(String),

    /// Only `http` and `https` endpoints are supported.
    #[error("unsupported DSN scheme: {0}")]
    UnsupportedScheme(String),

    /// The URL has no host to send events to.
    #[error("DSN has no host")]
    MissingHost,

    /// The userinfo part carrying the public key is missing or empty.
    #[error("DSN has no public key")]
    MissingPublicKey,

    /// The last path segment naming the project is missing or empty.
    #[error("DSN has no project id")]
    MissingProjectId,

    /// The HTTP transport could not be built.
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

/// Errors returned by [`crate::SentryClient::capture`].
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The server asked us to back off and the cool-down has not expired.
    /// No request was made.
    #[error("rate limited, dropping event for another {remaining:?}")]
    RateLimited {
        /// Time left until the gate reopens.
        remaining: Duration,
    },

    /// The event could not be encoded as JSON.
    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The gzip encoder failed.
    #[error("failed to compress event: {0}")]
    Compress(#[from] std::io::Error),

    /// The request never got an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with something other than 200.
    #[error("store endpoint returned status {status}: {body}")]
    Http {
        /// The HTTP status code.
        status: u16,
        /// The response body, lossy-decoded as UTF-8.
        body: String,
    },

    /// A 200 response whose body is not the expected `{"id": ...}`.
    #[error("invalid store response: {0}")]
    InvalidResponse(String),
}

impl CaptureError {
    /// True when the event was dropped by the cool-down gate, as opposed to a
    /// failed delivery.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, CaptureError::RateLimited { .. })
    }
}
