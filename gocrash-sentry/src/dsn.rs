// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::DsnError;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// A parsed Sentry DSN, `<scheme>://<public>[:<secret>]@<host>[:port]/[<path>/]<project>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dsn {
    /// Scheme, host, port and any path prefix, without a trailing slash.
    base: String,
    project_id: String,
    public_key: String,
    secret_key: Option<String>,
}

impl Dsn {
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn secret_key(&self) -> Option<&str> {
        self.secret_key.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// `<base>/api/<project>/store/`
    pub fn store_url(&self) -> String {
        format!("{}/api/{}/store/", self.base, self.project_id)
    }
}

impl FromStr for Dsn {
    type Err = DsnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(s.trim()).map_err(|e| DsnError::InvalidUrl(e.to_string()))?;

        match url.scheme() {
            "http" | "https" => {}
            other => return Err(DsnError::UnsupportedScheme(other.to_string())),
        }
        let host = url.host_str().ok_or(DsnError::MissingHost)?;

        if url.username().is_empty() {
            return Err(DsnError::MissingPublicKey);
        }
        let public_key = url.username().to_string();
        let secret_key = url.password().filter(|s| !s.is_empty()).map(str::to_string);

        let path = url.path().trim_end_matches('/');
        let (prefix, project_id) = path.rsplit_once('/').unwrap_or(("", path));
        if project_id.is_empty() {
            return Err(DsnError::MissingProjectId);
        }

        let mut base = format!("{}://{}", url.scheme(), host);
        if let Some(port) = url.port() {
            base.push_str(&format!(":{port}"));
        }
        base.push_str(prefix);

        Ok(Self {
            base,
            project_id: project_id.to_string(),
            public_key,
            secret_key,
        })
    }
}

impl fmt::Display for Dsn {
    /// Renders the DSN without the secret key.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (scheme, rest) = self.base.split_once("://").unwrap_or(("https", &self.base));
        write!(f, "{scheme}://{}@{rest}/{}", self.public_key, self.project_id)
    }
}
