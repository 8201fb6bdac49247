// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Command-line arguments for the crash handler.

use clap::Parser;
use gocrash_panicparse::InAppRules;
use std::path::PathBuf;
use std::time::Duration;

/// Reports a captured Go panic dump to Sentry.
///
/// The dump is read from `--input` or stdin, echoed to stderr, parsed, and
/// sent as a single fatal event.
#[derive(Parser, Clone, Debug)]
#[command(name = "gocrash-handler", version)]
pub struct Args {
    /// Sentry DSN to report to. Without one the dump is only echoed.
    #[arg(long, env = "SENTRY_DSN")]
    pub dsn: Option<String>,

    #[arg(long, env = "SENTRY_ENVIRONMENT")]
    pub environment: Option<String>,

    #[arg(long, env = "SENTRY_RELEASE")]
    pub release: Option<String>,

    /// Reported host name
    #[arg(long)]
    pub server_name: Option<String>,

    /// Extra event tag as key=value; may be repeated
    #[arg(long = "tag", value_name = "KEY=VALUE", value_parser = parse_tag)]
    pub tags: Vec<(String, String)>,

    /// Go installation root; frames under it are not application code
    #[arg(long, env = "GOROOT")]
    pub goroot: Option<PathBuf>,

    /// Module or path fragment marking third-party code; may be repeated
    #[arg(long = "third-party", value_name = "PATTERN")]
    pub third_party: Vec<String>,

    /// Send the event body uncompressed
    #[arg(long)]
    pub no_compression: bool,

    /// Seconds to wait for delivery, retry included, before giving up
    #[arg(long, value_name = "SECONDS", default_value = "5", value_parser = parse_seconds)]
    pub timeout: Duration,

    /// Print the event JSON to stdout
    #[arg(long)]
    pub print: bool,

    /// Read the dump from this file instead of stdin
    #[arg(long, value_name = "PATH")]
    pub input: Option<PathBuf>,
}

impl Args {
    pub fn in_app_rules(&self) -> InAppRules {
        let rules = match &self.goroot {
            Some(root) if !root.as_os_str().is_empty() => {
                InAppRules::default().with_runtime_root(root.clone())
            }
            _ => InAppRules::default(),
        };
        rules.with_third_party(self.third_party.iter().cloned())
    }
}

fn parse_tag(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), value.trim().to_owned()))
        }
        _ => Err(format!("expected KEY=VALUE, got `{raw}`")),
    }
}

fn parse_seconds(raw: &str) -> Result<Duration, String> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .filter(|d| !d.is_zero())
        .ok_or_else(|| format!("expected a positive number of seconds, got `{raw}`"))
}
