// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::config::Args;
use anyhow::{bail, Context};
use gocrash_panicparse::{parse, Event};
use gocrash_sentry::SentryClient;
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info, warn};

/// What happened to a dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The input held no panic.
    NothingToReport,
    /// Delivered; the id the server assigned.
    Sent(String),
}

/// Reads a whole dump, replacing invalid UTF-8.
pub async fn read_dump<R: AsyncRead + Unpin>(mut reader: R) -> anyhow::Result<String> {
    let mut raw = Vec::new();
    reader
        .read_to_end(&mut raw)
        .await
        .context("failed to read panic output")?;
    Ok(String::from_utf8_lossy(&raw).into_owned())
}

pub async fn read_dump_from(input: Option<&Path>) -> anyhow::Result<String> {
    match input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            read_dump(file).await
        }
        None => read_dump(tokio::io::stdin()).await,
    }
}

/// Builds the event for `dump` with everything the flags attach to it.
pub fn build_event(args: &Args, dump: &str) -> Option<Event> {
    let crash = parse(dump)?;
    let mut event = Event::from_dump(&crash, &args.in_app_rules());
    event.environment = args.environment.clone();
    event.release = args.release.clone();
    event.server_name = args.server_name.clone();
    event.tags.extend(args.tags.iter().cloned());
    event.attach_raw_dump(dump);
    Some(event)
}

/// Handles one captured dump.
///
/// The dump is echoed to `diagnostics` first, so it is never lost to a
/// failed delivery. `out` receives the event JSON (with `--print`) and the
/// event id.
pub async fn run<D: Write, O: Write>(
    args: &Args,
    dump: &str,
    diagnostics: &mut D,
    out: &mut O,
) -> anyhow::Result<Outcome> {
    diagnostics
        .write_all(dump.as_bytes())
        .and_then(|()| diagnostics.flush())
        .context("failed to echo panic output")?;

    let Some(mut event) = build_event(args, dump) else {
        info!("no panic found in input, nothing to report");
        return Ok(Outcome::NothingToReport);
    };
    debug!(
        event_id = %event.event_id.simple(),
        threads = event.threads.len(),
        "parsed panic output"
    );

    if args.print {
        serde_json::to_writer_pretty(&mut *out, &event).context("failed to print event")?;
        writeln!(out)?;
    }

    let Some(dsn) = args.dsn.as_deref().filter(|d| !d.trim().is_empty()) else {
        bail!("no Sentry DSN configured, crash report not sent");
    };
    // Each attempt gets half the deadline so the stripped retry still fits.
    let client = SentryClient::builder()
        .dsn(dsn)
        .compression(!args.no_compression)
        .timeout(args.timeout / 2)
        .build()
        .context("invalid Sentry DSN, crash report not sent")?;

    let id = match tokio::time::timeout(args.timeout, client.capture(&mut event)).await {
        Ok(Ok(id)) => id,
        Ok(Err(err)) if err.is_rate_limited() => {
            warn!(error = %err, "crash report dropped");
            return Err(err).context("crash report dropped while rate limited");
        }
        Ok(Err(err)) => return Err(err).context("failed to send crash report"),
        Err(_) => bail!("crash report not sent within {:?}", args.timeout),
    };

    info!(event_id = %id, "crash report sent");
    writeln!(out, "sentry event id: {id}")?;
    Ok(Outcome::Sent(id))
}
