// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use clap::Parser;
use std::env;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod config;
mod report;

use config::Args;
use report::Outcome;

const LOG_ENV: &str = "GOCRASH_LOG";

fn init_tracing() {
    let log_level = env::var(LOG_ENV).unwrap_or_else(|_| "info".to_owned());
    let quiet = "h2=off,hyper=off,hyper_util=off,reqwest=off,rustls=off";
    let filter = EnvFilter::try_new(format!("{quiet},{log_level}"))
        .unwrap_or_else(|_| EnvFilter::new(format!("{quiet},info")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    let dump = report::read_dump_from(args.input.as_deref()).await?;
    match report::run(&args, &dump, &mut std::io::stderr(), &mut std::io::stdout()).await? {
        Outcome::Sent(id) => debug!(event_id = %id, "handler finished"),
        Outcome::NothingToReport => debug!("handler finished without a report"),
    }
    Ok(())
}
