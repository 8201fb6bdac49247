// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

//! `gocrash-sentry` delivers crash events produced by `gocrash-panicparse` to
//! the Sentry store endpoint.
//!
//! Each capture makes at most two requests: the full event, then, if that
//! fails, the event without the raw panic text. A 429 answer closes the
//! client's cool-down gate for the duration given by `Retry-After`.
//!
//! # Quick start
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use gocrash_panicparse::{parse_event, InAppRules};
//! use gocrash_sentry::SentryClient;
//!
//! let dump = std::fs::read_to_string("panic.txt")?;
//! let client = SentryClient::new("https://public@o1.ingest.sentry.io/42")?;
//! if let Some(mut event) = parse_event(&dump, &InAppRules::from_env()) {
//!     event.attach_raw_dump(dump.as_str());
//!     let id = client.capture(&mut event).await?;
//!     println!("sent {id}");
//! }
//! # Ok(())
//! # }
//! ```

mod client;
pub mod clock;
mod dsn;
mod error;
pub mod transport;

pub use client::{SentryClient, SentryClientBuilder, DEFAULT_RETRY_AFTER};
pub use clock::{Clock, SystemClock};
pub use dsn::Dsn;
pub use error::{CaptureError, DsnError};
pub use transport::{ReqwestTransport, StoreRequest, StoreResponse, Transport};
