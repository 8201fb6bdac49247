// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0
#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

//! Turns the text a Go program prints when it dies of an unrecovered panic
//! into a structured crash event.
//!
//! ```
//! use gocrash_panicparse::{parse, Event, InAppRules};
//!
//! let dump = "panic: boom\n\ngoroutine 1 [running]:\nmain.main()\n\t/app/main.go:5 +0x1d\n";
//! let crash = parse(dump).unwrap();
//! let event = Event::from_dump(&crash, &InAppRules::default());
//! assert_eq!(event.threads[0].stacktrace.frames[0].function, "main");
//! ```

pub mod event;
pub mod grammar;
pub mod model;
pub mod normalize;
mod numeric;
mod parser;

pub use event::{Event, Level, PANIC_EXTRA_KEY, PLATFORM};
pub use model::{CrashDump, ExecutionContext, Failure, Frame, SignalInfo};
pub use normalize::{normalize, InAppRules};
pub use numeric::{parse_int, parse_int_or};
pub use parser::{parse, parse_reader};

/// Parses `dump` and normalizes it in one go. `None` when the text holds no
/// panic.
pub fn parse_event(dump: &str, rules: &InAppRules) -> Option<Event> {
    parse(dump).map(|crash| Event::from_dump(&crash, rules))
}
