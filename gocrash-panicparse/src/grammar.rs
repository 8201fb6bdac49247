// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Line matchers for the textual constructs of a Go panic dump.
//!
//! Every matcher either recognizes the whole line and returns its captures, or
//! returns `None`. There are no partial matches. The regexes are compiled once
//! and shared read-only, so matching is safe from any number of threads.

use regex::Regex;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static PANIC_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^panic: (.*)$").expect("valid panic regex"));

#[allow(clippy::expect_used)]
static SIGNAL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[signal\s([^:]+):\s(.*)\]$").expect("valid signal regex"));

#[allow(clippy::expect_used)]
static GOROUTINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+) (\S+) \[([^,\]]+)(?:, (\d+) minutes)?(, locked to thread)?\]:$")
        .expect("valid goroutine regex")
});

// Function segments never contain whitespace; this keeps goroutine headers
// from being mistaken for receiver-less frames. The package path runs to the
// last `/`, and its final element ends at the first `.` unless that dot opens
// a major version suffix (`gopkg.in/yaml.v3`).
#[allow(clippy::expect_used)]
static FUNC_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(created by )?",
        r"(?:((?:[^/(\s]*/)*[^./(\s]*(?:\.v\d+)*)\.)?",
        r"(?:\((\*)?([^)\s]+)\)\.?)?",
        r"([^(\s]+)",
        r"(?:\(([^)]*)\))?",
        r"(?: in goroutine \S+)?$",
    ))
    .expect("valid func regex")
});

#[allow(clippy::expect_used)]
static FILE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(.+):(\d+)(?:\s+(\S+))?(?:\s.*)?$").expect("valid file regex"));

/// Marker printed by the runtime when it truncates a goroutine's stack.
pub const FRAMES_ELIDED: &str = "...additional frames elided...";

/// Label the runtime prints in front of every execution context header.
pub const GOROUTINE_LABEL: &str = "goroutine";

/// `panic: <text>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanicHeader<'a> {
    pub text: &'a str,
}

/// `[signal <name>: <description with key=value tokens>]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalLine<'a> {
    pub name: &'a str,
    pub info: &'a str,
}

/// `goroutine <id> [<state>(, <N> minutes)?(, locked to thread)?]:`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoroutineHeader<'a> {
    pub id: &'a str,
    pub state: &'a str,
    pub wait_minutes: Option<&'a str>,
    pub locked_to_thread: bool,
}

/// One function line of a stack listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncLine<'a> {
    pub raw: &'a str,
    pub created_by: bool,
    pub module: &'a str,
    pub pointer_receiver: bool,
    pub receiver: &'a str,
    pub function: &'a str,
    pub arguments: Option<&'a str>,
}

/// The indented `<file>:<line> <offset>` line following a function line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLine<'a> {
    pub file: &'a str,
    pub line: &'a str,
    pub offset: &'a str,
}

pub fn match_panic(line: &str) -> Option<PanicHeader<'_>> {
    let caps = PANIC_REGEX.captures(line)?;
    Some(PanicHeader {
        text: caps.get(1).map_or("", |m| m.as_str()),
    })
}

pub fn match_signal(line: &str) -> Option<SignalLine<'_>> {
    let caps = SIGNAL_REGEX.captures(line)?;
    Some(SignalLine {
        name: caps.get(1).map_or("", |m| m.as_str()),
        info: caps.get(2).map_or("", |m| m.as_str()),
    })
}

pub fn match_goroutine(line: &str) -> Option<GoroutineHeader<'_>> {
    let caps = GOROUTINE_REGEX.captures(line)?;
    if caps.get(1).map(|m| m.as_str()) != Some(GOROUTINE_LABEL) {
        return None;
    }
    Some(GoroutineHeader {
        id: caps.get(2).map_or("", |m| m.as_str()),
        state: caps.get(3).map_or("", |m| m.as_str()),
        wait_minutes: caps.get(4).map(|m| m.as_str()),
        locked_to_thread: caps.get(5).is_some(),
    })
}

pub fn match_func(line: &str) -> Option<FuncLine<'_>> {
    let caps = FUNC_REGEX.captures(line)?;
    Some(FuncLine {
        raw: caps.get(0).map_or("", |m| m.as_str()),
        created_by: caps.get(1).is_some(),
        module: caps.get(2).map_or("", |m| m.as_str()),
        pointer_receiver: caps.get(3).is_some(),
        receiver: caps.get(4).map_or("", |m| m.as_str()),
        function: caps.get(5).map_or("", |m| m.as_str()),
        arguments: caps.get(6).map(|m| m.as_str()),
    })
}

pub fn match_file(line: &str) -> Option<FileLine<'_>> {
    let caps = FILE_REGEX.captures(line)?;
    Some(FileLine {
        file: caps.get(1).map_or("", |m| m.as_str()),
        line: caps.get(2).map_or("", |m| m.as_str()),
        offset: caps.get(3).map_or("", |m| m.as_str()),
    })
}

pub fn is_frames_elided(line: &str) -> bool {
    line.trim_start().starts_with(FRAMES_ELIDED)
}
