// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::grammar::{self, FuncLine, GoroutineHeader};
use crate::model::{CrashDump, ExecutionContext, Failure, Frame, SignalInfo};
use crate::numeric::parse_int_or;
use std::io::{self, BufRead};
use tracing::debug;

/// Where we are in the dump. The runtime prints blocks in a fixed order, so the
/// states only ever move forward except for the stack listing loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TraceState {
    /// Looking for the `panic:` header.
    Init,
    /// Header seen; an optional `[signal ...]` line may follow.
    Panic,
    /// Between goroutines, waiting for the next header.
    Signal,
    /// Inside a goroutine, expecting a function line.
    StackFunc,
    /// Function line seen, expecting its source location.
    StackFile,
}

/// Whether the handler is done with the current line, or wants it fed again
/// in the (already updated) state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Consumed,
    Redispatch,
}

/// Builds a [`CrashDump`] one line at a time. A parser instance is used for a
/// single dump and holds no shared state.
#[derive(Debug)]
struct TraceParser {
    state: TraceState,
    failure: Failure,
    contexts: Vec<ExecutionContext>,
    current: Option<ExecutionContext>,
}

impl TraceParser {
    fn new() -> Self {
        Self {
            state: TraceState::Init,
            failure: Failure::default(),
            contexts: vec![],
            current: None,
        }
    }

    fn feed(&mut self, line: &str) {
        while self.step(line) == Step::Redispatch {}
    }

    fn step(&mut self, line: &str) -> Step {
        match self.state {
            TraceState::Init => {
                if let Some(header) = grammar::match_panic(line) {
                    self.failure.kind = header.text.to_string();
                    self.state = TraceState::Panic;
                }
                Step::Consumed
            }

            TraceState::Panic => {
                self.state = TraceState::Signal;
                match grammar::match_signal(line) {
                    Some(signal) => {
                        self.apply_signal(signal.name, signal.info);
                        Step::Consumed
                    }
                    // No signal annotation; the line may already be a header.
                    None => Step::Redispatch,
                }
            }

            TraceState::Signal => {
                if let Some(header) = grammar::match_goroutine(line) {
                    self.open_context(header);
                    self.state = TraceState::StackFunc;
                }
                Step::Consumed
            }

            TraceState::StackFunc => {
                if grammar::is_frames_elided(line) {
                    if let Some(context) = self.current.as_mut() {
                        context.frames_elided = true;
                    }
                    return Step::Consumed;
                }
                match grammar::match_func(line) {
                    Some(func) => {
                        self.push_frame(func);
                        self.state = TraceState::StackFile;
                        Step::Consumed
                    }
                    None => {
                        self.state = TraceState::Signal;
                        Step::Redispatch
                    }
                }
            }

            TraceState::StackFile => {
                let frame = self
                    .current
                    .as_mut()
                    .and_then(|context| context.frames.last_mut());
                match (grammar::match_file(line), frame) {
                    (Some(location), Some(frame)) => {
                        frame.file = location.file.to_string();
                        frame.line = parse_int_or(location.line, 0u32);
                        frame.stack_offset = parse_int_or(location.offset, 0i64);
                        self.state = TraceState::StackFunc;
                    }
                    _ => {
                        debug!(line, "expected a source location, skipping to next goroutine");
                        self.state = TraceState::Signal;
                    }
                }
                Step::Consumed
            }
        }
    }

    fn apply_signal(&mut self, name: &str, info: &str) {
        if let Some((kind, description)) = self.failure.kind.split_once(": ") {
            let (kind, description) = (kind.to_string(), description.to_string());
            self.failure.kind = kind;
            self.failure.description = description;
        }
        self.failure.synthetic = true;

        let mut signal = SignalInfo {
            name: name.to_string(),
            ..Default::default()
        };
        let mut words = vec![];
        for token in info.split(' ').filter(|t| !t.is_empty()) {
            match token.split_once('=') {
                Some(("code", value)) => signal.code = Some(value.to_string()),
                Some(("addr", value)) => signal.address = Some(value.to_string()),
                Some(("pc", value)) => signal.program_counter = Some(value.to_string()),
                _ => words.push(token),
            }
        }
        signal.description = words.join(" ");
        self.failure.signal = Some(signal);
    }

    fn open_context(&mut self, header: GoroutineHeader<'_>) {
        if let Some(done) = self.current.take() {
            self.contexts.push(done);
        }
        if self.failure.context_id.is_none() {
            self.failure.context_id = Some(header.id.to_string());
        }
        self.current = Some(ExecutionContext {
            id: header.id.to_string(),
            state: header.state.to_string(),
            frames: vec![],
            frames_elided: false,
        });
    }

    fn push_frame(&mut self, func: FuncLine<'_>) {
        let Some(context) = self.current.as_mut() else {
            return;
        };
        let arguments = match func.arguments {
            Some(args) if !args.is_empty() => args.split(", ").map(str::to_string).collect(),
            _ => vec![],
        };
        context.frames.push(Frame {
            raw_text: func.raw.to_string(),
            module: func.module.to_string(),
            receiver_type: func.receiver.to_string(),
            is_pointer_receiver: func.pointer_receiver,
            function_name: func.function.to_string(),
            arguments,
            created_by: func.created_by,
            ..Default::default()
        });
    }

    fn finish(mut self) -> Option<CrashDump> {
        if self.state == TraceState::Init {
            return None;
        }
        if let Some(done) = self.current.take() {
            self.contexts.push(done);
        }
        Some(CrashDump {
            failure: self.failure,
            contexts: self.contexts,
        })
    }
}

/// Parses the text of a Go panic dump.
///
/// Returns `None` when the text contains no `panic:` header, meaning there is
/// nothing to report. Lines that do not fit the expected layout never abort
/// the parse; whatever was recognized up to the end of input is returned.
pub fn parse(dump: &str) -> Option<CrashDump> {
    let mut parser = TraceParser::new();
    for line in dump.lines() {
        parser.feed(line);
    }
    parser.finish()
}

/// Like [`parse`], reading from `reader` until EOF. Invalid UTF-8 is replaced
/// rather than rejected, since dumps are sometimes interleaved with binary
/// output from the crashing process.
pub fn parse_reader<R: BufRead>(mut reader: R) -> io::Result<Option<CrashDump>> {
    let mut parser = TraceParser::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        parser.feed(line.trim_end_matches(['\n', '\r']));
    }
    Ok(parser.finish())
}
