// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Intermediate representation of a parsed panic dump, before it is shaped
//! into a wire event.

use serde::Serialize;

/// Everything recovered from one dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrashDump {
    pub failure: Failure,
    /// Goroutines in the order they appear in the dump.
    pub contexts: Vec<ExecutionContext>,
}

/// The top-level fault.
///
/// `signal` is `Some` exactly when `synthetic` is true, i.e. when the runtime
/// turned a hardware signal into the panic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: String,
    pub description: String,
    pub synthetic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<SignalInfo>,
    /// Id of the goroutine the failure is attributed to. The first goroutine
    /// listed wins; the dump gives no stronger guarantee.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
}

impl Default for Failure {
    fn default() -> Self {
        Self {
            kind: "crash".to_string(),
            description: String::new(),
            synthetic: false,
            signal: None,
            context_id: None,
        }
    }
}

/// Data from the `[signal ...]` annotation. Numeric values are kept as the
/// hex strings the runtime printed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SignalInfo {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program_counter: Option<String>,
}

/// One goroutine active at crash time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ExecutionContext {
    /// The id token exactly as printed.
    pub id: String,
    pub state: String,
    /// Innermost call first, as listed in the dump.
    pub frames: Vec<Frame>,
    pub frames_elided: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Frame {
    pub raw_text: String,
    pub module: String,
    pub receiver_type: String,
    pub is_pointer_receiver: bool,
    pub function_name: String,
    pub arguments: Vec<String>,
    pub file: String,
    pub line: u32,
    pub stack_offset: i64,
    /// Set for the `created by` entry closing a goroutine's listing.
    pub created_by: bool,
}

impl Frame {
    /// `Receiver.Method` for methods, the bare function name otherwise.
    pub fn qualified_function(&self) -> String {
        if self.receiver_type.is_empty() {
            self.function_name.clone()
        } else {
            format!("{}.{}", self.receiver_type, self.function_name)
        }
    }
}
