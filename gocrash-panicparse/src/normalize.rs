// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::event::{
    Event, Exception, Level, Mechanism, MechanismMeta, SignalMeta, Stacktrace, Thread, WireFrame,
    PLATFORM,
};
use crate::model::{CrashDump, ExecutionContext, Failure, Frame, SignalInfo};
use crate::numeric::parse_int_or;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

pub const DEFAULT_RUNTIME_ROOT: &str = "/usr/local/go";
pub const MODULE_CACHE_MARKER: &str = "go/pkg/mod";
pub const VENDOR_MARKER: &str = "vendor";
pub const THIRD_PARTY_MARKER: &str = "third_party";

/// Path rules deciding whether a frame belongs to the application or to the
/// runtime and its dependencies. Classification is string/path based only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InAppRules {
    /// Frames whose file lies under this directory are runtime code.
    pub runtime_root: PathBuf,
    /// Substring of the file path identifying downloaded modules.
    pub module_cache_marker: String,
    /// Path component identifying vendored dependencies.
    pub vendor_marker: String,
    /// Substrings of the module or file identifying third-party code.
    pub third_party: Vec<String>,
}

impl Default for InAppRules {
    fn default() -> Self {
        Self {
            runtime_root: PathBuf::from(DEFAULT_RUNTIME_ROOT),
            module_cache_marker: MODULE_CACHE_MARKER.to_string(),
            vendor_marker: VENDOR_MARKER.to_string(),
            third_party: vec![THIRD_PARTY_MARKER.to_string()],
        }
    }
}

impl InAppRules {
    /// Defaults, with the runtime root taken from `GOROOT` when set.
    pub fn from_env() -> Self {
        let mut rules = Self::default();
        if let Some(root) = std::env::var_os("GOROOT").filter(|r| !r.is_empty()) {
            rules.runtime_root = PathBuf::from(root);
        }
        rules
    }

    pub fn with_runtime_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.runtime_root = root.into();
        self
    }

    pub fn with_third_party<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.third_party.extend(markers.into_iter().map(Into::into));
        self
    }

    /// Frames without a source location are never attributed to the
    /// application.
    pub fn is_in_app(&self, frame: &Frame) -> bool {
        if frame.file.is_empty() || Path::new(&frame.file).starts_with(&self.runtime_root) {
            return false;
        }
        if !self.module_cache_marker.is_empty() && frame.file.contains(&self.module_cache_marker) {
            return false;
        }
        if has_component(&frame.module, &self.vendor_marker)
            || has_component(&frame.file, &self.vendor_marker)
        {
            return false;
        }
        !self
            .third_party
            .iter()
            .filter(|marker| !marker.is_empty())
            .any(|marker| frame.module.contains(marker.as_str()) || frame.file.contains(marker.as_str()))
    }
}

fn has_component(path: &str, name: &str) -> bool {
    !name.is_empty()
        && Path::new(path)
            .components()
            .any(|c| matches!(c, Component::Normal(part) if part == name))
}

impl Event {
    /// Shapes a parsed dump into a wire event with a fresh id.
    pub fn from_dump(dump: &CrashDump, rules: &InAppRules) -> Self {
        let failure = &dump.failure;
        Self {
            event_id: Uuid::new_v4(),
            exception: vec![exception(failure)],
            threads: dump
                .contexts
                .iter()
                .map(|context| thread(context, rules))
                .collect(),
            platform: PLATFORM.to_string(),
            level: Level::Fatal,
            server_name: None,
            release: None,
            environment: None,
            tags: BTreeMap::new(),
            extra: BTreeMap::new(),
        }
    }
}

/// Free-function spelling of [`Event::from_dump`].
pub fn normalize(dump: &CrashDump, rules: &InAppRules) -> Event {
    Event::from_dump(dump, rules)
}

fn exception(failure: &Failure) -> Exception {
    Exception {
        kind: failure.kind.clone(),
        value: failure.description.clone(),
        synthetic: failure.synthetic,
        mechanism: match &failure.signal {
            Some(signal) => signal_mechanism(signal),
            None => Mechanism {
                kind: "panic".to_string(),
                description: None,
                meta: None,
                data: BTreeMap::new(),
                handled: None,
            },
        },
        thread_id: failure.context_id.clone(),
    }
}

fn signal_mechanism(signal: &SignalInfo) -> Mechanism {
    let raw_code = signal.code.clone().unwrap_or_default();
    let mut data = BTreeMap::from([
        ("signal".to_string(), signal.name.clone()),
        ("code".to_string(), raw_code.clone()),
    ]);
    if let Some(address) = &signal.address {
        data.insert("relevant_address".to_string(), address.clone());
    }
    if let Some(pc) = &signal.program_counter {
        data.insert("program_counter".to_string(), pc.clone());
    }
    Mechanism {
        kind: "signal".to_string(),
        description: Some(signal.description.clone()).filter(|d| !d.is_empty()),
        meta: Some(MechanismMeta {
            signal: SignalMeta {
                name: signal.name.clone(),
                code: parse_int_or(&raw_code, 0i64),
            },
        }),
        data,
        handled: Some(false),
    }
}

fn thread(context: &ExecutionContext, rules: &InAppRules) -> Thread {
    Thread {
        id: context.id.clone(),
        state: context.state.clone(),
        stacktrace: Stacktrace {
            frames: context
                .frames
                .iter()
                .rev()
                .map(|frame| WireFrame {
                    module: frame.module.clone(),
                    function: frame.qualified_function(),
                    raw_function: frame.raw_text.clone(),
                    filename: frame.file.clone(),
                    lineno: frame.line,
                    in_app: rules.is_in_app(frame),
                })
                .collect(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(module: &str, file: &str) -> Frame {
        Frame {
            module: module.to_string(),
            function_name: "f".to_string(),
            file: file.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn in_app_classification() {
        let rules = InAppRules::default();
        assert!(rules.is_in_app(&frame("main", "/tmp/sandbox/main.go")));
        assert!(!rules.is_in_app(&frame("", "/usr/local/go/src/runtime/panic.go")));
        assert!(!rules.is_in_app(&frame(
            "google.golang.org/grpc",
            "/home/u/go/pkg/mod/google.golang.org/grpc@v1.51.0/server.go"
        )));
        assert!(!rules.is_in_app(&frame("example.com/app/vendor/lib", "/src/app/vendor/lib/x.go")));
        assert!(!rules.is_in_app(&frame("example.com/app/third_party/x", "/src/x.go")));
    }

    #[test]
    fn runtime_root_is_component_wise() {
        let rules = InAppRules::default();
        assert!(rules.is_in_app(&frame("main", "/usr/local/golang/app/main.go")));
        assert!(!rules.is_in_app(&frame("main", "")));
    }

    #[test]
    fn vendor_must_be_a_path_component() {
        let rules = InAppRules::default();
        assert!(rules.is_in_app(&frame("example.com/vendors/x", "/src/vendors/x.go")));
    }

    #[test]
    fn custom_rules() {
        let rules = InAppRules::default()
            .with_runtime_root("/opt/go")
            .with_third_party(["github.com/acme/"]);
        assert!(!rules.is_in_app(&frame("", "/opt/go/src/runtime/proc.go")));
        assert!(rules.is_in_app(&frame("", "/usr/local/go/src/runtime/proc.go")));
        assert!(!rules.is_in_app(&frame("github.com/acme/lib", "/src/lib.go")));
    }

    #[test]
    fn signal_mechanism_shape() {
        let mechanism = signal_mechanism(&SignalInfo {
            name: "SIGSEGV".to_string(),
            description: "segmentation violation".to_string(),
            code: Some("0x1".to_string()),
            address: Some("0x0".to_string()),
            program_counter: None,
        });
        assert_eq!(mechanism.kind, "signal");
        assert_eq!(mechanism.handled, Some(false));
        assert_eq!(mechanism.meta.unwrap().signal.code, 1);
        assert_eq!(mechanism.data["code"], "0x1");
        assert_eq!(mechanism.data["relevant_address"], "0x0");
        assert!(!mechanism.data.contains_key("program_counter"));
    }

    #[test]
    fn unparsable_signal_code_is_zero() {
        let mechanism = signal_mechanism(&SignalInfo {
            name: "SIGBUS".to_string(),
            code: Some("zz".to_string()),
            ..Default::default()
        });
        assert_eq!(mechanism.meta.unwrap().signal.code, 0);
        assert_eq!(mechanism.data["code"], "zz");
        assert_eq!(mechanism.description, None);
    }

    #[test]
    fn frames_are_reversed_and_qualified() {
        let context = ExecutionContext {
            id: "7".to_string(),
            state: "running".to_string(),
            frames: vec![
                Frame {
                    receiver_type: "Server".to_string(),
                    function_name: "handle".to_string(),
                    file: "/src/a.go".to_string(),
                    line: 1,
                    ..Default::default()
                },
                Frame {
                    function_name: "main".to_string(),
                    module: "main".to_string(),
                    file: "/src/b.go".to_string(),
                    line: 2,
                    ..Default::default()
                },
            ],
            frames_elided: false,
        };
        let thread = thread(&context, &InAppRules::default());
        let frames = &thread.stacktrace.frames;
        assert_eq!(frames[0].function, "main");
        assert_eq!(frames[0].lineno, 2);
        assert_eq!(frames[1].function, "Server.handle");
        assert_eq!(frames[1].lineno, 1);
    }
}
