// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Wire representation of a crash event as accepted by the Sentry store
//! endpoint.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Extra key under which the raw dump text travels.
pub const PANIC_EXTRA_KEY: &str = "panic";

/// Platform reported for every event.
pub const PLATFORM: &str = "go";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    #[serde(serialize_with = "serialize_simple_uuid")]
    pub event_id: Uuid,
    pub exception: Vec<Exception>,
    pub threads: Vec<Thread>,
    pub platform: String,
    pub level: Level,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exception {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub synthetic: bool,
    pub mechanism: Mechanism,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

/// How the failure came about: an explicit `panic` or a hardware `signal`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mechanism {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<MechanismMeta>,
    pub data: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MechanismMeta {
    pub signal: SignalMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalMeta {
    pub name: String,
    pub code: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thread {
    pub id: String,
    pub state: String,
    pub stacktrace: Stacktrace,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stacktrace {
    /// Oldest call first.
    pub frames: Vec<WireFrame>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireFrame {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub module: String,
    pub function: String,
    pub raw_function: String,
    pub filename: String,
    pub lineno: u32,
    pub in_app: bool,
}

fn serialize_simple_uuid<S: Serializer>(id: &Uuid, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&id.simple())
}

impl Event {
    /// Stores the raw dump under [`PANIC_EXTRA_KEY`], replacing any earlier
    /// value.
    pub fn attach_raw_dump(&mut self, dump: impl Into<String>) {
        self.extra.insert(
            PANIC_EXTRA_KEY.to_string(),
            serde_json::Value::String(dump.into()),
        );
    }

    /// Removes the raw dump. Returns whether one was present.
    pub fn strip_raw_dump(&mut self) -> bool {
        self.extra.remove(PANIC_EXTRA_KEY).is_some()
    }

    pub fn has_raw_dump(&self) -> bool {
        self.extra.contains_key(PANIC_EXTRA_KEY)
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bare_event() -> Event {
        Event {
            event_id: Uuid::nil(),
            exception: vec![Exception {
                kind: "boom".to_string(),
                value: String::new(),
                synthetic: false,
                mechanism: Mechanism {
                    kind: "panic".to_string(),
                    description: None,
                    meta: None,
                    data: BTreeMap::new(),
                    handled: None,
                },
                thread_id: Some("1".to_string()),
            }],
            threads: vec![],
            platform: PLATFORM.to_string(),
            level: Level::Fatal,
            server_name: None,
            release: None,
            environment: None,
            tags: BTreeMap::new(),
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn serializes_minimal_shape() {
        let value = serde_json::to_value(bare_event()).unwrap();
        assert_eq!(
            value,
            json!({
                "event_id": "00000000000000000000000000000000",
                "exception": [{
                    "type": "boom",
                    "value": "",
                    "mechanism": {"type": "panic", "data": {}},
                    "thread_id": "1",
                }],
                "threads": [],
                "platform": "go",
                "level": "fatal",
            })
        );
    }

    #[test]
    fn event_id_is_lowercase_hex() {
        let mut event = bare_event();
        event.event_id = Uuid::new_v4();
        let value = serde_json::to_value(&event).unwrap();
        let id = value["event_id"].as_str().unwrap();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn synthetic_only_when_true() {
        let mut event = bare_event();
        event.exception[0].synthetic = true;
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["exception"][0]["synthetic"], json!(true));
    }

    #[test]
    fn raw_dump_helpers() {
        let mut event = bare_event();
        assert!(!event.strip_raw_dump());
        event.attach_raw_dump("panic: boom");
        assert!(event.has_raw_dump());
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["extra"]["panic"], json!("panic: boom"));
        assert!(event.strip_raw_dump());
        assert!(!event.has_raw_dump());
        assert!(serde_json::to_value(&event).unwrap().get("extra").is_none());
    }
}
