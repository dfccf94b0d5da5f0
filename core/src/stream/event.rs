//! Activity events emitted by agents while they work

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const TIMESTAMP_FIELDS: &[&str] = &["timestamp", "time", "ts"];
const AGENT_FIELDS: &[&str] = &["agent_name", "agent", "stage", "source"];
const MESSAGE_FIELDS: &[&str] = &["message", "text", "content", "data"];
const KIND_FIELDS: &[&str] = &["kind", "type", "event_type", "level", "status"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    #[default]
    Info,
    Progress,
    Error,
}

impl EventKind {
    /// Map a backend label onto a kind. Unknown labels are `Info`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "error" | "failed" | "failure" => EventKind::Error,
            "progress" | "processing" | "running" | "thinking" | "tool" | "step" => {
                EventKind::Progress
            }
            _ => EventKind::Info,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Info => write!(f, "info"),
            EventKind::Progress => write!(f, "progress"),
            EventKind::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub timestamp: DateTime<Utc>,
    /// Agent name or stage label
    pub agent: Option<String>,
    pub message: String,
    pub kind: EventKind,
}

impl ActivityEvent {
    pub fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            agent: None,
            message: message.into(),
            kind,
        }
    }

    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Parse one text frame from the live channel.
    ///
    /// JSON objects are read field by field; any other non-empty text
    /// becomes an `Info` event carrying the raw text. Blank frames yield
    /// `None`.
    pub fn from_frame(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        let value = match serde_json::from_str::<Value>(trimmed) {
            Ok(value @ Value::Object(_)) => value,
            _ => return Some(Self::new(EventKind::Info, trimmed)),
        };

        let message = first_field(&value, MESSAGE_FIELDS)
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| trimmed.to_string());

        let kind = first_field(&value, KIND_FIELDS)
            .and_then(Value::as_str)
            .map(EventKind::from_label)
            .unwrap_or_default();

        let mut event = Self::new(kind, message);
        if let Some(agent) = first_field(&value, AGENT_FIELDS).and_then(Value::as_str) {
            if !agent.is_empty() {
                event = event.with_agent(agent);
            }
        }
        if let Some(timestamp) = first_field(&value, TIMESTAMP_FIELDS).and_then(parse_timestamp) {
            event = event.with_timestamp(timestamp);
        }
        Some(event)
    }
}

fn first_field<'a>(value: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .find_map(|name| value.get(*name).filter(|v| !v.is_null()))
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| Utc.from_utc_datetime(&naive))
            }),
        Value::Number(n) => {
            let raw = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            // Anything past year ~2286 in seconds is really milliseconds
            if raw.unsigned_abs() >= 10_000_000_000 {
                Utc.timestamp_millis_opt(raw).single()
            } else {
                Utc.timestamp_opt(raw, 0).single()
            }
        }
        _ => None,
    }
}
