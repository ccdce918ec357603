use serde_json::Value;
use tracing::debug;

use crate::message::{is_truthy, MessageRecord};

const TOP_LEVEL_KEYS: &[&str] = &["data", "messages", "results"];
const NESTED_KEYS: &[&str] = &["items", "results", "messages"];

/// One way of locating the message list inside a response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionStrategy {
    /// Mapping body: the first truthy value under `keys` (or the whole
    /// mapping) is used if it is a list.
    KeyProbe { keys: &'static [&'static str] },
    /// Mapping body whose resolved candidate is itself a mapping: the first
    /// `inner` key holding a list wins.
    NestedKeyProbe {
        outer: &'static [&'static str],
        inner: &'static [&'static str],
    },
    /// The body is the list.
    BareList,
}

impl ExtractionStrategy {
    /// The strategies tried by [`extract_messages`], in order
    pub fn default_chain() -> Vec<ExtractionStrategy> {
        vec![
            ExtractionStrategy::KeyProbe {
                keys: TOP_LEVEL_KEYS,
            },
            ExtractionStrategy::NestedKeyProbe {
                outer: TOP_LEVEL_KEYS,
                inner: NESTED_KEYS,
            },
            ExtractionStrategy::BareList,
        ]
    }

    /// Returns the list this strategy finds, or None if it does not apply
    pub fn apply<'a>(&self, body: &'a Value) -> Option<&'a Vec<Value>> {
        match self {
            ExtractionStrategy::KeyProbe { keys } => resolve_candidate(body, keys)?.as_array(),
            ExtractionStrategy::NestedKeyProbe { outer, inner } => {
                let candidate = resolve_candidate(body, outer)?.as_object()?;
                inner
                    .iter()
                    .find_map(|k| candidate.get(*k).and_then(Value::as_array))
            }
            ExtractionStrategy::BareList => body.as_array(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExtractionStrategy::KeyProbe { .. } => "key probe",
            ExtractionStrategy::NestedKeyProbe { .. } => "nested key probe",
            ExtractionStrategy::BareList => "bare list",
        }
    }
}

/// For a mapping body: the first truthy value under `keys`, else the
/// mapping itself. None for any other shape.
fn resolve_candidate<'a>(body: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let map = body.as_object()?;
    let candidate = keys
        .iter()
        .filter_map(|k| map.get(*k))
        .find(|v| is_truthy(v))
        .unwrap_or(body);
    Some(candidate)
}

/// Run `strategies` in order against `body`; the first match wins.
/// Unknown shapes yield an empty list rather than an error.
pub fn extract_with(strategies: &[ExtractionStrategy], body: &Value) -> Vec<MessageRecord> {
    for strategy in strategies {
        if let Some(list) = strategy.apply(body) {
            debug!("Extracted {} message(s) via {}", list.len(), strategy.name());
            return list.iter().cloned().map(MessageRecord::new).collect();
        }
    }

    debug!("No message list found in response body");
    Vec::new()
}

pub fn extract_messages(body: &Value) -> Vec<MessageRecord> {
    extract_with(&ExtractionStrategy::default_chain(), body)
}
