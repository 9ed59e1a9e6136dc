use serde::{Deserialize, Serialize};

use crate::retention::Retention;
use crate::util::ok_or_default;

/// Saved dashboard state: which streams exist and how each retains
/// history. Written to the state file on exit, read back on startup.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct State {
    #[serde(default)]
    pub streams: Vec<StreamConfig>,
}

impl State {
    pub fn stream(&self, name: &str) -> Option<&StreamConfig> {
        self.streams.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StreamConfig {
    pub name: String,
    #[serde(deserialize_with = "ok_or_default", default)]
    pub retention: Retention,
    #[serde(default)]
    pub title: Option<String>,
}

impl StreamConfig {
    pub fn new(name: &str, retention: Retention) -> Self {
        Self {
            name: name.to_string(),
            retention,
            title: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retention::DEFAULT_MAX_POINTS;

    #[test]
    fn state_roundtrip() {
        let state = State {
            streams: vec![
                StreamConfig::new("BTCUSDT", Retention::FixedCapacity { max_points: 300 }),
                StreamConfig::new("heap_bytes", Retention::window_follow(60.0)),
            ],
        };

        let json = serde_json::to_string(&state).unwrap();
        let back: State = serde_json::from_str(&json).unwrap();

        assert_eq!(back.streams.len(), 2);
        assert_eq!(back.stream("heap_bytes"), Some(&state.streams[1]));
    }

    #[test]
    fn unknown_retention_shape_falls_back_to_default() {
        let raw = r#"{"streams":[{"name":"BTCUSDT","retention":{"RingBuffer":{"max":5}}}]}"#;
        let state: State = serde_json::from_str(raw).unwrap();

        assert_eq!(
            state.streams[0].retention,
            Retention::FixedCapacity {
                max_points: DEFAULT_MAX_POINTS
            }
        );
    }
}
