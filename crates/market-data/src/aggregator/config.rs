use std::time::Duration;

use serde::Deserialize;

/// Aggregator timeouts, in milliseconds.
///
/// A tier never waits longer than what is left of `overall_ceiling_ms`, so
/// the per-tier timeouts may add up to more than the ceiling.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct AggregatorConfig {
    pub broker_timeout_ms: u64,
    pub delayed_timeout_ms: u64,
    pub overall_ceiling_ms: u64,
}

impl AggregatorConfig {
    pub fn broker_timeout(&self) -> Duration {
        Duration::from_millis(self.broker_timeout_ms)
    }

    pub fn delayed_timeout(&self) -> Duration {
        Duration::from_millis(self.delayed_timeout_ms)
    }

    pub fn overall_ceiling(&self) -> Duration {
        Duration::from_millis(self.overall_ceiling_ms)
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            broker_timeout_ms: 10_000,
            delayed_timeout_ms: 8_000,
            overall_ceiling_ms: 20_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AggregatorConfig =
            serde_json::from_str(r#"{"overallCeilingMs": 5000}"#).unwrap();
        assert_eq!(config.overall_ceiling(), Duration::from_secs(5));
        assert_eq!(config.broker_timeout(), Duration::from_secs(10));
        assert_eq!(config.delayed_timeout(), Duration::from_secs(8));
    }
}
