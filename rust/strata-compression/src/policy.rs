use serde::{Deserialize, Serialize};

/// Trade-off between compression speed and compressed size requested for a
/// writer session. Each compressor maps it to its own ideal effort level.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionPolicy {
    BestSpeed,
    Speed,
    #[default]
    Default,
    BestCompression,
}

#[cfg(test)]
mod tests {
    use super::CompressionPolicy;

    #[test]
    fn test_serde_names() {
        let policy: CompressionPolicy = serde_json::from_str("\"best_speed\"").unwrap();
        assert_eq!(policy, CompressionPolicy::BestSpeed);
        assert_eq!(
            serde_json::to_string(&CompressionPolicy::BestCompression).unwrap(),
            "\"best_compression\""
        );
    }
}
