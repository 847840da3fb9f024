use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strata_common::error::Error;
use strata_compression::{CompressResultNode, CompressionPolicy, CompressorKind};
use strata_encodings::ByteOrder;

/// Settings shared by all makers of a writer session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnBinaryMakerConfig {
    /// Compressor applied to every encoded block.
    pub compressor: CompressorKind,

    /// Policy seeding the compression feedback state of the session.
    pub compression_policy: CompressionPolicy,

    /// Bit order of the packed payload sections.
    pub byte_order: ByteOrder,

    /// Largest acceptable `compressed / raw` ratio before the compression
    /// effort is lowered. `None` keeps the ideal level for the policy.
    pub allowed_ratio: Option<f64>,
}

impl ColumnBinaryMakerConfig {
    pub fn from_json(json: &str) -> strata_common::Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::invalid_arg("config", e.to_string()))
    }

    pub fn with_compressor(mut self, compressor: CompressorKind) -> Self {
        self.compressor = compressor;
        self
    }

    pub fn with_compression_policy(mut self, policy: CompressionPolicy) -> Self {
        self.compression_policy = policy;
        self
    }

    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    pub fn with_allowed_ratio(mut self, ratio: f64) -> Self {
        self.allowed_ratio = Some(ratio);
        self
    }

    /// Creates the root of the compression feedback tree for a writer session.
    ///
    /// The policy and allowed ratio are defaults only: a column whose custom
    /// config overrides them gets its feedback state created with the
    /// overridden values on first use.
    pub fn new_compress_result_node(&self) -> CompressResultNode {
        let node = CompressResultNode::new(self.compression_policy);
        match self.allowed_ratio {
            Some(ratio) => node.with_allowed_ratio(ratio),
            None => node,
        }
    }
}

/// Per-column overrides of [`ColumnBinaryMakerConfig`], organized as a tree
/// keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnBinaryMakerCustomConfigNode {
    pub config: Option<ColumnBinaryMakerConfig>,
    pub children: HashMap<String, ColumnBinaryMakerCustomConfigNode>,
}

impl ColumnBinaryMakerCustomConfigNode {
    pub fn from_json(json: &str) -> strata_common::Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::invalid_arg("custom config", e.to_string()))
    }

    pub fn with_config(config: ColumnBinaryMakerConfig) -> Self {
        Self {
            config: Some(config),
            children: HashMap::new(),
        }
    }

    pub fn add_child(&mut self, name: impl Into<String>, child: ColumnBinaryMakerCustomConfigNode) {
        self.children.insert(name.into(), child);
    }

    pub fn child(&self, name: &str) -> Option<&ColumnBinaryMakerCustomConfigNode> {
        self.children.get(name)
    }

    /// Resolves the effective config of a column: the node's override if any,
    /// otherwise the common config.
    pub fn resolve<'a>(
        node: Option<&'a ColumnBinaryMakerCustomConfigNode>,
        common: &'a ColumnBinaryMakerConfig,
    ) -> &'a ColumnBinaryMakerConfig {
        node.and_then(|node| node.config.as_ref()).unwrap_or(common)
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnBinaryMakerConfig, ColumnBinaryMakerCustomConfigNode};
    use strata_compression::{CompressionPolicy, CompressorKind};
    use strata_encodings::ByteOrder;

    #[test]
    fn test_config_from_json() {
        let config = ColumnBinaryMakerConfig::from_json(
            r#"{"compressor": "zstd", "compression_policy": "best_speed", "allowed_ratio": 0.8}"#,
        )
        .unwrap();
        assert_eq!(config.compressor, CompressorKind::Zstd);
        assert_eq!(config.compression_policy, CompressionPolicy::BestSpeed);
        assert_eq!(config.byte_order, ByteOrder::LittleEndian);
        assert_eq!(config.allowed_ratio, Some(0.8));

        let node = config.new_compress_result_node();
        assert_eq!(node.result().policy(), CompressionPolicy::BestSpeed);
        assert_eq!(node.result().allowed_ratio(), Some(0.8));

        assert!(ColumnBinaryMakerConfig::from_json(r#"{"compressor": "lzma"}"#).is_err());
    }

    #[test]
    fn test_resolve_overrides() {
        let common = ColumnBinaryMakerConfig::default();
        let root = ColumnBinaryMakerCustomConfigNode::from_json(
            r#"{
                "children": {
                    "user": {
                        "children": {
                            "id": {"config": {"compressor": "zstd", "byte_order": "big_endian"}}
                        }
                    }
                }
            }"#,
        )
        .unwrap();

        let user = root.child("user");
        assert_eq!(ColumnBinaryMakerCustomConfigNode::resolve(user, &common), &common);

        let id = user.and_then(|user| user.child("id"));
        let resolved = ColumnBinaryMakerCustomConfigNode::resolve(id, &common);
        assert_eq!(resolved.compressor, CompressorKind::Zstd);
        assert_eq!(resolved.byte_order, ByteOrder::BigEndian);

        assert_eq!(ColumnBinaryMakerCustomConfigNode::resolve(None, &common), &common);
    }
}
