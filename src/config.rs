//! Optimizer configuration
//!
//! Bundles the cost model's tunable constants together with the two
//! threshold decisions the optimizer pipeline makes (when to prefer an
//! index over a sequential scan, when to prefer a hash join over a nested
//! loop), so neither lives as a magic number buried in planning logic.

use crate::cost::CostModelConfig;
use crate::join::DEFAULT_HASH_JOIN_ROW_THRESHOLD;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OptimizerConfig {
    pub cost_model: CostModelConfig,
    /// Minimum estimated row count on *both* sides of a join to prefer Hash
    /// Join over Nested Loop.
    pub hash_join_row_threshold: u64,
    /// An index is used only when its combined predicate selectivity is
    /// strictly below this fraction; otherwise a sequential scan wins.
    pub index_selectivity_threshold: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            cost_model: CostModelConfig::default(),
            hash_join_row_threshold: DEFAULT_HASH_JOIN_ROW_THRESHOLD,
            index_selectivity_threshold: 0.20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_constants() {
        let config = OptimizerConfig::default();
        assert_eq!(config.hash_join_row_threshold, 100);
        assert!((config.index_selectivity_threshold - 0.20).abs() < 1e-9);
    }
}
