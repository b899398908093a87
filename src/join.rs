//! Join Algorithm Selection
//!
//! Chooses, per join pair, between Nested Loop and Hash Join based on the
//! estimated size of each side. Join *order* is decided upstream by the
//! optimizer's effective-size sort (left-deep only, no bushy or
//! dynamic-programming enumeration); this module only picks the algorithm
//! for a already-ordered pair.

use crate::cost::CostModel;
use crate::plan::{PhysicalOperator, PlanNode};

/// Threshold above which both sides of a join are considered "large enough"
/// to prefer a hash join over a nested loop.
pub const DEFAULT_HASH_JOIN_ROW_THRESHOLD: u64 = 100;

#[derive(Debug, Clone, Copy)]
pub struct JoinAlgorithmSelector {
    hash_join_row_threshold: u64,
}

impl JoinAlgorithmSelector {
    pub fn new(hash_join_row_threshold: u64) -> Self {
        Self {
            hash_join_row_threshold,
        }
    }

    /// Builds the join node for `outer` driving `inner`, picking Hash Join
    /// when both sides exceed the row threshold and Nested Loop otherwise.
    /// Returns the join node plus the note that should be recorded for it.
    pub fn build_join(
        &self,
        cost_model: &CostModel,
        outer: PlanNode,
        inner: PlanNode,
        join_condition: Option<String>,
    ) -> (PlanNode, String) {
        let outer_cost = node_cost(&outer);
        let inner_cost = node_cost(&inner);

        if outer.estimated_rows > self.hash_join_row_threshold
            && inner.estimated_rows > self.hash_join_row_threshold
        {
            let hash_rows = inner.estimated_rows;
            let hash_width = inner.width;
            let hashed_inner = PlanNode::new(
                PhysicalOperator::Hash,
                inner_cost.total_cost,
                inner_cost.total_cost * 1.1,
                hash_rows,
                hash_width,
            )
            .with_child(inner);

            let cost = cost_model.hash_join(outer_cost, node_cost(&hashed_inner), 0.1);
            let mut node = PlanNode::new(
                PhysicalOperator::HashJoin,
                cost.startup_cost,
                cost.total_cost,
                cost.rows,
                cost.width,
            )
            .with_children(vec![outer, hashed_inner]);
            if let Some(cond) = join_condition {
                node = node.with_join_condition(cond);
            }

            let note = "Using Hash Join (tables > 100 rows each)".to_string();
            (node, note)
        } else {
            let cost = cost_model.nested_loop_join(outer_cost, inner_cost, None);
            let small_rows = inner.estimated_rows;
            let mut node = PlanNode::new(
                PhysicalOperator::NestedLoop,
                cost.startup_cost,
                cost.total_cost,
                cost.rows,
                cost.width,
            )
            .with_children(vec![outer, inner]);
            if let Some(cond) = join_condition {
                node = node.with_join_condition(cond);
            }

            let note = format!("Using Nested Loop (small table: {small_rows} rows)");
            (node, note)
        }
    }
}

fn node_cost(node: &PlanNode) -> crate::cost::Cost {
    crate::cost::Cost {
        startup_cost: node.startup_cost,
        total_cost: node.total_cost,
        rows: node.estimated_rows,
        width: node.width,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(rows: u64) -> PlanNode {
        PlanNode::new(PhysicalOperator::SeqScan, 0.0, 10.0, rows, 64).with_table("t")
    }

    #[test]
    fn small_tables_use_nested_loop() {
        let selector = JoinAlgorithmSelector::new(DEFAULT_HASH_JOIN_ROW_THRESHOLD);
        let model = CostModel::default();
        let (node, note) = selector.build_join(&model, scan(10), scan(20), None);
        assert_eq!(node.operator, PhysicalOperator::NestedLoop);
        assert!(note.contains("Nested Loop"));
    }

    #[test]
    fn large_tables_use_hash_join_with_wrapped_inner() {
        let selector = JoinAlgorithmSelector::new(DEFAULT_HASH_JOIN_ROW_THRESHOLD);
        let model = CostModel::default();
        let (node, note) = selector.build_join(&model, scan(500), scan(1000), None);
        assert_eq!(node.operator, PhysicalOperator::HashJoin);
        assert_eq!(node.children[1].operator, PhysicalOperator::Hash);
        assert!(note.contains("Hash Join"));
    }

    #[test]
    fn mixed_sizes_fall_back_to_nested_loop() {
        let selector = JoinAlgorithmSelector::new(DEFAULT_HASH_JOIN_ROW_THRESHOLD);
        let model = CostModel::default();
        let (node, note) = selector.build_join(&model, scan(5), scan(1000), None);
        assert_eq!(node.operator, PhysicalOperator::NestedLoop);
        // note reports the inner side's row count, not the smaller of the two.
        assert!(note.contains("small table: 1000 rows"));
    }
}
