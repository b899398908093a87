//! Plan Representation
//!
//! A tree of typed physical operators annotated with cost, estimated row
//! count, filter/join conditions, sort keys, and optimization notes, plus
//! the pretty-printer that renders it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Physical operator tags. The optimizer pipeline only ever produces the
/// first five plus {Sort, Hash, Limit, Result}; the remainder are reserved
/// for extension and never emitted by this crate today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhysicalOperator {
    SeqScan,
    IndexScan,
    IndexOnlyScan,
    BitmapHeapScan,
    NestedLoop,
    HashJoin,
    MergeJoin,
    Sort,
    Filter,
    Hash,
    Aggregate,
    Limit,
    Result,
}

impl fmt::Display for PhysicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PhysicalOperator::SeqScan => "Seq Scan",
            PhysicalOperator::IndexScan => "Index Scan",
            PhysicalOperator::IndexOnlyScan => "Index Only Scan",
            PhysicalOperator::BitmapHeapScan => "Bitmap Heap Scan",
            PhysicalOperator::NestedLoop => "Nested Loop",
            PhysicalOperator::HashJoin => "Hash Join",
            PhysicalOperator::MergeJoin => "Merge Join",
            PhysicalOperator::Sort => "Sort",
            PhysicalOperator::Filter => "Filter",
            PhysicalOperator::Hash => "Hash",
            PhysicalOperator::Aggregate => "Aggregate",
            PhysicalOperator::Limit => "Limit",
            PhysicalOperator::Result => "Result",
        };
        write!(f, "{label}")
    }
}

/// A node in the physical plan tree. Owns its children exclusively — no
/// shared ownership is needed since the printer and comparator only ever do
/// a post-order walk. Serializable so a caller can emit a machine-readable
/// plan (e.g. as JSON) alongside the text pretty-printer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanNode {
    pub operator: PhysicalOperator,
    pub table: Option<String>,
    pub alias: Option<String>,
    pub index_name: Option<String>,
    pub startup_cost: f64,
    pub total_cost: f64,
    pub estimated_rows: u64,
    pub width: u32,
    pub filter_condition: Option<String>,
    pub join_condition: Option<String>,
    pub sort_keys: Vec<String>,
    pub children: Vec<PlanNode>,
    pub extra_info: BTreeMap<String, String>,
}

impl PlanNode {
    pub fn new(operator: PhysicalOperator, startup_cost: f64, total_cost: f64, estimated_rows: u64, width: u32) -> Self {
        Self {
            operator,
            table: None,
            alias: None,
            index_name: None,
            startup_cost,
            total_cost,
            estimated_rows,
            width,
            filter_condition: None,
            join_condition: None,
            sort_keys: Vec::new(),
            children: Vec::new(),
            extra_info: BTreeMap::new(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn with_alias(mut self, alias: Option<String>) -> Self {
        self.alias = alias;
        self
    }

    pub fn with_index_name(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = Some(index_name.into());
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter_condition = Some(filter.into());
        self
    }

    pub fn with_join_condition(mut self, condition: impl Into<String>) -> Self {
        self.join_condition = Some(condition.into());
        self
    }

    pub fn with_sort_keys(mut self, keys: Vec<String>) -> Self {
        self.sort_keys = keys;
        self
    }

    pub fn with_child(mut self, child: PlanNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: Vec<PlanNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_info.insert(key.into(), value.into());
        self
    }

    fn table_ref(&self) -> Option<&str> {
        self.alias.as_deref().or(self.table.as_deref())
    }

    /// `max(self.total_cost, max over children)`. Holds by construction for
    /// every node this crate builds.
    pub fn total_subtree_cost(&self) -> f64 {
        self.children
            .iter()
            .map(|c| c.total_subtree_cost())
            .fold(self.total_cost, f64::max)
    }

    /// Renders this node and its subtree, one header line per node indented
    /// two spaces per depth; the root omits the `"-> "` arrow. Deterministic:
    /// identical inputs produce identical output.
    pub fn format(&self, indent: usize) -> String {
        let mut out = String::new();
        self.format_into(indent, &mut out);
        out
    }

    fn format_into(&self, indent: usize, out: &mut String) {
        use std::fmt::Write;

        let pad = "  ".repeat(indent);
        let arrow = if indent == 0 { "" } else { "-> " };

        write!(out, "{pad}{arrow}{}", self.operator).unwrap();
        if let Some(table_ref) = self.table_ref() {
            write!(out, " on {table_ref}").unwrap();
        }
        if let Some(index_name) = &self.index_name {
            write!(out, " using {index_name}").unwrap();
        }
        writeln!(
            out,
            "  (cost={:.2}..{:.2} rows={} width={})",
            self.startup_cost, self.total_cost, self.estimated_rows, self.width
        )
        .unwrap();

        let detail_pad = "  ".repeat(indent + 1);
        if let Some(filter) = &self.filter_condition {
            writeln!(out, "{detail_pad}Filter: {filter}").unwrap();
        }
        if let Some(join_cond) = &self.join_condition {
            writeln!(out, "{detail_pad}Join Cond: {join_cond}").unwrap();
        }
        if !self.sort_keys.is_empty() {
            writeln!(out, "{detail_pad}Sort Key: {}", self.sort_keys.join(", ")).unwrap();
        }
        for (key, value) in &self.extra_info {
            writeln!(out, "{detail_pad}{key}: {value}").unwrap();
        }

        for child in &self.children {
            child.format_into(indent + 1, out);
        }
    }
}

/// A complete planning result: a root [`PlanNode`], the SQL the plan was
/// produced for, planning wall time, and whether this is the naïve or
/// optimized build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub root: PlanNode,
    pub query_sql: String,
    pub planning_time_ms: f64,
    pub is_optimized: bool,
    pub optimization_notes: Vec<String>,
}

impl ExecutionPlan {
    pub fn total_cost(&self) -> f64 {
        self.root.total_subtree_cost()
    }

    pub fn estimated_rows(&self) -> u64 {
        self.root.estimated_rows
    }

    /// `"Query:"` / `"QUERY PLAN"` header, dashes, the root's formatted
    /// subtree, dashes, aggregate totals, and — when `verbose` — the
    /// optimization notes.
    pub fn format(&self, verbose: bool) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        writeln!(out, "Query:\n{}", self.query_sql).unwrap();
        writeln!(out, "\nQUERY PLAN").unwrap();
        writeln!(out, "{}", "-".repeat(60)).unwrap();
        write!(out, "{}", self.root.format(0)).unwrap();
        writeln!(out, "{}", "-".repeat(60)).unwrap();
        writeln!(out, "Total Cost: {:.2}", self.total_cost()).unwrap();
        writeln!(out, "Estimated Rows: {}", self.estimated_rows()).unwrap();
        writeln!(out, "Planning Time: {:.3} ms", self.planning_time_ms).unwrap();

        if verbose && !self.optimization_notes.is_empty() {
            writeln!(out, "\nOptimization Notes:").unwrap();
            for note in &self.optimization_notes {
                writeln!(out, "  - {note}").unwrap();
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(total: f64) -> PlanNode {
        PlanNode::new(PhysicalOperator::SeqScan, 0.0, total, 10, 64).with_table("t")
    }

    #[test]
    fn total_subtree_cost_is_max_of_self_and_children() {
        let parent = PlanNode::new(PhysicalOperator::NestedLoop, 0.0, 5.0, 100, 128)
            .with_child(leaf(10.0))
            .with_child(leaf(3.0));
        assert_eq!(parent.total_subtree_cost(), 10.0);
    }

    #[test]
    fn root_header_omits_arrow() {
        let root = leaf(4.0);
        let rendered = root.format(0);
        assert!(rendered.starts_with("Seq Scan on t"));
        assert!(!rendered.starts_with("->"));
    }

    #[test]
    fn child_header_has_arrow_and_indent() {
        let parent = PlanNode::new(PhysicalOperator::NestedLoop, 0.0, 5.0, 100, 128).with_child(leaf(1.0));
        let rendered = parent.format(0);
        assert!(rendered.contains("  -> Seq Scan on t"));
    }

    #[test]
    fn format_is_deterministic() {
        let plan = PlanNode::new(PhysicalOperator::NestedLoop, 0.0, 5.0, 100, 128).with_child(leaf(1.0));
        assert_eq!(plan.format(0), plan.format(0));
    }

    #[test]
    fn plan_node_round_trips_through_json() {
        let node = PlanNode::new(PhysicalOperator::IndexScan, 1.0, 2.0, 10, 64)
            .with_table("orders")
            .with_index_name("idx_orders_customer")
            .with_filter("customer_id = 5");
        let json = serde_json::to_string(&node).unwrap();
        let back: PlanNode = serde_json::from_str(&json).unwrap();
        assert_eq!(back.operator, PhysicalOperator::IndexScan);
        assert_eq!(back.index_name.as_deref(), Some("idx_orders_customer"));
    }
}
