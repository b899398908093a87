//! Meridian Query Optimizer
//!
//! A cost-based relational query optimizer: given a [`Query`] built through
//! the fluent logical query model and a [`Schema`] describing tables,
//! columns, indexes, and per-column statistics, [`QueryOptimizer`] emits a
//! deliberately naïve physical plan and a cost-optimized one, each ready for
//! display via [`explain::compare_plans`].
//!
//! The optimizer does not parse SQL and does not execute queries — it plans
//! them. Planning is purely computational, single-threaded, and total: any
//! query over any schema produces a plan, even when tables are unknown or
//! statistics are missing.
//!
//! # Example
//!
//! ```
//! use meridian_query_optimizer::{QueryOptimizer, Schema, Table, Query};
//!
//! let mut schema = Schema::new();
//! schema.add_table(Table::new("customers").with_row_count(10_000), None);
//!
//! let mut query = Query::new();
//! query.select(&["c.id"]);
//! query.from_table("customers", Some("c"));
//! query.where_("c.country", "=", "USA");
//!
//! let optimizer = QueryOptimizer::new(schema);
//! let plan = optimizer.optimize(&query);
//! assert!(plan.is_optimized);
//! ```

pub mod config;
pub mod cost;
pub mod error;
pub mod explain;
pub mod join;
pub mod model;
pub mod plan;
pub mod query;

pub use config::OptimizerConfig;
pub use cost::{Cost, CostModel, CostModelConfig};
pub use error::QueryBuildError;
pub use explain::compare_plans;
pub use model::{Column, ColumnStats, DataType, Index, Schema, Table, TableStats};
pub use plan::{ExecutionPlan, PhysicalOperator, PlanNode};
pub use query::{JoinType, LogicalOp, Predicate, Query, TableReference, Value};

use join::JoinAlgorithmSelector;
use std::collections::HashMap;
use std::time::Instant;

/// Plans queries against a fixed [`Schema`]. Holds no mutable state, so one
/// instance may be shared freely across threads, or many independent
/// instances may run in parallel without coordination — either way, each
/// `optimize`/`build_naive_plan` call builds its own notes buffer locally.
pub struct QueryOptimizer {
    schema: Schema,
    config: OptimizerConfig,
    cost_model: CostModel,
    join_selector: JoinAlgorithmSelector,
}

impl QueryOptimizer {
    pub fn new(schema: Schema) -> Self {
        Self::with_config(schema, OptimizerConfig::default())
    }

    pub fn with_config(schema: Schema, config: OptimizerConfig) -> Self {
        let cost_model = CostModel::new(config.cost_model);
        let join_selector = JoinAlgorithmSelector::new(config.hash_join_row_threshold);
        Self {
            schema,
            config,
            cost_model,
            join_selector,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Builds the deliberately bad baseline: join order preserved exactly as
    /// declared, every table sequentially scanned, every join a nested
    /// loop, and all predicates collapsed onto the outermost scan's filter
    /// string regardless of which table they actually reference. This is
    /// intentional — it is the "bad" baseline optimized plans are compared
    /// against, not a bug to fix.
    pub fn build_naive_plan(&self, query: &Query) -> ExecutionPlan {
        let start = Instant::now();
        tracing::info!(tables = query.tables.len(), "building naive plan");

        if query.tables.is_empty() {
            return ExecutionPlan {
                root: result_node(),
                query_sql: query.to_sql(),
                planning_time_ms: elapsed_ms(start),
                is_optimized: false,
                optimization_notes: Vec::new(),
            };
        }

        let combined_filter = if query.predicates.is_empty() {
            None
        } else {
            Some(render_predicate_clause(&query.predicates.iter().collect::<Vec<_>>()))
        };

        let mut tables = query.tables.iter();
        let first = tables.next().unwrap();
        let mut running = self.seq_scan_node(first.reference(), &first.name, 1.0);
        if let Some(filter) = combined_filter {
            running = running.with_filter(filter);
        }

        for join in &query.joins {
            let inner_ref = join.reference();
            let inner = self.seq_scan_node(inner_ref, &join.table, 1.0);
            let condition = join.to_string();
            let cost = self
                .cost_model
                .nested_loop_join(node_cost(&running), node_cost(&inner), None);
            running = plan::PlanNode::new(
                PhysicalOperator::NestedLoop,
                cost.startup_cost,
                cost.total_cost,
                cost.rows,
                cost.width,
            )
            .with_join_condition(condition)
            .with_children(vec![running, inner]);
        }

        running = self.apply_final_operators(running, query, &mut Vec::new());

        ExecutionPlan {
            root: running,
            query_sql: query.to_sql(),
            planning_time_ms: elapsed_ms(start),
            is_optimized: false,
            optimization_notes: Vec::new(),
        }
    }

    /// Runs the five-step optimized pipeline: predicate pushdown, join
    /// reordering by ascending effective size, access-path selection per
    /// relation, join-algorithm selection per pair, and finally ORDER
    /// BY/LIMIT.
    pub fn optimize(&self, query: &Query) -> ExecutionPlan {
        let start = Instant::now();
        tracing::info!(tables = query.tables.len(), "optimizing query");
        let mut notes = Vec::new();

        if query.tables.is_empty() {
            return ExecutionPlan {
                root: result_node(),
                query_sql: query.to_sql(),
                planning_time_ms: elapsed_ms(start),
                is_optimized: true,
                optimization_notes: notes,
            };
        }

        let pushed = self.assign_predicates(query, &mut notes);
        let ordered_refs = self.order_joins(query, &pushed, &mut notes);

        let mut scan_nodes: HashMap<String, PlanNode> = HashMap::new();
        for table_ref in &ordered_refs {
            let base_name = query.get_table_name(table_ref);
            let preds = pushed.get(base_name).cloned().unwrap_or_default();
            let node = self.build_access_path(table_ref, base_name, &preds, &mut notes);
            scan_nodes.insert(table_ref.clone(), node);
        }

        let mut refs = ordered_refs.into_iter();
        let first_ref = refs.next().expect("non-empty FROM already handled above");
        let mut running = scan_nodes.remove(&first_ref).expect("scan built above");

        for table_ref in refs {
            let inner = scan_nodes.remove(&table_ref).expect("scan built above");
            let condition = self.find_join_condition(query, &table_ref);
            tracing::debug!(table = %table_ref, rows = inner.estimated_rows, "choosing join algorithm");
            let (node, note) = self
                .join_selector
                .build_join(&self.cost_model, running, inner, condition);
            notes.push(note);
            running = node;
        }

        running = self.apply_final_operators(running, query, &mut notes);

        ExecutionPlan {
            root: running,
            query_sql: query.to_sql(),
            planning_time_ms: elapsed_ms(start),
            is_optimized: true,
            optimization_notes: notes,
        }
    }

    /// Step 1: attaches each qualified WHERE predicate to its base table,
    /// canonicalizing alias references to the base table name up front
    /// (see the design notes on the two-key scheme this simplifies away).
    fn assign_predicates<'q>(
        &self,
        query: &'q Query,
        notes: &mut Vec<String>,
    ) -> HashMap<String, Vec<&'q Predicate>> {
        let mut pushed: HashMap<String, Vec<&Predicate>> = HashMap::new();

        for predicate in &query.predicates {
            let Some(table_ref) = &predicate.table_ref else {
                continue;
            };
            let base_name = query.get_table_name(table_ref).to_string();
            notes.push(format!(
                "Pushed predicate '{predicate}' down to table '{base_name}'"
            ));
            pushed.entry(base_name).or_default().push(predicate);
        }

        pushed
    }

    /// Step 2: orders tables by ascending effective size (row_count times
    /// the combined selectivity of predicates pushed to that table).
    fn order_joins(
        &self,
        query: &Query,
        pushed: &HashMap<String, Vec<&Predicate>>,
        notes: &mut Vec<String>,
    ) -> Vec<String> {
        let mut sized: Vec<(String, f64)> = query
            .tables
            .iter()
            .map(|t| {
                let base_name = t.name.clone();
                let table = self.schema.table_or_fallback(&base_name);
                let stats = self.schema.stats_or_fallback(&base_name);
                let selectivity = pushed
                    .get(&base_name)
                    .map(|preds| combined_selectivity(&stats, preds))
                    .unwrap_or(1.0);
                (t.reference().to_string(), table.row_count as f64 * selectivity)
            })
            .collect();

        sized.sort_by_key(|(_, effective_size)| ordered_float::OrderedFloat(*effective_size));
        let ordered: Vec<String> = sized.into_iter().map(|(r, _)| r).collect();

        let original: Vec<String> = query.tables.iter().map(|t| t.reference().to_string()).collect();
        if ordered != original {
            notes.push(format!(
                "Reordered joins: {} (original: {})",
                ordered.join(" -> "),
                original.join(" -> ")
            ));
        }

        ordered
    }

    /// Step 3: picks Index Scan or Seq Scan for one relation based on the
    /// best index matching its pushed predicates and their combined
    /// selectivity.
    fn build_access_path(
        &self,
        table_ref: &str,
        base_name: &str,
        predicates: &[&Predicate],
        notes: &mut Vec<String>,
    ) -> PlanNode {
        let table = self.schema.table_or_fallback(base_name);
        let stats = self.schema.stats_or_fallback(base_name);

        let selectivity = combined_selectivity(&stats, predicates);
        let columns: Vec<String> = predicates.iter().map(|p| p.column.clone()).collect();
        let operators: Vec<String> = predicates.iter().map(|p| p.operator.clone()).collect();
        let best_index = stats.find_best_index(&columns, &operators);

        let mut node = if let Some(index) = best_index.filter(|_| selectivity < self.config.index_selectivity_threshold)
        {
            let cost = self.cost_model.index_scan(table.row_count, index.cardinality, table.avg_row_size, selectivity);
            notes.push(format!(
                "Using index '{}' on '{base_name}' (selectivity: {:.1}%)",
                index.name,
                selectivity * 100.0
            ));
            PlanNode::new(PhysicalOperator::IndexScan, cost.startup_cost, cost.total_cost, cost.rows, cost.width)
                .with_index_name(index.name.clone())
        } else {
            if best_index.is_some() {
                notes.push(format!(
                    "Seq scan on '{base_name}' (index not worth it for {:.1}% selectivity)",
                    selectivity * 100.0
                ));
            }
            let cost = self.cost_model.seq_scan(table.row_count, table.pages(), table.avg_row_size, selectivity);
            PlanNode::new(PhysicalOperator::SeqScan, cost.startup_cost, cost.total_cost, cost.rows, cost.width)
        };

        node = node.with_table(base_name);
        if table_ref != base_name {
            node = node.with_alias(Some(table_ref.to_string()));
        }
        if !predicates.is_empty() {
            node = node.with_filter(render_predicate_clause(predicates));
        }
        node
    }

    /// Matches an incoming relation to the running outer by searching the
    /// declared joins for one whose right side names it. Falls back to no
    /// condition (an unconditioned join, not an error) when nothing
    /// matches, keeping the planner total rather than assuming
    /// connectivity that a malformed query might not have.
    fn find_join_condition(&self, query: &Query, incoming_ref: &str) -> Option<String> {
        let incoming_base = query.get_table_name(incoming_ref);
        query
            .joins
            .iter()
            .find(|j| j.reference() == incoming_ref || j.table == incoming_base)
            .map(|j| j.to_string())
            .or_else(|| {
                tracing::debug!(table = incoming_ref, "no declared join condition found for relation");
                None
            })
    }

    /// Step 5: appends Sort (for ORDER BY) and Limit (for LIMIT) on top of
    /// the join pipeline.
    fn apply_final_operators(&self, mut node: PlanNode, query: &Query, notes: &mut Vec<String>) -> PlanNode {
        if !query.order_by.is_empty() {
            let cost = self.cost_model.sort(node_cost(&node));
            let sort_keys = query
                .order_by
                .iter()
                .map(|(col, desc)| format!("{col} {}", if *desc { "DESC" } else { "ASC" }))
                .collect();
            node = PlanNode::new(PhysicalOperator::Sort, cost.startup_cost, cost.total_cost, cost.rows, cost.width)
                .with_sort_keys(sort_keys)
                .with_child(node);
        }

        if let Some(limit) = query.limit {
            let cost = self.cost_model.limit(node_cost(&node), limit);
            node = PlanNode::new(PhysicalOperator::Limit, cost.startup_cost, cost.total_cost, cost.rows, cost.width)
                .with_extra("Rows", limit.to_string())
                .with_child(node);
            notes.push(format!("LIMIT {limit} reduces cost by early termination"));
        }

        node
    }

    fn seq_scan_node(&self, table_ref: &str, base_name: &str, selectivity: f64) -> PlanNode {
        let table = self.schema.table_or_fallback(base_name);
        let cost = self.cost_model.seq_scan(table.row_count, table.pages(), table.avg_row_size, selectivity);
        let mut node = PlanNode::new(PhysicalOperator::SeqScan, cost.startup_cost, cost.total_cost, cost.rows, cost.width)
            .with_table(base_name);
        if table_ref != base_name {
            node = node.with_alias(Some(table_ref.to_string()));
        }
        node
    }
}

fn result_node() -> PlanNode {
    PlanNode::new(PhysicalOperator::Result, 0.0, 0.0, 0, 0)
}

fn node_cost(node: &PlanNode) -> Cost {
    Cost {
        startup_cost: node.startup_cost,
        total_cost: node.total_cost,
        rows: node.estimated_rows,
        width: node.width,
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Product of each predicate's individual selectivity (conjunctive, CORE
/// only models AND chains for costing purposes).
fn combined_selectivity(stats: &TableStats, predicates: &[&Predicate]) -> f64 {
    predicates
        .iter()
        .map(|p| match p.value.as_list() {
            Some(values) => stats.in_selectivity(&p.column, values.len()),
            None => stats.selectivity(&p.column, &p.operator, &p.value.as_selectivity_text()),
        })
        .product::<f64>()
        .clamp(0.0, 1.0)
}

fn render_predicate_clause(predicates: &[&Predicate]) -> String {
    let mut clause = String::new();
    for (i, pred) in predicates.iter().enumerate() {
        if i > 0 {
            clause.push(' ');
            clause.push_str(&pred.logical_op.to_string());
            clause.push(' ');
        }
        clause.push_str(&pred.to_string());
    }
    clause
}
