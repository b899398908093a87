//! Plan comparator
//!
//! Renders a naïve and an optimized plan side by side with a cost delta, the
//! way a downstream EXPLAIN-style tool would.

use crate::plan::ExecutionPlan;
use std::fmt::Write;

/// Emits both plans under "PLAN 1 (Before Optimization)" / "PLAN 2 (After
/// Optimization)" headers, then a cost delta line, then the optimized
/// plan's notes, bulleted.
pub fn compare_plans(naive: &ExecutionPlan, optimized: &ExecutionPlan) -> String {
    let mut out = String::new();

    writeln!(out, "PLAN COMPARISON").unwrap();
    writeln!(out, "{}", "=".repeat(60)).unwrap();

    writeln!(out, "\nPLAN 1 (Before Optimization):").unwrap();
    writeln!(out, "{}", "-".repeat(60)).unwrap();
    write!(out, "{}", naive.root.format(0)).unwrap();
    writeln!(out, "Cost: {:.2}", naive.total_cost()).unwrap();

    writeln!(out, "\nPLAN 2 (After Optimization):").unwrap();
    writeln!(out, "{}", "-".repeat(60)).unwrap();
    write!(out, "{}", optimized.root.format(0)).unwrap();
    writeln!(out, "Cost: {:.2}", optimized.total_cost()).unwrap();

    writeln!(out, "\n{}", "-".repeat(60)).unwrap();

    let before = naive.total_cost();
    let after = optimized.total_cost();
    let delta = before - after;

    if before > after {
        let percent = (delta / before) * 100.0;
        writeln!(out, "Cost Improvement: {delta:.2} ({percent:.1}% reduction)").unwrap();
    } else if before < after {
        writeln!(out, "Cost Increase: {:.2} (optimization not beneficial)", delta.abs()).unwrap();
    } else {
        writeln!(out, "No cost difference").unwrap();
    }

    if !optimized.optimization_notes.is_empty() {
        writeln!(out, "\nOptimizations Applied:").unwrap();
        for note in &optimized.optimization_notes {
            writeln!(out, "  - {note}").unwrap();
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{PhysicalOperator, PlanNode};

    fn plan(total: f64, notes: Vec<String>) -> ExecutionPlan {
        ExecutionPlan {
            root: PlanNode::new(PhysicalOperator::SeqScan, 0.0, total, 100, 64).with_table("t"),
            query_sql: "SELECT * FROM t".to_string(),
            planning_time_ms: 0.1,
            is_optimized: !notes.is_empty(),
            optimization_notes: notes,
        }
    }

    #[test]
    fn reports_improvement_when_optimized_is_cheaper() {
        let naive = plan(100.0, vec![]);
        let optimized = plan(40.0, vec!["Using index 'idx' on 't'".to_string()]);
        let report = compare_plans(&naive, &optimized);
        assert!(report.contains("Cost Improvement"));
        assert!(report.contains("60.0%"));
        assert!(report.contains("Optimizations Applied"));
    }

    #[test]
    fn reports_no_difference_when_costs_match() {
        let naive = plan(50.0, vec![]);
        let optimized = plan(50.0, vec![]);
        let report = compare_plans(&naive, &optimized);
        assert!(report.contains("No cost difference"));
    }

    #[test]
    fn reports_increase_when_optimized_is_worse() {
        let naive = plan(10.0, vec![]);
        let optimized = plan(20.0, vec![]);
        let report = compare_plans(&naive, &optimized);
        assert!(report.contains("Cost Increase"));
        assert!(report.contains("not beneficial"));
    }
}
