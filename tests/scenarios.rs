//! End-to-end scenarios over the simulated e-commerce schema, encoding spec
//! §8's five literal end-to-end scenarios (A-E) verbatim: each asserts the
//! optimized plan chooses the expected access path, join order, and/or join
//! algorithm, and never costs more than the naïve baseline.

use meridian_query_optimizer::{
    Column, ColumnStats, DataType, Index, PhysicalOperator, Query, QueryOptimizer, Schema, Table,
    TableStats,
};

/// The "simulated schema" fixture from spec §8: categories=100,
/// customers=10_000 with an index on `id` only, products=5_000 with an
/// index on `category_id`, orders=50_000 with an index on `customer_id`,
/// order_items=150_000 with a composite index on (order_id, product_id).
/// Field-for-field copy of `create_simulated_schema()`'s ground truth —
/// duplicated rather than shared with the demo binary's fixture, mirroring
/// that function being called independently by each Python consumer.
fn simulated_schema() -> Schema {
    let mut schema = Schema::new();

    schema.add_table(
        Table::new("categories")
            .with_columns(vec![
                Column::new("id", DataType::Serial).primary_key(),
                Column::new("name", DataType::Varchar).not_null(),
                Column::new("description", DataType::Text),
            ])
            .with_row_count(100)
            .with_avg_row_size(150)
            .with_total_pages(2),
        Some(
            TableStats::new("categories")
                .with_column_stats("id", ColumnStats::new(100))
                .with_column_stats("name", ColumnStats::new(100))
                .with_index(
                    Index::new("categories_pkey", "categories", vec!["id".into()])
                        .primary()
                        .with_cardinality(100),
                ),
        ),
    );

    schema.add_table(
        Table::new("customers")
            .with_columns(vec![
                Column::new("id", DataType::Serial).primary_key(),
                Column::new("name", DataType::Varchar).not_null(),
                Column::new("email", DataType::Varchar).not_null(),
                Column::new("country", DataType::Varchar),
                Column::new("created_at", DataType::Timestamp),
            ])
            .with_row_count(10_000)
            .with_avg_row_size(200)
            .with_total_pages(250),
        Some(
            TableStats::new("customers")
                .with_column_stats("id", ColumnStats::new(10_000))
                .with_column_stats("name", ColumnStats::new(9_500))
                .with_column_stats("email", ColumnStats::new(10_000))
                .with_column_stats("country", ColumnStats::new(10))
                .with_index(
                    Index::new("customers_pkey", "customers", vec!["id".into()])
                        .primary()
                        .with_cardinality(10_000),
                ),
        ),
    );

    schema.add_table(
        Table::new("products")
            .with_columns(vec![
                Column::new("id", DataType::Serial).primary_key(),
                Column::new("name", DataType::Varchar).not_null(),
                Column::new("category_id", DataType::Integer),
                Column::new("price", DataType::Decimal).not_null(),
                Column::new("stock_quantity", DataType::Integer),
            ])
            .with_row_count(5_000)
            .with_avg_row_size(180)
            .with_total_pages(110),
        Some(
            TableStats::new("products")
                .with_column_stats("id", ColumnStats::new(5_000))
                .with_column_stats("name", ColumnStats::new(5_000))
                .with_column_stats("category_id", ColumnStats::new(100))
                .with_column_stats("price", ColumnStats::new(1_000).with_range("1.0", "1000.0"))
                .with_index(
                    Index::new("products_pkey", "products", vec!["id".into()])
                        .primary()
                        .with_cardinality(5_000),
                )
                .with_index(
                    Index::new("idx_products_category", "products", vec!["category_id".into()])
                        .with_cardinality(100),
                ),
        ),
    );

    schema.add_table(
        Table::new("orders")
            .with_columns(vec![
                Column::new("id", DataType::Serial).primary_key(),
                Column::new("customer_id", DataType::Integer),
                Column::new("order_date", DataType::Timestamp),
                Column::new("total", DataType::Decimal),
                Column::new("status", DataType::Varchar),
            ])
            .with_row_count(50_000)
            .with_avg_row_size(120)
            .with_total_pages(750),
        Some(
            TableStats::new("orders")
                .with_column_stats("id", ColumnStats::new(50_000))
                .with_column_stats("customer_id", ColumnStats::new(10_000))
                .with_column_stats("status", ColumnStats::new(4))
                .with_column_stats("total", ColumnStats::new(10_000).with_range("10.0", "1010.0"))
                .with_index(
                    Index::new("orders_pkey", "orders", vec!["id".into()])
                        .primary()
                        .with_cardinality(50_000),
                )
                .with_index(
                    Index::new("idx_orders_customer", "orders", vec!["customer_id".into()])
                        .with_cardinality(10_000),
                ),
        ),
    );

    schema.add_table(
        Table::new("order_items")
            .with_columns(vec![
                Column::new("id", DataType::Serial).primary_key(),
                Column::new("order_id", DataType::Integer),
                Column::new("product_id", DataType::Integer),
                Column::new("quantity", DataType::Integer).not_null(),
                Column::new("unit_price", DataType::Decimal).not_null(),
            ])
            .with_row_count(150_000)
            .with_avg_row_size(80)
            .with_total_pages(1_500),
        Some(
            TableStats::new("order_items")
                .with_column_stats("id", ColumnStats::new(150_000))
                .with_column_stats("order_id", ColumnStats::new(50_000))
                .with_column_stats("product_id", ColumnStats::new(5_000))
                .with_index(
                    Index::new("order_items_pkey", "order_items", vec!["id".into()])
                        .primary()
                        .with_cardinality(150_000),
                )
                .with_index(
                    Index::new(
                        "idx_orderitems_order_product",
                        "order_items",
                        vec!["order_id".into(), "product_id".into()],
                    )
                    .with_cardinality(150_000),
                ),
        ),
    );

    schema
}

fn assert_never_worse(optimizer: &QueryOptimizer, query: &Query) {
    let naive = optimizer.build_naive_plan(query);
    let optimized = optimizer.optimize(query);
    assert!(
        optimized.total_cost() <= naive.total_cost() + 1e-6,
        "optimized plan ({:.2}) costs more than naive ({:.2})",
        optimized.total_cost(),
        naive.total_cost()
    );
}

/// Scenario A: `SELECT c.id FROM customers c WHERE c.country = 'USA'`.
/// `country` has 10 distinct values (selectivity 0.1, above the 0.20
/// threshold is false here, but there is no index on `country` at all), so
/// the only available access path is a Seq Scan with a filter.
#[test]
fn scenario_a_single_table_equality_with_no_index_uses_seq_scan() {
    let optimizer = QueryOptimizer::new(simulated_schema());
    let mut q = Query::new();
    q.select(&["c.id"]);
    q.from_table("customers", Some("c"));
    q.where_("c.country", "=", "USA");

    let plan = optimizer.optimize(&q);
    assert_eq!(plan.root.operator, PhysicalOperator::SeqScan);
    assert_eq!(plan.root.filter_condition.as_deref(), Some("c.country = 'USA'"));
    assert!(plan.optimization_notes.iter().any(|n| n.contains("Pushed predicate")));
    assert_never_worse(&optimizer, &q);
}

/// Scenario B: `customers c JOIN orders o ON c.id = o.customer_id WHERE
/// c.country = 'France' AND o.status = 'delivered'`. Both relations exceed
/// the 100-row hash-join threshold after predicate pushdown (customers:
/// 10_000 * 0.1 = 1_000; orders: 50_000 * 0.25 = 12_500), so the pipeline
/// picks Hash Join. Customers is already the smaller effective relation in
/// the declared order, so no reorder note fires here — the ascending-size
/// sort is a no-op, not a swap, for this particular pair of selectivities.
#[test]
fn scenario_b_two_table_join_prefers_hash_join_after_pushdown() {
    let optimizer = QueryOptimizer::new(simulated_schema());
    let mut q = Query::new();
    q.select(&["c.name", "o.id", "o.total", "o.status"]);
    q.from_table("customers", Some("c"));
    q.join("orders", Some("o"), "c.id", "o.customer_id").unwrap();
    q.where_("c.country", "=", "France");
    q.and_where("o.status", "=", "delivered");

    let optimized = optimizer.optimize(&q);
    assert_eq!(optimized.root.operator, PhysicalOperator::HashJoin);
    assert_eq!(optimized.optimization_notes.iter().filter(|n| n.contains("Pushed predicate")).count(), 2);
    assert!(optimized.optimization_notes.iter().any(|n| n.contains("Using Hash Join")));
    assert_never_worse(&optimizer, &q);
}

/// Scenario C: the five-table join (orders→customers→order_items→
/// products→categories), filtered on country/status/category name, sorted
/// by total descending with a limit. `categories` is the smallest effective
/// relation (100 rows, further cut by the `cat.name` equality) and leads
/// the left-deep join chain; the plan ends in Sort → Limit, and the naïve
/// plan (all Nested Loop, no pushdown, no reordering) costs strictly more.
#[test]
fn scenario_c_five_table_join_leads_with_categories_and_ends_sort_limit() {
    let optimizer = QueryOptimizer::new(simulated_schema());
    let mut q = Query::new();
    q.select(&["c.name", "c.country", "o.total", "p.name", "cat.name"]);
    q.from_table("orders", Some("o"));
    q.join("customers", Some("c"), "o.customer_id", "c.id").unwrap();
    q.join("order_items", Some("oi"), "o.id", "oi.order_id").unwrap();
    q.join("products", Some("p"), "oi.product_id", "p.id").unwrap();
    q.join("categories", Some("cat"), "p.category_id", "cat.id").unwrap();
    q.where_("c.country", "=", "Japan");
    q.and_where("o.status", "=", "shipped");
    q.and_where("cat.name", "=", "Category 38");
    q.order_by("o.total", true);
    q.limit(50);

    let naive = optimizer.build_naive_plan(&q);
    let optimized = optimizer.optimize(&q);

    assert!(optimized.optimization_notes.iter().any(|n| n.starts_with("Reordered joins") && n.contains("cat ->")));
    assert_eq!(optimized.root.operator, PhysicalOperator::Limit);
    assert_eq!(optimized.root.children[0].operator, PhysicalOperator::Sort);
    assert!(optimized.total_cost() < naive.total_cost());
    assert_never_worse(&optimizer, &q);
}

/// Scenario D: `products p JOIN categories cat WHERE p.price > 500 AND
/// p.price < 900 ORDER BY p.price DESC`. No index covers `price`, so
/// products is a Seq Scan; the plan ends in Sort with no Limit.
#[test]
fn scenario_d_range_filter_on_products_seq_scans_and_sorts_without_limit() {
    let optimizer = QueryOptimizer::new(simulated_schema());
    let mut q = Query::new();
    q.select(&["p.name", "p.price", "cat.name"]);
    q.from_table("products", Some("p"));
    q.join("categories", Some("cat"), "p.category_id", "cat.id").unwrap();
    q.where_("p.price", ">", 500.0);
    q.and_where("p.price", "<", 900.0);
    q.order_by("p.price", true);

    let optimized = optimizer.optimize(&q);
    assert_eq!(optimized.root.operator, PhysicalOperator::Sort);
    assert_never_worse(&optimizer, &q);
}

/// Scenario E: an empty Query (no tables). Both builders return a plan
/// whose root is a Result with zero cost and zero rows.
#[test]
fn scenario_e_empty_query_yields_zero_cost_result() {
    let optimizer = QueryOptimizer::new(simulated_schema());
    let q = Query::new();

    let naive = optimizer.build_naive_plan(&q);
    let optimized = optimizer.optimize(&q);

    for plan in [&naive, &optimized] {
        assert_eq!(plan.root.operator, PhysicalOperator::Result);
        assert_eq!(plan.root.total_cost, 0.0);
        assert_eq!(plan.root.estimated_rows, 0);
    }
}
