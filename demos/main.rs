//! Demo harness: builds the simulated e-commerce schema, runs spec §8's five
//! literal end-to-end scenarios through both the naïve and optimized
//! pipelines, and prints the comparison report for each. Not part of the
//! library surface — this binary is the only place a `tracing` subscriber
//! gets installed.

use anyhow::Context;
use meridian_query_optimizer::{
    compare_plans, Column, ColumnStats, DataType, Index, Query, QueryOptimizer, Schema, Table,
    TableStats,
};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let schema = simulated_schema();
    let optimizer = QueryOptimizer::new(schema);
    let mut queries = sample_queries();
    let (last_name, last_query) = queries.pop().expect("at least one sample query");

    for (name, query) in &queries {
        println!("\n{}", "#".repeat(70));
        println!("# {name}");
        println!("{}", "#".repeat(70));

        let naive = optimizer.build_naive_plan(query);
        let optimized = optimizer.optimize(query);
        println!("{}", compare_plans(&naive, &optimized));
    }

    println!("\n{}", "#".repeat(70));
    println!("# {last_name}");
    println!("{}", "#".repeat(70));
    let naive = optimizer.build_naive_plan(&last_query);
    let optimized = optimizer.optimize(&last_query);
    println!("{}", compare_plans(&naive, &optimized));

    let json = serde_json::to_string_pretty(&optimized).context("serializing optimized plan to JSON")?;
    println!("\nMachine-readable plan (JSON):\n{json}");

    Ok(())
}

/// The "simulated schema" fixture from spec §8: categories, customers,
/// products, orders, and order_items at e-commerce scale. Mirrors
/// `create_simulated_schema()` field for field, including the one index each
/// table actually has (no index on `customers.country`, which is exactly
/// what makes Scenario A a Seq Scan).
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

/// Spec §8's five literal end-to-end scenarios (A through E), in order.
fn sample_queries() -> Vec<(&'static str, Query)> {
    let mut queries = Vec::new();

    let mut a = Query::new();
    a.select(&["c.id"]);
    a.from_table("customers", Some("c"));
    a.where_("c.country", "=", "USA");
    queries.push(("Scenario A: single-table equality filter, no index", a));

    let mut b = Query::new();
    b.select(&["c.name", "o.id", "o.total", "o.status"]);
    b.from_table("customers", Some("c"));
    b.join("orders", Some("o"), "c.id", "o.customer_id").unwrap();
    b.where_("c.country", "=", "France");
    b.and_where("o.status", "=", "delivered");
    queries.push(("Scenario B: two-table join, both sides over threshold", b));

    let mut c = Query::new();
    c.select(&["c.name", "c.country", "o.total", "p.name", "cat.name"]);
    c.from_table("orders", Some("o"));
    c.join("customers", Some("c"), "o.customer_id", "c.id").unwrap();
    c.join("order_items", Some("oi"), "o.id", "oi.order_id").unwrap();
    c.join("products", Some("p"), "oi.product_id", "p.id").unwrap();
    c.join("categories", Some("cat"), "p.category_id", "cat.id").unwrap();
    c.where_("c.country", "=", "Japan");
    c.and_where("o.status", "=", "shipped");
    c.and_where("cat.name", "=", "Category 38");
    c.order_by("o.total", true);
    c.limit(50);
    queries.push(("Scenario C: five-table join, categories leads, Sort + Limit", c));

    let mut d = Query::new();
    d.select(&["p.name", "p.price", "cat.name"]);
    d.from_table("products", Some("p"));
    d.join("categories", Some("cat"), "p.category_id", "cat.id").unwrap();
    d.where_("p.price", ">", 500.0);
    d.and_where("p.price", "<", 900.0);
    d.order_by("p.price", true);
    queries.push(("Scenario D: range filter, no suitable index, Sort with no Limit", d));

    let e = Query::new();
    queries.push(("Scenario E: empty query, zero-cost Result", e));

    queries
}
