//! Schema & Statistics Model
//!
//! Tables, columns, indexes, and per-column statistics, plus the two
//! computed services the optimizer leans on hardest: selectivity estimation
//! and best-index selection.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Column data types. Purely descriptive — the cost model never branches on
/// this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Integer,
    Varchar,
    Decimal,
    Timestamp,
    Text,
    Serial,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub is_primary_key: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            is_primary_key: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.nullable = false;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub row_count: u64,
    pub avg_row_size: u32,
    pub total_pages: u64,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            row_count: 0,
            avg_row_size: 100,
            total_pages: 0,
        }
    }

    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_row_count(mut self, row_count: u64) -> Self {
        self.row_count = row_count;
        self
    }

    pub fn with_avg_row_size(mut self, avg_row_size: u32) -> Self {
        self.avg_row_size = avg_row_size;
        self
    }

    pub fn with_total_pages(mut self, total_pages: u64) -> Self {
        self.total_pages = total_pages;
        self
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Table is treated as occupying at least one page regardless of what
    /// was recorded for it.
    pub fn pages(&self) -> u64 {
        self.total_pages.max(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub table_name: String,
    pub columns: Vec<String>,
    pub is_unique: bool,
    pub is_primary: bool,
    pub cardinality: u64,
    pub pages: u64,
}

impl Index {
    pub fn new(name: impl Into<String>, table_name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            table_name: table_name.into(),
            columns,
            is_unique: false,
            is_primary: false,
            cardinality: 0,
            pages: 0,
        }
    }

    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self.is_unique = true;
        self
    }

    pub fn with_cardinality(mut self, cardinality: u64) -> Self {
        self.cardinality = cardinality;
        self
    }

    pub fn with_pages(mut self, pages: u64) -> Self {
        self.pages = pages;
        self
    }

    pub fn is_composite(&self) -> bool {
        self.columns.len() > 1
    }

    /// True iff `cols` is a prefix of this index's column list (prefix
    /// match, not set containment).
    pub fn covers_columns(&self, cols: &[String]) -> bool {
        if cols.len() > self.columns.len() {
            return false;
        }
        &self.columns[..cols.len()] == cols
    }
}

/// A single statistical value used for min/max bounds. Stored as a string so
/// the model stays agnostic to column type; numeric comparisons parse on
/// demand, matching how the upstream catalog hands these values over.
pub type StatValue = String;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnStats {
    pub distinct_count: u64,
    pub null_fraction: f64,
    pub min_value: Option<StatValue>,
    pub max_value: Option<StatValue>,
    pub most_common_values: Vec<StatValue>,
    pub most_common_freqs: Vec<f64>,
}

impl ColumnStats {
    pub fn new(distinct_count: u64) -> Self {
        Self {
            distinct_count,
            ..Default::default()
        }
    }

    pub fn with_null_fraction(mut self, null_fraction: f64) -> Self {
        self.null_fraction = null_fraction;
        self
    }

    pub fn with_range(mut self, min: impl Into<String>, max: impl Into<String>) -> Self {
        self.min_value = Some(min.into());
        self.max_value = Some(max.into());
        self
    }
}

/// Default selectivity used whenever the catalog cannot answer better:
/// unknown column, unknown operator, or a numeric range that can't be
/// parsed.
pub const DEFAULT_SELECTIVITY: f64 = 0.1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableStats {
    pub table_name: String,
    pub column_stats: HashMap<String, ColumnStats>,
    pub indexes: Vec<Index>,
}

impl TableStats {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            column_stats: HashMap::new(),
            indexes: Vec::new(),
        }
    }

    pub fn with_column_stats(mut self, column: impl Into<String>, stats: ColumnStats) -> Self {
        self.column_stats.insert(column.into(), stats);
        self
    }

    pub fn with_index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    /// Estimate the fraction of rows a single predicate retains. Always in
    /// `[0, 1]`.
    pub fn selectivity(&self, column: &str, operator: &str, value: &str) -> f64 {
        let Some(stats) = self.column_stats.get(column) else {
            return DEFAULT_SELECTIVITY;
        };

        let raw = match operator {
            "=" => {
                if stats.distinct_count > 0 {
                    1.0 / stats.distinct_count as f64
                } else {
                    0.01
                }
            }
            "<" | "<=" | ">" | ">=" => {
                if let (Some(min), Some(max)) = (&stats.min_value, &stats.max_value) {
                    if let (Ok(min), Ok(max), Ok(v)) =
                        (min.parse::<f64>(), max.parse::<f64>(), value.parse::<f64>())
                    {
                        let range = max - min;
                        if range > 0.0 {
                            if operator == "<" || operator == "<=" {
                                (v - min) / range
                            } else {
                                (max - v) / range
                            }
                        } else {
                            0.33
                        }
                    } else {
                        0.33
                    }
                } else {
                    0.33
                }
            }
            "LIKE" => {
                if !value.starts_with('%') {
                    0.1
                } else {
                    0.5
                }
            }
            "IS NULL" => stats.null_fraction,
            "IS NOT NULL" => 1.0 - stats.null_fraction,
            _ => DEFAULT_SELECTIVITY,
        };

        raw.clamp(0.0, 1.0)
    }

    /// Selectivity for an `IN (...)` predicate given the number of values in
    /// the list.
    pub fn in_selectivity(&self, column: &str, value_count: usize) -> f64 {
        match self.column_stats.get(column) {
            Some(stats) if stats.distinct_count > 0 => {
                (value_count as f64 / stats.distinct_count as f64).min(1.0)
            }
            _ => DEFAULT_SELECTIVITY,
        }
    }

    /// Find the index that best matches a conjunction of (column, operator)
    /// pairs, walking each index's columns left to right. A match on `=` or
    /// `IN` at position *i* scores +2 and the walk continues; a match on a
    /// range operator scores +1 and the walk stops; any other mismatch stops
    /// the walk with no further score. The highest-scoring index wins
    /// (first-seen breaks ties); an index that never scores above zero is
    /// not returned.
    pub fn find_best_index(&self, columns: &[String], operators: &[String]) -> Option<&Index> {
        let mut best: Option<&Index> = None;
        let mut best_score = 0i32;

        for index in &self.indexes {
            let mut score = 0i32;
            for (i, col) in columns.iter().enumerate() {
                if i < index.columns.len() && &index.columns[i] == col {
                    match operators.get(i).map(String::as_str) {
                        Some("=") | Some("IN") => score += 2,
                        Some("<") | Some("<=") | Some(">") | Some(">=") => {
                            score += 1;
                            break;
                        }
                        _ => break,
                    }
                } else {
                    break;
                }
            }

            if score > best_score {
                best_score = score;
                best = Some(index);
            }
        }

        best
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    pub tables: HashMap<String, Table>,
    pub table_stats: HashMap<String, TableStats>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table. When `stats` is omitted, an empty [`TableStats`] is
    /// created automatically so lookups never need to special-case a
    /// missing entry.
    pub fn add_table(&mut self, table: Table, stats: Option<TableStats>) {
        let name = table.name.clone();
        let stats = stats.unwrap_or_else(|| TableStats::new(name.clone()));
        self.tables.insert(name.clone(), table);
        self.table_stats.insert(name, stats);
    }

    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn get_stats(&self, name: &str) -> Option<&TableStats> {
        self.table_stats.get(name)
    }

    /// A table unknown to the schema still gets planned against: a
    /// synthetic table of 1000 rows and no statistics, invisible to the
    /// caller. This keeps the planner total (see crate-level error-handling
    /// notes).
    pub fn table_or_fallback(&self, name: &str) -> Table {
        match self.get_table(name) {
            Some(table) => table.clone(),
            None => {
                tracing::debug!(table = name, "unknown table, falling back to synthetic stats");
                Table::new(name).with_row_count(1000).with_avg_row_size(100)
            }
        }
    }

    pub fn stats_or_fallback(&self, name: &str) -> TableStats {
        self.get_stats(name).cloned().unwrap_or_else(|| TableStats::new(name))
    }
}
