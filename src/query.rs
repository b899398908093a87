//! Logical Query Model
//!
//! An immutable-once-built description of a SELECT over one or more tables,
//! constructed with a fluent builder and rendered back to SQL text for
//! display purposes. Mirrors the subset of relational algebra the optimizer
//! actually plans: projection, FROM, INNER equi-joins, conjunctive WHERE,
//! GROUP BY pass-through, ORDER BY, LIMIT, OFFSET.

use crate::error::QueryBuildError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinType::Inner => write!(f, "INNER"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOp::And => write!(f, "AND"),
            LogicalOp::Or => write!(f, "OR"),
        }
    }
}

/// A literal value carried by a predicate. Kept as loosely typed text/number
/// variants since the CORE only ever needs to render or compare them, never
/// evaluate them.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
}

impl Value {
    /// Canonical selectivity-lookup form: numbers render plainly, text is
    /// unquoted, lists are not expected here (callers use `as_list`).
    pub fn as_selectivity_text(&self) -> String {
        match self {
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => s.clone(),
            Value::List(_) => String::new(),
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "'{s}'"),
            Value::List(items) => {
                let rendered: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "({})", rendered.join(", "))
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

#[derive(Debug, Clone)]
pub struct TableReference {
    pub name: String,
    pub alias: Option<String>,
}

impl TableReference {
    pub fn new(name: impl Into<String>, alias: Option<String>) -> Self {
        Self {
            name: name.into(),
            alias,
        }
    }

    /// The identifier this table is addressed by elsewhere in the query:
    /// its alias if one was given, else its base name.
    pub fn reference(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone)]
pub struct JoinCondition {
    pub table: String,
    pub alias: Option<String>,
    pub left_ref: String,
    pub left_column: String,
    pub right_ref: String,
    pub right_column: String,
    pub join_type: JoinType,
}

impl JoinCondition {
    pub fn reference(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }
}

impl fmt::Display for JoinCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} JOIN {} ON {}.{} = {}.{}",
            self.join_type,
            self.reference(),
            self.left_ref,
            self.left_column,
            self.right_ref,
            self.right_column
        )
    }
}

#[derive(Debug, Clone)]
pub struct Predicate {
    pub table_ref: Option<String>,
    pub column: String,
    pub operator: String,
    pub value: Value,
    pub logical_op: LogicalOp,
}

impl Predicate {
    /// The qualified column this predicate applies to, e.g. `"c.country"`.
    pub fn full_column(&self) -> String {
        match &self.table_ref {
            Some(r) => format!("{r}.{}", self.column),
            None => self.column.clone(),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let col = self.full_column();
        match self.operator.as_str() {
            "IS NULL" | "IS NOT NULL" => write!(f, "{col} {}", self.operator),
            "IN" => write!(f, "{col} IN {}", self.value),
            "BETWEEN" => write!(f, "{col} BETWEEN {}", self.value),
            _ => write!(f, "{col} {} {}", self.operator, self.value),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrderByItem<'a> {
    pub column: &'a str,
    pub desc: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Query {
    pub projections: Vec<String>,
    pub tables: Vec<TableReference>,
    pub joins: Vec<JoinCondition>,
    pub predicates: Vec<Predicate>,
    pub group_by: Vec<String>,
    pub order_by: Vec<(String, bool)>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, columns: &[&str]) -> &mut Self {
        self.projections.extend(columns.iter().map(|c| c.to_string()));
        self
    }

    pub fn from_table(&mut self, name: impl Into<String>, alias: Option<&str>) -> &mut Self {
        self.tables
            .push(TableReference::new(name, alias.map(|a| a.to_string())));
        self
    }

    /// Joins `table` (optionally aliased) on `left_col = right_col`. Column
    /// arguments of the form `"T.c"` split on the first dot into
    /// `(table_ref, column)`. A column with no dot defaults its table side:
    /// the left side to the first declared table's reference, the right
    /// side to the table just being joined.
    pub fn join(
        &mut self,
        table: impl Into<String>,
        alias: Option<&str>,
        left_col: &str,
        right_col: &str,
    ) -> Result<&mut Self, QueryBuildError> {
        let first_table_ref = self
            .tables
            .first()
            .map(|t| t.reference().to_string())
            .ok_or(QueryBuildError::JoinBeforeFromTable)?;

        let table = table.into();
        let this_ref = alias.map(|a| a.to_string()).unwrap_or_else(|| table.clone());

        let (left_ref, left_column) = split_qualified(left_col, &first_table_ref);
        let (right_ref, right_column) = split_qualified(right_col, &this_ref);

        self.joins.push(JoinCondition {
            table,
            alias: alias.map(|a| a.to_string()),
            left_ref,
            left_column,
            right_ref,
            right_column,
            join_type: JoinType::Inner,
        });
        Ok(self)
    }

    pub fn where_(&mut self, column: &str, operator: &str, value: impl Into<Value>) -> &mut Self {
        self.push_predicate(column, operator, value.into(), LogicalOp::And)
    }

    pub fn and_where(&mut self, column: &str, operator: &str, value: impl Into<Value>) -> &mut Self {
        self.push_predicate(column, operator, value.into(), LogicalOp::And)
    }

    pub fn or_where(&mut self, column: &str, operator: &str, value: impl Into<Value>) -> &mut Self {
        self.push_predicate(column, operator, value.into(), LogicalOp::Or)
    }

    fn push_predicate(&mut self, column: &str, operator: &str, value: Value, logical_op: LogicalOp) -> &mut Self {
        let (table_ref, col) = split_optional_qualifier(column);
        self.predicates.push(Predicate {
            table_ref,
            column: col,
            operator: operator.to_string(),
            value,
            logical_op,
        });
        self
    }

    pub fn group_by(&mut self, columns: &[&str]) -> &mut Self {
        self.group_by.extend(columns.iter().map(|c| c.to_string()));
        self
    }

    pub fn order_by(&mut self, column: &str, desc: bool) -> &mut Self {
        self.order_by.push((column.to_string(), desc));
        self
    }

    pub fn limit(&mut self, n: u64) -> &mut Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(&mut self, n: u64) -> &mut Self {
        self.offset = Some(n);
        self
    }

    /// Base table name for a reference (alias or name); returns the input
    /// unchanged if nothing matches.
    pub fn get_table_name<'a>(&'a self, table_ref: &'a str) -> &'a str {
        self.tables
            .iter()
            .find(|t| t.reference() == table_ref)
            .map(|t| t.name.as_str())
            .unwrap_or(table_ref)
    }

    /// Renders the query as SQL text. Deterministic: repeated calls on the
    /// same `Query` yield byte-identical output. Line order is fixed:
    /// SELECT, FROM, JOIN(s), WHERE, GROUP BY, ORDER BY, LIMIT, OFFSET.
    pub fn to_sql(&self) -> String {
        let mut lines = Vec::new();

        let select_list = if self.projections.is_empty() {
            "*".to_string()
        } else {
            self.projections.join(", ")
        };
        lines.push(format!("SELECT {select_list}"));

        if let Some(first) = self.tables.first() {
            let from = match &first.alias {
                Some(alias) => format!("FROM {} {}", first.name, alias),
                None => format!("FROM {}", first.name),
            };
            lines.push(from);
        }

        for join in &self.joins {
            lines.push(join.to_string());
        }

        if !self.predicates.is_empty() {
            let mut clause = String::from("WHERE ");
            for (i, pred) in self.predicates.iter().enumerate() {
                if i > 0 {
                    clause.push(' ');
                    clause.push_str(&pred.logical_op.to_string());
                    clause.push(' ');
                }
                clause.push_str(&pred.to_string());
            }
            lines.push(clause);
        }

        if !self.group_by.is_empty() {
            lines.push(format!("GROUP BY {}", self.group_by.join(", ")));
        }

        if !self.order_by.is_empty() {
            let items: Vec<String> = self
                .order_by
                .iter()
                .map(|(col, desc)| format!("{col} {}", if *desc { "DESC" } else { "ASC" }))
                .collect();
            lines.push(format!("ORDER BY {}", items.join(", ")));
        }

        if let Some(limit) = self.limit {
            lines.push(format!("LIMIT {limit}"));
        }

        if let Some(offset) = self.offset {
            lines.push(format!("OFFSET {offset}"));
        }

        lines.join("\n")
    }
}

fn split_qualified(column: &str, default_ref: &str) -> (String, String) {
    match column.split_once('.') {
        Some((table, col)) => (table.to_string(), col.to_string()),
        None => (default_ref.to_string(), column.to_string()),
    }
}

fn split_optional_qualifier(column: &str) -> (Option<String>, String) {
    match column.split_once('.') {
        Some((table, col)) => (Some(table.to_string()), col.to_string()),
        None => (None, column.to_string()),
    }
}
