use crate::Record;
use serde_json::Value;
use std::cmp::Ordering;

/// Sort direction for [`OrderBy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

/// A single row predicate. A missing column reads as `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    Neq(String, Value),
    Gt(String, Value),
    Gte(String, Value),
    Lt(String, Value),
    Lte(String, Value),
    In(String, Vec<Value>),
    IsNull(String),
    NotNull(String),
}

impl Filter {
    pub fn column(&self) -> &str {
        match self {
            Filter::Eq(c, _)
            | Filter::Neq(c, _)
            | Filter::Gt(c, _)
            | Filter::Gte(c, _)
            | Filter::Lt(c, _)
            | Filter::Lte(c, _)
            | Filter::In(c, _)
            | Filter::IsNull(c)
            | Filter::NotNull(c) => c,
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        let actual = record.get(self.column()).unwrap_or(&Value::Null);
        let equal = if is_key_column(self.column()) {
            keys_equal
        } else {
            values_equal
        };
        match self {
            Filter::Eq(_, v) => equal(actual, v),
            Filter::Neq(_, v) => !actual.is_null() && !values_equal(actual, v),
            Filter::Gt(_, v) => compare_values(actual, v) == Some(Ordering::Greater),
            Filter::Gte(_, v) => matches!(
                compare_values(actual, v),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Filter::Lt(_, v) => compare_values(actual, v) == Some(Ordering::Less),
            Filter::Lte(_, v) => matches!(
                compare_values(actual, v),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Filter::In(_, vs) => vs.iter().any(|v| equal(actual, v)),
            Filter::IsNull(_) => actual.is_null(),
            Filter::NotNull(_) => !actual.is_null(),
        }
    }
}

/// Builder for a filtered select/count/update/delete against one table.
///
/// ```
/// use recordfix_store::{Direction, Query};
///
/// let q = Query::table("judge_court_assignments")
///     .eq("judge_id", "j1")
///     .order_by("start_date", Direction::Desc)
///     .limit(10);
/// assert_eq!(q.filters.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    pub filters: Vec<Filter>,
    pub order: Vec<OrderBy>,
    pub limit: Option<usize>,
    /// Projection; `None` selects every column.
    pub columns: Option<Vec<String>>,
}

impl Query {
    pub fn table(table: &str) -> Self {
        Self {
            table: table.to_string(),
            filters: vec![],
            order: vec![],
            limit: None,
            columns: None,
        }
    }

    /// Shorthand for `table(..).eq("id", id)`.
    pub fn by_id(table: &str, id: &str) -> Self {
        Self::table(table).eq("id", id)
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = Some(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::Eq(column.to_string(), value.into()))
    }

    pub fn neq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::Neq(column.to_string(), value.into()))
    }

    pub fn gt(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::Gt(column.to_string(), value.into()))
    }

    pub fn gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::Gte(column.to_string(), value.into()))
    }

    pub fn lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::Lt(column.to_string(), value.into()))
    }

    pub fn lte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::Lte(column.to_string(), value.into()))
    }

    pub fn in_list<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.filter(Filter::In(column.to_string(), values))
    }

    pub fn is_null(self, column: &str) -> Self {
        self.filter(Filter::IsNull(column.to_string()))
    }

    pub fn not_null(self, column: &str) -> Self {
        self.filter(Filter::NotNull(column.to_string()))
    }

    pub fn order_by(mut self, column: &str, direction: Direction) -> Self {
        self.order.push(OrderBy {
            column: column.to_string(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.filters.iter().all(|f| f.matches(record))
    }

    /// Order `rows` by the query's sort keys. Nulls sort last ascending and
    /// first descending. The sort is stable.
    pub fn sort(&self, rows: &mut [Record]) {
        if self.order.is_empty() {
            return;
        }
        rows.sort_by(|a, b| {
            for key in &self.order {
                let av = a.get(&key.column).unwrap_or(&Value::Null);
                let bv = b.get(&key.column).unwrap_or(&Value::Null);
                let ord = match (av.is_null(), bv.is_null()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    (false, false) => compare_values(av, bv).unwrap_or(Ordering::Equal),
                };
                let ord = match key.direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
    }

    /// Apply the projection to one row.
    pub fn project(&self, record: &Record) -> Record {
        match &self.columns {
            None => record.clone(),
            Some(cols) => cols
                .iter()
                .map(|c| (c.clone(), record.get(c).cloned().unwrap_or(Value::Null)))
                .collect(),
        }
    }
}

/// Equality with numeric normalization (`42 == 42.0`).
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

/// `id` and `*_id` columns hold keys, which datasets store as either strings
/// or numbers.
fn is_key_column(column: &str) -> bool {
    column == "id" || column.ends_with("_id")
}

fn key_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Key equality by text form, so `7` matches `"7"`.
pub fn keys_equal(a: &Value, b: &Value) -> bool {
    match (key_text(a), key_text(b)) {
        (Some(x), Some(y)) => x == y,
        _ => values_equal(a, b),
    }
}

/// Ordering for comparable scalar pairs: numbers, strings (ISO dates compare
/// lexicographically) and booleans. Mixed or null operands are incomparable.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
