//! Read options and the option/result negotiation contract
//!
//! The engine always hands a backing store the full [`ReadOptions`]; the
//! store answers with a [`ReadResult`] whose applied flags say which
//! constraints it actually executed. The engine then applies only the
//! remainder, in the fixed order filter → order → skip → top
//! ([`ReadResult::apply_remaining`]). Cheap stores return everything with
//! no flags set; query-backed stores claim flags to avoid duplicate work.
//!
//! Filter expressions use JSON objects with optional comparison suffixes
//! (`{"Name": "Room 1", "Seats>": 10}`); order expressions are
//! `"Field"` / `"Field:asc"` / `"Field:desc"`.

use crate::core::record::EntityRecord;
use serde_json::Value;
use std::cmp::Ordering;

/// Caller-requested constraints on a bulk read
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadOptions {
    filter: Option<Value>,
    order: Option<String>,
    skip: Option<usize>,
    skip_token: Option<String>,
    top: Option<usize>,
}

impl ReadOptions {
    /// No constraints at all
    pub fn none() -> Self {
        Self::default()
    }

    /// Start building read options
    pub fn builder() -> ReadOptionsBuilder {
        ReadOptionsBuilder {
            options: Self::default(),
        }
    }

    /// The filter expression, if any
    pub fn filter(&self) -> Option<&Value> {
        self.filter.as_ref()
    }

    /// The order expression, if any
    pub fn order(&self) -> Option<&str> {
        self.order.as_deref()
    }

    /// The skip count, if any
    pub fn skip(&self) -> Option<usize> {
        self.skip
    }

    /// The opaque skip token, if any.
    ///
    /// The engine never interprets the token itself; a store that honors it
    /// reports `skip_applied` on its result.
    pub fn skip_token(&self) -> Option<&str> {
        self.skip_token.as_deref()
    }

    /// The top (limit) count, if any
    pub fn top(&self) -> Option<usize> {
        self.top
    }

    /// Whether no constraint is set
    pub fn is_empty(&self) -> bool {
        self.filter.is_none()
            && self.order.is_none()
            && self.skip.is_none()
            && self.skip_token.is_none()
            && self.top.is_none()
    }
}

/// Builder for [`ReadOptions`]
pub struct ReadOptionsBuilder {
    options: ReadOptions,
}

impl ReadOptionsBuilder {
    pub fn filter(mut self, filter: Value) -> Self {
        self.options.filter = Some(filter);
        self
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.options.order = Some(order.into());
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.options.skip = Some(skip);
        self
    }

    pub fn skip_token(mut self, token: impl Into<String>) -> Self {
        self.options.skip_token = Some(token.into());
        self
    }

    pub fn top(mut self, top: usize) -> Self {
        self.options.top = Some(top);
        self
    }

    pub fn build(self) -> ReadOptions {
        self.options
    }
}

/// A backing store's answer to a constrained read
#[derive(Debug, Clone, Default)]
pub struct ReadResult {
    records: Vec<EntityRecord>,
    filter_applied: bool,
    order_applied: bool,
    skip_applied: bool,
    top_applied: bool,
}

impl ReadResult {
    /// Start building a result around the returned records
    pub fn for_records(records: Vec<EntityRecord>) -> ReadResultBuilder {
        ReadResultBuilder {
            result: ReadResult {
                records,
                ..ReadResult::default()
            },
        }
    }

    /// Start building a result that inherits the applied flags of a prior
    /// result (copy-and-extend).
    pub fn from_result(prior: &ReadResult, records: Vec<EntityRecord>) -> ReadResultBuilder {
        ReadResultBuilder {
            result: ReadResult {
                records,
                filter_applied: prior.filter_applied,
                order_applied: prior.order_applied,
                skip_applied: prior.skip_applied,
                top_applied: prior.top_applied,
            },
        }
    }

    /// An empty result with no flags set
    pub fn empty() -> ReadResult {
        ReadResult::default()
    }

    /// The returned records
    pub fn records(&self) -> &[EntityRecord] {
        &self.records
    }

    /// Consume the result, yielding the records
    pub fn into_records(self) -> Vec<EntityRecord> {
        self.records
    }

    /// Number of returned records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the result is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_filter_applied(&self) -> bool {
        self.filter_applied
    }

    pub fn is_order_applied(&self) -> bool {
        self.order_applied
    }

    pub fn is_skip_applied(&self) -> bool {
        self.skip_applied
    }

    pub fn is_top_applied(&self) -> bool {
        self.top_applied
    }

    /// Apply every constraint the store did not claim, in the required
    /// order: filter, then order, then skip, then top.
    ///
    /// Constraints whose applied flag is already set are left alone — in
    /// particular an already-applied top is never re-truncated.
    pub fn apply_remaining(mut self, options: &ReadOptions) -> ReadResult {
        if let Some(filter) = options.filter() {
            if !self.filter_applied {
                self.records.retain(|record| matches_filter(record, filter));
                self.filter_applied = true;
            }
        }
        if let Some(order) = options.order() {
            if !self.order_applied {
                sort_records(&mut self.records, order);
                self.order_applied = true;
            }
        }
        if let Some(skip) = options.skip() {
            if !self.skip_applied {
                let skip = skip.min(self.records.len());
                self.records.drain(..skip);
                self.skip_applied = true;
            }
        }
        if let Some(top) = options.top() {
            if !self.top_applied {
                self.records.truncate(top);
                self.top_applied = true;
            }
        }
        self
    }
}

/// Builder for [`ReadResult`]
pub struct ReadResultBuilder {
    result: ReadResult,
}

impl ReadResultBuilder {
    /// Mark the filter constraint as already executed by the store
    pub fn filter_applied(mut self) -> Self {
        self.result.filter_applied = true;
        self
    }

    /// Mark the order constraint as already executed by the store
    pub fn order_applied(mut self) -> Self {
        self.result.order_applied = true;
        self
    }

    /// Mark the skip constraint as already executed by the store
    pub fn skip_applied(mut self) -> Self {
        self.result.skip_applied = true;
        self
    }

    /// Mark the top constraint as already executed by the store
    pub fn top_applied(mut self) -> Self {
        self.result.top_applied = true;
        self
    }

    pub fn build(self) -> ReadResult {
        self.result
    }
}

/// Evaluate a JSON-object filter against a record.
///
/// Every entry must match. Keys carry an optional trailing comparison
/// operator; without one the match is by equality. Non-object filters
/// match everything.
pub fn matches_filter(record: &EntityRecord, filter: &Value) -> bool {
    let Some(conditions) = filter.as_object() else {
        return true;
    };
    conditions.iter().all(|(key, expected)| {
        let (property, operator) = split_operator(key);
        let actual = record
            .get(property)
            .and_then(|value| serde_json::to_value(value).ok())
            .unwrap_or(Value::Null);
        match operator {
            Comparison::Eq => compare_values(&actual, expected) == Some(Ordering::Equal),
            Comparison::Gt => compare_values(&actual, expected) == Some(Ordering::Greater),
            Comparison::Lt => compare_values(&actual, expected) == Some(Ordering::Less),
            Comparison::Ge => matches!(
                compare_values(&actual, expected),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Comparison::Le => matches!(
                compare_values(&actual, expected),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    })
}

/// Sort records by an order expression (`"Field"`, `"Field:asc"` or
/// `"Field:desc"`). The sort is stable; incomparable values keep their
/// relative order.
pub fn sort_records(records: &mut [EntityRecord], order: &str) {
    let (property, descending) = match order.split_once(':') {
        Some((property, direction)) => (property, direction.eq_ignore_ascii_case("desc")),
        None => (order, false),
    };
    records.sort_by(|a, b| {
        let left = a
            .get(property)
            .and_then(|value| serde_json::to_value(value).ok())
            .unwrap_or(Value::Null);
        let right = b
            .get(property)
            .and_then(|value| serde_json::to_value(value).ok())
            .unwrap_or(Value::Null);
        let ordering = compare_values(&left, &right).unwrap_or(Ordering::Equal);
        if descending { ordering.reverse() } else { ordering }
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Eq,
    Gt,
    Lt,
    Ge,
    Le,
}

fn split_operator(key: &str) -> (&str, Comparison) {
    if let Some(property) = key.strip_suffix(">=") {
        (property, Comparison::Ge)
    } else if let Some(property) = key.strip_suffix("<=") {
        (property, Comparison::Le)
    } else if let Some(property) = key.strip_suffix('>') {
        (property, Comparison::Gt)
    } else if let Some(property) = key.strip_suffix('<') {
        (property, Comparison::Lt)
    } else {
        (key, Comparison::Eq)
    }
}

/// Compare two JSON values: numbers numerically, strings and booleans by
/// their natural order, nulls equal to each other and smaller than
/// everything else. Values of different kinds are incomparable.
fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Null, _) => Some(Ordering::Less),
        (_, Value::Null) => Some(Ordering::Greater),
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
