//! Filter chain grammar (spec.md §4.3): a conjunction of per-field clauses.

use crate::value::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum FilterOp {
    Eq(Value),
    StartsWith(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    /// Inclusive both ends.
    Between(Value, Value),
}

impl FilterOp {
    /// Whether this operator can contribute to a prefix-range (as opposed to
    /// only being evaluable as a residual). `StartsWith` on a non-terminal
    /// slot also stops prefix extension per spec.md §4.3; only equality and
    /// `between` narrow a range cleanly for a *middle* slot. The terminal
    /// slot (the last field consumed) may additionally use ordering
    /// operators.
    pub fn is_equality(&self) -> bool { matches!(self, FilterOp::Eq(_)) }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterClause {
    pub field: String,
    pub op: FilterOp,
}

impl FilterClause {
    pub fn new(field: impl Into<String>, op: FilterOp) -> Self { Self { field: field.into(), op } }

    pub fn is_equality(&self) -> bool { self.op.is_equality() }
}

/// A conjunction of clauses. Order of clauses is insignificant to
/// evaluation, but callers typically supply them in query-source order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FilterChain(pub Vec<FilterClause>);

impl FilterChain {
    pub fn new(clauses: Vec<FilterClause>) -> Self { Self(clauses) }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn clauses_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FilterClause> {
        self.0.iter().filter(move |c| c.field == field)
    }
}
