//! Residual predicate evaluation: re-checks every clause of a filter chain
//! against a candidate record (spec.md §4.3, §4.5).

use crate::predicate::{FilterChain, FilterOp};
use crate::value::Value;
use std::cmp::Ordering;

/// Anything that can answer "what is the value of field X" for a candidate
/// document — either the decoded index key's named groups, or a primary
/// record lookup, per spec.md §4.5.
pub trait Filterable {
    fn field_value(&self, field: &str) -> Option<Value>;
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.partial_cmp(y),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::DateTime(x), Value::DateTime(y)) => Some(x.cmp(y)),
        (Value::Reference(x), Value::Reference(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn eval_op(actual: &Value, op: &FilterOp) -> bool {
    match op {
        FilterOp::Eq(v) => compare(actual, v) == Some(Ordering::Equal),
        FilterOp::StartsWith(v) => match (actual, v) {
            (Value::String(a), Value::String(b)) => a.starts_with(b.as_str()),
            _ => false,
        },
        FilterOp::Gt(v) => compare(actual, v) == Some(Ordering::Greater),
        FilterOp::Gte(v) => matches!(compare(actual, v), Some(Ordering::Greater) | Some(Ordering::Equal)),
        FilterOp::Lt(v) => compare(actual, v) == Some(Ordering::Less),
        FilterOp::Lte(v) => matches!(compare(actual, v), Some(Ordering::Less) | Some(Ordering::Equal)),
        FilterOp::Between(lo, hi) => {
            matches!(compare(actual, lo), Some(Ordering::Greater) | Some(Ordering::Equal))
                && matches!(compare(actual, hi), Some(Ordering::Less) | Some(Ordering::Equal))
        }
    }
}

/// Evaluate every clause of `chain` against `subject`, conjunctively. A
/// clause whose field is absent from the subject fails the match.
pub fn evaluate<F: Filterable>(chain: &FilterChain, subject: &F) -> bool {
    chain.0.iter().all(|clause| match subject.field_value(&clause.field) {
        Some(actual) => eval_op(&actual, &clause.op),
        None => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::FilterClause;
    use std::collections::BTreeMap;

    struct MapSubject(BTreeMap<String, Value>);
    impl Filterable for MapSubject {
        fn field_value(&self, field: &str) -> Option<Value> { self.0.get(field).cloned() }
    }

    #[test]
    fn conjunction_requires_all_clauses() {
        let mut map = BTreeMap::new();
        map.insert("category".to_string(), Value::String("news".into()));
        map.insert("title".to_string(), Value::String("Breaking".into()));
        let subject = MapSubject(map);

        let chain = FilterChain::new(vec![
            FilterClause::new("category", FilterOp::Eq(Value::String("news".into()))),
            FilterClause::new("title", FilterOp::StartsWith(Value::String("A".into()))),
        ]);
        assert!(!evaluate(&chain, &subject));

        let chain2 = FilterChain::new(vec![FilterClause::new("title", FilterOp::StartsWith(Value::String("Break".into())))]);
        assert!(evaluate(&chain2, &subject));
    }

    #[test]
    fn missing_field_fails_clause() {
        let subject = MapSubject(BTreeMap::new());
        let chain = FilterChain::new(vec![FilterClause::new("rank", FilterOp::Gte(Value::Number(1.0)))]);
        assert!(!evaluate(&chain, &subject));
    }
}
