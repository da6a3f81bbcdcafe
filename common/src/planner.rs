//! Filter engine (C3, spec.md §4.3): compile a filter chain into a
//! residual predicate and a prefix-range hint against a chosen index
//! definition.

use crate::codec::{encode_field, upper_bound, CodecError, SEPARATOR};
use crate::index_spec::IndexDefinition;
use crate::predicate::{FilterChain, FilterOp};
use crate::value::Value;

/// One side of a derived range. Mirrors the teacher's planner `Bound` shape
/// (storage/common's `planner.rs`), specialized to raw encoded bytes since
/// this crate's "index" is a byte-ordered KV namespace rather than a typed
/// column store.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    Unbounded,
    Inclusive(Vec<u8>),
    Exclusive(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFilter {
    /// Lower bound of the derived scan range.
    pub from: Bound,
    /// Upper bound of the derived scan range.
    pub to: Bound,
    /// The filter chain re-evaluated against every candidate. Per spec.md
    /// §4.3 this is always the *full* original chain: the prefix range is a
    /// conservative superset, clauses on non-pushed fields aren't
    /// narrowable, and multiple ranges on one field can't both be pushed
    /// into the key range.
    pub residual: FilterChain,
}

/// Intersect two candidate lower bounds on the same field, keeping the
/// tighter (larger) one. Ties prefer the inclusive bound loosening, i.e. an
/// exclusive bound at the same value wins (it is the tighter constraint).
fn tighter_low(a: Option<(Value, bool)>, b: (Value, bool)) -> Option<(Value, bool)> {
    match a {
        None => Some(b),
        Some(existing) => {
            let cmp = compare_values(&existing.0, &b.0);
            Some(match cmp {
                std::cmp::Ordering::Less => b,
                std::cmp::Ordering::Greater => existing,
                std::cmp::Ordering::Equal => {
                    if !existing.1 || !b.1 {
                        (existing.0, false)
                    } else {
                        existing
                    }
                }
            })
        }
    }
}

fn tighter_high(a: Option<(Value, bool)>, b: (Value, bool)) -> Option<(Value, bool)> {
    match a {
        None => Some(b),
        Some(existing) => {
            let cmp = compare_values(&existing.0, &b.0);
            Some(match cmp {
                std::cmp::Ordering::Greater => b,
                std::cmp::Ordering::Less => existing,
                std::cmp::Ordering::Equal => {
                    if !existing.1 || !b.1 {
                        (existing.0, false)
                    } else {
                        existing
                    }
                }
            })
        }
    }
}

fn compare_values(a: &Value, b: &Value) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::DateTime(x), Value::DateTime(y)) => x.cmp(y),
        (Value::Reference(x), Value::Reference(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// Compile `chain` against `index`, walking its fields in order and
/// consuming leading clauses that narrow the prefix (spec.md §4.3).
pub fn compile(chain: &FilterChain, index: &IndexDefinition) -> Result<CompiledFilter, CodecError> {
    // `prefix` accumulates the shared equality-consumed bytes. `tail_low`/
    // `tail_high` hold the low/high byte contribution of the first
    // non-equality field, if any — walking stops there since a
    // non-equality clause cannot be narrowed further by subsequent fields
    // (spec.md §4.3).
    let mut prefix = Vec::new();
    let mut tail_low: Option<Vec<u8>> = None;
    let mut tail_high: Option<(Vec<u8>, bool)> = None;

    for part in &index.fields {
        let clauses: Vec<_> = chain.clauses_for(&part.field).collect();
        if clauses.is_empty() {
            break;
        }

        if let Some(eq) = clauses.iter().find(|c| c.is_equality()).and_then(|c| match &c.op {
            FilterOp::Eq(v) => Some(v),
            _ => None,
        }) {
            let bytes = encode_field(eq, part.field_type, part.padding())?;
            prefix.extend(&bytes);
            prefix.push(SEPARATOR);
            continue;
        }

        // Non-equality clauses on this field: derive the tightest low/high
        // (intersecting multiple clauses on the same field), then stop.
        let mut low: Option<(Value, bool)> = None;
        let mut high: Option<(Value, bool)> = None;
        for clause in &clauses {
            match &clause.op {
                FilterOp::Gt(v) => low = tighter_low(low, (v.clone(), false)),
                FilterOp::Gte(v) => low = tighter_low(low, (v.clone(), true)),
                FilterOp::Lt(v) => high = tighter_high(high, (v.clone(), false)),
                FilterOp::Lte(v) => high = tighter_high(high, (v.clone(), true)),
                FilterOp::Between(lo, hi) => {
                    low = tighter_low(low, (lo.clone(), true));
                    high = tighter_high(high, (hi.clone(), true));
                }
                FilterOp::StartsWith(v) => {
                    low = tighter_low(low, (v.clone(), true));
                    high = tighter_high(high, (v.clone(), true));
                }
                FilterOp::Eq(_) => unreachable!("handled above"),
            }
        }

        if let Some((v, _inclusive)) = low {
            // An exclusive low bound is approximated as inclusive: the
            // prefix range becomes a conservative superset and the residual
            // re-checks the exact comparison (spec.md §4.3(c)).
            tail_low = Some(encode_field(&v, part.field_type, part.padding())?);
        }
        if let Some((v, inclusive)) = high {
            tail_high = Some((encode_field(&v, part.field_type, part.padding())?, inclusive));
        }
        break;
    }

    let from = match &tail_low {
        Some(bytes) => {
            let mut b = prefix.clone();
            b.extend(bytes);
            Bound::Inclusive(b)
        }
        None if prefix.is_empty() => Bound::Unbounded,
        None => Bound::Inclusive(prefix.clone()),
    };

    let to = match &tail_high {
        Some((bytes, inclusive)) => {
            let mut b = prefix.clone();
            b.extend(bytes);
            Bound::Exclusive(if *inclusive { upper_bound(b) } else { b })
        }
        None if prefix.is_empty() => Bound::Unbounded,
        None => Bound::Exclusive(upper_bound(prefix)),
    };

    Ok(CompiledFilter { from, to, residual: chain.clone() })
}
