//! The change-emission differ.
//!
//! Derives RSTREAM/ISTREAM/DSTREAM outputs from the previous and current
//! result sets of one evaluation cycle. Both sets are multisets: duplicate
//! window entries projecting to identical records are accounted for
//! individually. Equality is by content hash with a deep re-compare on
//! collision; order inside ISTREAM/DSTREAM output is unspecified.

use crate::rillstream::sql::ast::Emitter;
use crate::rillstream::sql::execution::types::{maps_deep_equal, FieldMap};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// A projected output record plus the hash of its content.
///
/// ResultRows live for one evaluation cycle; the record itself may be
/// shared with a buffered row's cache.
#[derive(Debug, Clone)]
pub struct ResultRow {
    pub row: Arc<FieldMap>,
    pub hash: u64,
}

/// Compute the output records for one cycle under the given emitter
pub fn emit(emitter: Emitter, prev: &[ResultRow], cur: &[ResultRow]) -> Vec<FieldMap> {
    match emitter {
        Emitter::Rstream => cur.iter().map(|result| (*result.row).clone()).collect(),
        Emitter::Istream => multiset_difference(cur, prev),
        Emitter::Dstream => multiset_difference(prev, cur),
    }
}

/// `left − right` as multisets: every record of `left` that occurs more
/// often there than in `right`, with the excess multiplicity
fn multiset_difference(left: &[ResultRow], right: &[ResultRow]) -> Vec<FieldMap> {
    let mut remaining: FxHashMap<u64, Vec<&Arc<FieldMap>>> = FxHashMap::default();
    for result in right {
        remaining.entry(result.hash).or_default().push(&result.row);
    }

    let mut output = Vec::new();
    for result in left {
        if let Some(bucket) = remaining.get_mut(&result.hash) {
            // Hash collisions between unequal records must not cancel out
            let matched = bucket
                .iter()
                .position(|candidate| maps_deep_equal(candidate, &result.row));
            if let Some(pos) = matched {
                bucket.swap_remove(pos);
                continue;
            }
        }
        output.push((*result.row).clone());
    }
    output
}
