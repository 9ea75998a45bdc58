//! The windowed input buffer.
//!
//! A [`WindowBuffer`] holds the current window of rows in ingestion order
//! and applies the eviction policy on every append, before projection
//! sees the surviving window. Rows carry a lazily filled projection cache
//! that stays valid for the row's whole buffer lifetime.

use crate::rillstream::sql::ast::WindowSpec;
use crate::rillstream::sql::execution::types::{FieldMap, Tuple};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::VecDeque;
use std::sync::Arc;

/// One window entry: the shared tuple, its event timestamp and the cached
/// projection result once it has been computed
#[derive(Debug, Clone)]
pub struct BufferedRow {
    pub tuple: Arc<Tuple>,
    pub timestamp: DateTime<Utc>,
    cache: Option<Arc<FieldMap>>,
    cache_hash: u64,
}

impl BufferedRow {
    fn new(tuple: Arc<Tuple>) -> Self {
        let timestamp = tuple.timestamp;
        Self {
            tuple,
            timestamp,
            cache: None,
            cache_hash: 0,
        }
    }

    /// The cached projection result and its hash, when present
    pub fn cached(&self) -> Option<(Arc<FieldMap>, u64)> {
        self.cache
            .as_ref()
            .map(|result| (result.clone(), self.cache_hash))
    }

    /// Store the projection result for this row; valid until eviction
    pub fn fill_cache(&mut self, result: Arc<FieldMap>, hash: u64) {
        self.cache = Some(result);
        self.cache_hash = hash;
    }
}

/// The current window of rows under a size/eviction policy
pub struct WindowBuffer {
    rows: VecDeque<BufferedRow>,
    spec: WindowSpec,
}

impl WindowBuffer {
    pub fn new(spec: WindowSpec) -> Self {
        let capacity = match spec {
            WindowSpec::Tuples(n) => n as usize + 1,
            WindowSpec::Seconds(_) => 16,
        };
        Self {
            rows: VecDeque::with_capacity(capacity),
            spec,
        }
    }

    /// Append one row and evict per the window policy.
    ///
    /// The reference time for time-based eviction is the event timestamp
    /// of the tuple being appended; out-of-order input is not reordered,
    /// and rows anywhere in the buffer that have fallen out of the window
    /// are dropped — including the one just inserted.
    pub fn append(&mut self, tuple: Arc<Tuple>) {
        let now = tuple.timestamp;
        self.rows.push_back(BufferedRow::new(tuple));
        match self.spec {
            WindowSpec::Tuples(n) => {
                while self.rows.len() > n as usize {
                    self.rows.pop_front();
                }
            }
            WindowSpec::Seconds(d) => {
                if d.is_zero() {
                    // A zero-length window retains nothing
                    self.rows.clear();
                    return;
                }
                let span = TimeDelta::from_std(d).unwrap_or(TimeDelta::MAX);
                if let Some(cutoff) = now.checked_sub_signed(span) {
                    self.rows.retain(|row| row.timestamp >= cutoff);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in ingestion order; references must not be retained across a
    /// subsequent append
    pub fn iter(&self) -> impl Iterator<Item = &BufferedRow> {
        self.rows.iter()
    }

    /// Mutable access in ingestion order, for cache filling
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut BufferedRow> {
        self.rows.iter_mut()
    }
}
