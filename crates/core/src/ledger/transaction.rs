use super::{range_bounds, ValidationCode, Version, WorldState};
use crate::store::{KeyValue, LedgerStub, StateIterator, StoreError, StoreResult};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// A range scan recorded in a transaction's read set.
#[derive(Clone, Debug)]
struct RangeRead {
    namespace: String,
    start: String,
    end: String,
    seen: Vec<(String, Version)>,
}

/// One invocation against an [`InMemoryLedger`](super::InMemoryLedger).
///
/// Holds the snapshot the invocation executes against plus its read and write sets. Dropping a
/// transaction without committing it discards it.
#[derive(Debug)]
pub struct Transaction {
    id: String,
    namespace: String,
    snapshot: Arc<WorldState>,
    reads: BTreeMap<(String, String), Option<Version>>,
    range_reads: Vec<RangeRead>,
    writes: BTreeMap<String, Option<Vec<u8>>>,
    open_iterators: Arc<AtomicUsize>,
}

impl Transaction {
    pub(super) fn new(
        namespace: &str,
        snapshot: Arc<WorldState>,
        open_iterators: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            namespace: namespace.to_owned(),
            snapshot,
            reads: BTreeMap::new(),
            range_reads: Vec::new(),
            writes: BTreeMap::new(),
            open_iterators,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub(super) fn namespace_name(&self) -> &str {
        &self.namespace
    }

    pub(super) fn write_set(&self) -> &BTreeMap<String, Option<Vec<u8>>> {
        &self.writes
    }

    /// `(namespace, key)` pairs read so far, in key order.
    pub fn read_keys(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.reads
            .keys()
            .map(|(namespace, key)| (namespace.as_str(), key.as_str()))
    }

    /// Keys written (or deleted) so far, in key order.
    pub fn written_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.writes.keys().map(String::as_str)
    }

    fn record_read(&mut self, namespace: &str, key: &str) -> Option<Vec<u8>> {
        let entry = self.snapshot.get(namespace, key);
        let version = entry.map(|e| e.version);
        let value = entry.map(|e| e.value.clone());
        self.reads
            .entry((namespace.to_owned(), key.to_owned()))
            .or_insert(version);
        value
    }

    /// Checks the read set against `world`, the state produced by everything committed before
    /// this transaction in commit order.
    pub(super) fn validate(&self, world: &WorldState) -> ValidationCode {
        for ((namespace, key), seen) in &self.reads {
            if world.version(namespace, key) != *seen {
                return ValidationCode::MvccReadConflict {
                    namespace: namespace.clone(),
                    key: key.clone(),
                };
            }
        }
        for range in &self.range_reads {
            if world.range_versions(&range.namespace, &range.start, &range.end) != range.seen {
                return ValidationCode::PhantomReadConflict {
                    namespace: range.namespace.clone(),
                    start: range.start.clone(),
                    end: range.end.clone(),
                };
            }
        }
        ValidationCode::Valid
    }
}

impl LedgerStub for Transaction {
    type Range = SnapshotRange;

    fn tx_id(&self) -> &str {
        &self.id
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn get_state(&mut self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let namespace = self.namespace.clone();
        Ok(self.record_read(&namespace, key))
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        self.writes.insert(key.to_owned(), Some(value));
        Ok(())
    }

    fn del_state(&mut self, key: &str) -> StoreResult<()> {
        self.writes.insert(key.to_owned(), None);
        Ok(())
    }

    fn get_state_by_range(&mut self, start: &str, end: &str) -> StoreResult<SnapshotRange> {
        if !end.is_empty() && start > end {
            return Err(StoreError::InvalidRange {
                start: start.to_owned(),
                end: end.to_owned(),
            });
        }

        let seen = self.snapshot.range_versions(&self.namespace, start, end);
        self.range_reads.push(RangeRead {
            namespace: self.namespace.clone(),
            start: start.to_owned(),
            end: end.to_owned(),
            seen,
        });

        Ok(SnapshotRange::open(
            Arc::clone(&self.snapshot),
            self.namespace.clone(),
            range_bounds(start, end),
            Arc::clone(&self.open_iterators),
        ))
    }

    fn get_foreign_state(&mut self, namespace: &str, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.record_read(namespace, key))
    }
}

/// Lazy iterator over a key range of a pinned snapshot.
///
/// Entries are looked up one at a time as the iterator advances, so the cost of a scan the
/// caller abandons early is proportional to what it consumed.
#[derive(Debug)]
pub struct SnapshotRange {
    snapshot: Arc<WorldState>,
    namespace: String,
    lower: Bound<String>,
    upper: Bound<String>,
    open_iterators: Arc<AtomicUsize>,
    closed: bool,
}

impl SnapshotRange {
    fn open(
        snapshot: Arc<WorldState>,
        namespace: String,
        (lower, upper): (Bound<String>, Bound<String>),
        open_iterators: Arc<AtomicUsize>,
    ) -> Self {
        open_iterators.fetch_add(1, Ordering::SeqCst);
        Self {
            snapshot,
            namespace,
            lower,
            upper,
            open_iterators,
            closed: false,
        }
    }
}

impl Iterator for SnapshotRange {
    type Item = StoreResult<KeyValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.closed {
            return None;
        }

        let next = self
            .snapshot
            .namespace(&self.namespace)
            .and_then(|entries| {
                entries
                    .range::<String, _>((self.lower.clone(), self.upper.clone()))
                    .next()
            })
            .map(|(key, entry)| KeyValue {
                key: key.clone(),
                value: entry.value.clone(),
            });

        match next {
            Some(kv) => {
                self.lower = Bound::Excluded(kv.key.clone());
                Some(Ok(kv))
            }
            None => {
                self.close();
                None
            }
        }
    }
}

impl StateIterator for SnapshotRange {
    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.open_iterators.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for SnapshotRange {
    fn drop(&mut self) {
        self.close();
    }
}
