//! In-memory ledger used for development, the CLI and tests.
//!
//! This is a stand-in for the external replicated ledger. It reproduces the behaviour the record
//! layer depends on, and nothing more:
//!
//! - each invocation runs in a [`Transaction`] against an immutable snapshot of world state
//! - reads and range scans are recorded in the transaction's read set
//! - writes are buffered in a write set and applied only if the transaction validates
//! - [`InMemoryLedger::order_and_commit`] validates an ordered batch the way a ledger's commit
//!   stage does: a transaction is invalidated if any key it read (or any range it scanned) was
//!   changed by a transaction earlier in the batch or in an earlier block
//!
//! Ordering, endorsement and gossip are not modelled; a batch is committed in the order given.
//!
//! ## Persistence
//!
//! A ledger created with [`InMemoryLedger::open`] loads world state from a JSON snapshot file and
//! rewrites that file after every committed block.

mod snapshot;
mod transaction;

pub use transaction::{SnapshotRange, Transaction};

use crate::store::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, RwLockWriteGuard};

/// Position of a committed write: the block it was committed in and its index in that block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub block_num: u64,
    pub tx_num: u32,
}

/// Outcome of commit-time validation for one transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationCode {
    Valid,
    /// A key read by the transaction was changed after its snapshot was taken.
    MvccReadConflict { namespace: String, key: String },
    /// The set of keys in a scanned range changed after its snapshot was taken.
    PhantomReadConflict {
        namespace: String,
        start: String,
        end: String,
    },
}

impl ValidationCode {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationCode::Valid)
    }
}

impl std::fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationCode::Valid => write!(f, "valid"),
            ValidationCode::MvccReadConflict { namespace, key } => {
                write!(f, "MVCC read conflict on {namespace}/{key}")
            }
            ValidationCode::PhantomReadConflict {
                namespace,
                start,
                end,
            } => write!(
                f,
                "phantom read conflict on {namespace} range [{start:?}, {end:?})"
            ),
        }
    }
}

/// What the ledger reports back for each transaction in a committed block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitReceipt {
    pub tx_id: String,
    pub block_num: u64,
    pub tx_num: u32,
    pub code: ValidationCode,
    pub committed_at: DateTime<Utc>,
}

/// Result of [`InMemoryLedger::submit`]: the invocation's return value plus its commit receipt.
#[derive(Clone, Debug)]
pub struct Submitted<T> {
    pub value: T,
    pub receipt: CommitReceipt,
}

#[derive(Clone, Debug)]
pub(crate) struct VersionedValue {
    pub(crate) value: Vec<u8>,
    pub(crate) version: Version,
}

/// Committed world state: one flat, ordered key space per namespace.
#[derive(Clone, Debug, Default)]
pub(crate) struct WorldState {
    namespaces: BTreeMap<String, BTreeMap<String, VersionedValue>>,
}

impl WorldState {
    pub(crate) fn namespace(&self, namespace: &str) -> Option<&BTreeMap<String, VersionedValue>> {
        self.namespaces.get(namespace)
    }

    pub(crate) fn get(&self, namespace: &str, key: &str) -> Option<&VersionedValue> {
        self.namespace(namespace).and_then(|entries| entries.get(key))
    }

    pub(crate) fn version(&self, namespace: &str, key: &str) -> Option<Version> {
        self.get(namespace, key).map(|entry| entry.version)
    }

    /// Keys and versions currently inside `[start, end)` of `namespace`.
    pub(crate) fn range_versions(
        &self,
        namespace: &str,
        start: &str,
        end: &str,
    ) -> Vec<(String, Version)> {
        let Some(entries) = self.namespace(namespace) else {
            return Vec::new();
        };
        entries
            .range::<String, _>(range_bounds(start, end))
            .map(|(key, entry)| (key.clone(), entry.version))
            .collect()
    }

    pub(crate) fn insert(&mut self, namespace: &str, key: String, entry: VersionedValue) {
        self.namespaces
            .entry(namespace.to_owned())
            .or_default()
            .insert(key, entry);
    }

    fn apply(
        &mut self,
        namespace: &str,
        writes: &BTreeMap<String, Option<Vec<u8>>>,
        version: Version,
    ) {
        let entries = self.namespaces.entry(namespace.to_owned()).or_default();
        for (key, write) in writes {
            match write {
                Some(value) => {
                    entries.insert(
                        key.clone(),
                        VersionedValue {
                            value: value.clone(),
                            version,
                        },
                    );
                }
                None => {
                    entries.remove(key);
                }
            }
        }
    }

    pub(crate) fn iter(
        &self,
    ) -> impl Iterator<Item = (&String, &BTreeMap<String, VersionedValue>)> + '_ {
        self.namespaces.iter()
    }
}

/// Converts ledger-style range arguments (empty string = open end) into map bounds.
pub(crate) fn range_bounds(start: &str, end: &str) -> (Bound<String>, Bound<String>) {
    let lower = if start.is_empty() {
        Bound::Unbounded
    } else {
        Bound::Included(start.to_owned())
    };
    let upper = if end.is_empty() {
        Bound::Unbounded
    } else {
        Bound::Excluded(end.to_owned())
    };
    (lower, upper)
}

#[derive(Debug, Default)]
pub(crate) struct LedgerState {
    pub(crate) world: Arc<WorldState>,
    pub(crate) height: u64,
}

#[derive(Debug)]
struct Shared {
    state: RwLock<LedgerState>,
    open_iterators: Arc<AtomicUsize>,
    snapshot_path: Option<PathBuf>,
}

/// Handle onto a shared in-memory ledger. Cloning the handle shares the ledger.
#[derive(Clone, Debug)]
pub struct InMemoryLedger {
    shared: Arc<Shared>,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedger {
    /// Creates an empty ledger that lives only in memory.
    pub fn new() -> Self {
        Self::with_state(LedgerState::default(), None)
    }

    /// Opens a ledger backed by a snapshot file.
    ///
    /// If `path` exists its contents are loaded; otherwise the ledger starts empty and the file is
    /// created on the first commit.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::SnapshotRead` or `StoreError::SnapshotFormat` if an existing file
    /// cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let state = if path.exists() {
            snapshot::read(&path)?
        } else {
            LedgerState::default()
        };
        tracing::debug!(
            "opened ledger snapshot {} at height {}",
            path.display(),
            state.height
        );
        Ok(Self::with_state(state, Some(path)))
    }

    fn with_state(state: LedgerState, snapshot_path: Option<PathBuf>) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(state),
                open_iterators: Arc::new(AtomicUsize::new(0)),
                snapshot_path,
            }),
        }
    }

    /// Number of committed blocks.
    pub fn height(&self) -> StoreResult<u64> {
        let state = self
            .shared
            .state
            .read()
            .map_err(|_| StoreError::Unavailable("ledger state lock poisoned".into()))?;
        Ok(state.height)
    }

    /// Number of range iterators that have been opened and not yet closed.
    pub fn open_iterators(&self) -> usize {
        self.shared.open_iterators.load(Ordering::SeqCst)
    }

    /// Starts a new invocation in `namespace` against the current committed state.
    pub fn begin(&self, namespace: &str) -> StoreResult<Transaction> {
        let snapshot = {
            let state = self
                .shared
                .state
                .read()
                .map_err(|_| StoreError::Unavailable("ledger state lock poisoned".into()))?;
            Arc::clone(&state.world)
        };
        Ok(Transaction::new(
            namespace,
            snapshot,
            Arc::clone(&self.shared.open_iterators),
        ))
    }

    /// Commits a single transaction as its own block.
    pub fn commit(&self, tx: Transaction) -> StoreResult<CommitReceipt> {
        let mut receipts = self.order_and_commit(vec![tx])?;
        receipts
            .pop()
            .ok_or_else(|| StoreError::Unavailable("commit produced no receipt".into()))
    }

    /// Validates and commits an ordered batch of transactions as one block.
    ///
    /// Each transaction is validated against the state left by the valid transactions before it.
    /// Invalid transactions are discarded without effect; their receipts carry the reason.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::SnapshotWrite` if the ledger is file-backed and the snapshot cannot be
    /// written. Nothing in the block is applied in that case and the height is unchanged.
    pub fn order_and_commit(&self, batch: Vec<Transaction>) -> StoreResult<Vec<CommitReceipt>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let mut state = self.write_state()?;
        let block_num = state.height + 1;
        let committed_at = Utc::now();
        let mut receipts = Vec::with_capacity(batch.len());

        // Built aside and installed only once persisted.
        let mut next = LedgerState {
            world: Arc::clone(&state.world),
            height: block_num,
        };
        let world = Arc::make_mut(&mut next.world);
        for (index, tx) in batch.into_iter().enumerate() {
            let tx_num = u32::try_from(index).unwrap_or(u32::MAX);
            let code = tx.validate(world);
            if code.is_valid() {
                world.apply(
                    tx.namespace_name(),
                    tx.write_set(),
                    Version { block_num, tx_num },
                );
                tracing::debug!(
                    tx_id = tx.id(),
                    block_num,
                    tx_num,
                    writes = tx.write_set().len(),
                    "transaction committed"
                );
            } else {
                tracing::warn!(tx_id = tx.id(), block_num, "transaction invalidated: {code}");
            }
            receipts.push(CommitReceipt {
                tx_id: tx.id().to_owned(),
                block_num,
                tx_num,
                code,
                committed_at,
            });
        }

        if let Some(path) = &self.shared.snapshot_path {
            snapshot::write(path, &next)?;
        }
        *state = next;

        Ok(receipts)
    }

    /// Runs one invocation and commits it.
    ///
    /// If the invocation returns an error nothing is committed. If it succeeds but the ledger
    /// invalidates it at commit, `StoreError::TransactionInvalidated` is returned.
    pub fn submit<T, E, F>(&self, namespace: &str, invocation: F) -> Result<Submitted<T>, E>
    where
        E: From<StoreError>,
        F: FnOnce(&mut Transaction) -> Result<T, E>,
    {
        let mut tx = self.begin(namespace)?;
        let value = invocation(&mut tx)?;
        let receipt = self.commit(tx)?;
        if !receipt.code.is_valid() {
            return Err(StoreError::TransactionInvalidated {
                tx_id: receipt.tx_id,
                code: receipt.code,
            }
            .into());
        }
        Ok(Submitted { value, receipt })
    }

    /// Runs one invocation against current state without committing it.
    pub fn evaluate<T, E, F>(&self, namespace: &str, invocation: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnOnce(&mut Transaction) -> Result<T, E>,
    {
        let mut tx = self.begin(namespace)?;
        invocation(&mut tx)
    }

    fn write_state(&self) -> StoreResult<RwLockWriteGuard<'_, LedgerState>> {
        self.shared
            .state
            .write()
            .map_err(|_| StoreError::Unavailable("ledger state lock poisoned".into()))
    }
}
