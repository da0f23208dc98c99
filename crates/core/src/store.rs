//! Contract between the record layer and the external ledger.
//!
//! Every operation in this crate receives a [`LedgerStub`]: a handle scoped to one invocation
//! (one transaction) and one collection namespace. The stub is owned by the ledger platform, not
//! by this crate; the record layer never holds locks or transaction objects of its own.
//!
//! ## Read and write semantics
//!
//! - Reads observe the snapshot the invocation was started against. They do **not** observe the
//!   invocation's own pending writes.
//! - Writes are buffered into the invocation's write set and only take effect if the ledger
//!   validates the transaction at commit time.
//! - Every read is recorded in the invocation's read set. The ledger invalidates the transaction
//!   at commit if any of those reads changed underneath it, which is what makes the
//!   check-then-act existence guard safe across concurrent invocations.

/// Errors raised by the ledger itself.
///
/// These are surfaced to callers unchanged, wrapped in [`crate::LedgerError::Store`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
    #[error("invalid range: start key {start:?} is after end key {end:?}")]
    InvalidRange { start: String, end: String },
    #[error("range iterator failed: {0}")]
    Iterator(String),
    #[error("transaction {tx_id} was invalidated at commit: {code}")]
    TransactionInvalidated {
        tx_id: String,
        code: crate::ledger::ValidationCode,
    },
    #[error("failed to read ledger snapshot: {0}")]
    SnapshotRead(std::io::Error),
    #[error("failed to write ledger snapshot: {0}")]
    SnapshotWrite(std::io::Error),
    #[error("invalid ledger snapshot: {0}")]
    SnapshotFormat(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A raw key/value pair produced by a range scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: Vec<u8>,
}

/// Iterator over a key range of the ledger.
///
/// Range iterators hold ledger resources (a pinned snapshot) and must be released with
/// [`close`](StateIterator::close). `close` must be idempotent; once closed, `next` returns
/// `None`.
pub trait StateIterator: Iterator<Item = StoreResult<KeyValue>> {
    fn close(&mut self);
}

/// Per-invocation handle onto the ledger, bound to one collection namespace.
pub trait LedgerStub {
    type Range: StateIterator;

    /// Identifier the ledger assigned to this invocation.
    fn tx_id(&self) -> &str;

    /// Namespace the invocation was started in.
    fn namespace(&self) -> &str;

    /// Reads the committed value under `key`, or `None` if absent.
    fn get_state(&mut self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Buffers a write of `value` under `key`.
    fn put_state(&mut self, key: &str, value: Vec<u8>) -> StoreResult<()>;

    /// Buffers a deletion of `key`.
    fn del_state(&mut self, key: &str) -> StoreResult<()>;

    /// Opens an ascending scan over `[start, end)`.
    ///
    /// An empty `start` means the beginning of the namespace and an empty `end` means its end, so
    /// `get_state_by_range("", "")` scans the whole namespace.
    fn get_state_by_range(&mut self, start: &str, end: &str) -> StoreResult<Self::Range>;

    /// Reads a key from another namespace on the same ledger.
    ///
    /// The read is recorded in this invocation's read set like any other read.
    fn get_foreign_state(&mut self, namespace: &str, key: &str) -> StoreResult<Option<Vec<u8>>>;
}
