use crate::registry::Collection;
use crate::store::StoreError;
use medledger_types::TextError;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("{collection} with ID {key} does not exist")]
    NotFound { collection: Collection, key: String },
    #[error("{collection} with ID {key} already exists")]
    AlreadyExists { collection: Collection, key: String },
    #[error("failed to decode {collection} {key} at {path}: {source}")]
    Codec {
        collection: Collection,
        key: String,
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode {collection}: {source}")]
    Encode {
        collection: Collection,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid key: {0}")]
    InvalidKey(#[from] TextError),
    #[error("invalid argument {name} for {function}: {reason}")]
    InvalidArgument {
        function: String,
        name: String,
        reason: String,
    },
    #[error("{function} expects {expected} arguments, got {actual}")]
    ArgumentCount {
        function: String,
        expected: usize,
        actual: usize,
    },
    #[error("unknown function {function} for {collection}")]
    UnknownFunction {
        collection: Collection,
        function: String,
    },
    #[error("invalid dispatch table: {0}")]
    DispatchTable(String),
    #[error("{collection} {field} references missing {target} {key:?}")]
    DanglingReference {
        collection: Collection,
        field: &'static str,
        target: Collection,
        key: String,
    },
}

/// Coarse classification of a [`LedgerError`], for callers that map errors onto a transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    Codec,
    UnderlyingStore,
    /// The ledger discarded the transaction at commit because of a concurrent conflicting write.
    Conflict,
    InvalidInput,
    DanglingReference,
    Internal,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::NotFound { .. } => ErrorKind::NotFound,
            LedgerError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            LedgerError::Codec { .. } | LedgerError::Encode { .. } => ErrorKind::Codec,
            LedgerError::Store(StoreError::TransactionInvalidated { .. }) => ErrorKind::Conflict,
            LedgerError::Store(_) => ErrorKind::UnderlyingStore,
            LedgerError::InvalidInput(_)
            | LedgerError::InvalidKey(_)
            | LedgerError::InvalidArgument { .. }
            | LedgerError::ArgumentCount { .. }
            | LedgerError::UnknownFunction { .. } => ErrorKind::InvalidInput,
            LedgerError::DanglingReference { .. } => ErrorKind::DanglingReference,
            LedgerError::DispatchTable(_) => ErrorKind::Internal,
        }
    }
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;
