//! # MedLedger Core
//!
//! Record layer for the healthcare ledger: patients, treatments, insurance policies and
//! insurance claims stored as JSON payloads in a replicated key-value ledger.
//!
//! This crate contains:
//! - the [`store::LedgerStub`] contract the record layer runs against
//! - an in-memory optimistic-concurrency [`ledger::InMemoryLedger`] implementing it
//! - typed records and their codec
//! - existence-guarded CRUD and range scans ([`repositories::shared::RecordService`])
//! - the [`dispatch::Dispatcher`] that maps invocation names to typed handlers
//!
//! **No API concerns**: HTTP servers and command-line handling belong in `api-rest` and `cli`.

pub mod codec;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod error;
pub mod ledger;
pub mod records;
pub mod registry;
pub mod repositories;
pub mod store;
pub mod validation;

pub use codec::RecordCodec;
pub use config::CoreConfig;
pub use dispatch::{Dispatcher, FunctionInfo, Operation};
pub use error::{ErrorKind, LedgerError, LedgerResult};
pub use ledger::{CommitReceipt, InMemoryLedger, Submitted, Transaction, ValidationCode};
pub use records::{Insurance, InsuranceClaim, Patient, Record, Treatment};
pub use registry::{Collection, CollectionRegistry, UnknownCollection};
pub use repositories::shared::{Entry, RecordService};
pub use store::{LedgerStub, StateIterator, StoreError};
pub use validation::ReferenceValidation;

pub use medledger_types::{NonEmptyText, RecordKey};
