//! Entity schemas for the four collections.
//!
//! Field names on the wire follow the payloads already stored on the ledger (camelCase JSON,
//! with a few legacy spellings such as `aadharNumber` and `emailID`). Struct fields use the
//! domain names; serde renames bridge the two.

pub mod claim;
pub mod insurance;
pub mod patient;
pub mod treatment;

pub use claim::InsuranceClaim;
pub use insurance::Insurance;
pub use patient::Patient;
pub use treatment::Treatment;

use crate::registry::Collection;
use crate::validation::SoftReference;
use medledger_types::RecordKey;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A typed record stored in one collection.
pub trait Record:
    Serialize + DeserializeOwned + Clone + PartialEq + std::fmt::Debug + Send + Sync + 'static
{
    /// Collection this record type lives in.
    const COLLECTION: Collection;

    /// Copies the business key into the record for types that embed it.
    ///
    /// Create and Update call this before encoding so a stored record can never disagree with
    /// the key it is stored under.
    fn bind_key(&mut self, _key: &RecordKey) {}

    /// Rejects values that would not survive an encode/decode round trip.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// Soft references this record holds into other collections.
    fn references(&self) -> Vec<SoftReference> {
        Vec::new()
    }

    /// Sample records written by `Initialise`, in seeding order.
    fn seed() -> Vec<(&'static str, Self)>;
}

pub(crate) fn require_finite(field: &str, value: f64) -> Result<(), String> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(format!("{field} must be a finite number, got {value}"))
    }
}
