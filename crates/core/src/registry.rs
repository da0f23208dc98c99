//! Collection registry.
//!
//! The four collections share one ledger but each lives in its own namespace, the way separately
//! deployed contracts each get their own key space. Business keys are stored verbatim inside
//! their namespace, so `PATIENT1` in the patient collection and `PATIENT1` in the treatment
//! collection are different records. Callers conventionally still use distinguishing prefixes
//! (`PATIENT1`, `TREATMENT1`, `CLAIM1`) but nothing depends on it.

use crate::config::CoreConfig;
use crate::error::{ErrorKind, LedgerResult};
use crate::ledger::InMemoryLedger;
use crate::records::{Insurance, InsuranceClaim, Patient, Record, Treatment};
use crate::repositories::shared::RecordService;
use std::str::FromStr;
use std::sync::Arc;

/// The logical collections managed by this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collection {
    Patient,
    Treatment,
    Insurance,
    InsuranceClaim,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Patient,
        Collection::Treatment,
        Collection::Insurance,
        Collection::InsuranceClaim,
    ];

    /// Ledger namespace holding this collection's records.
    pub fn namespace(self) -> &'static str {
        match self {
            Collection::Patient => "patient",
            Collection::Treatment => "treatment",
            Collection::Insurance => "insurance",
            Collection::InsuranceClaim => "insuranceclaim",
        }
    }

    /// Stem used to build ledger function names (`CreateClaim`, `GetAllPatients`, ...).
    pub fn function_stem(self) -> &'static str {
        match self {
            Collection::Patient => "Patient",
            Collection::Treatment => "Treatment",
            Collection::Insurance => "Insurance",
            Collection::InsuranceClaim => "Claim",
        }
    }

    /// Human-readable name used in error messages and logs.
    pub fn display_name(self) -> &'static str {
        match self {
            Collection::Patient => "patient",
            Collection::Treatment => "treatment",
            Collection::Insurance => "insurance",
            Collection::InsuranceClaim => "claim",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Error returned when a collection name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown collection: {0}")]
pub struct UnknownCollection(pub String);

impl FromStr for Collection {
    type Err = UnknownCollection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "patient" | "patients" => Ok(Collection::Patient),
            "treatment" | "treatments" => Ok(Collection::Treatment),
            "insurance" | "insurances" => Ok(Collection::Insurance),
            "claim" | "claims" | "insuranceclaim" | "insurance-claim" | "insurance_claim" => {
                Ok(Collection::InsuranceClaim)
            }
            _ => Err(UnknownCollection(s.to_owned())),
        }
    }
}

/// Hands out typed services for every collection, all sharing one core configuration.
#[derive(Clone, Debug)]
pub struct CollectionRegistry {
    cfg: Arc<CoreConfig>,
}

impl CollectionRegistry {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Service for record type `R`, for code that is generic over the collection.
    pub fn service<R: Record>(&self) -> RecordService<R> {
        RecordService::new(self.cfg.clone())
    }

    /// Seeds every collection with its sample records, one committed invocation each.
    ///
    /// Referenced collections go first (insurance, patient, treatment, claim) so seeding also
    /// passes under enforced reference validation. A collection whose seed keys are already
    /// present is skipped. Returns the collections that were seeded.
    pub fn seed_all(&self, ledger: &InMemoryLedger) -> LedgerResult<Vec<Collection>> {
        let mut seeded = Vec::new();
        for (collection, fresh) in [
            (Collection::Insurance, self.seed::<Insurance>(ledger)?),
            (Collection::Patient, self.seed::<Patient>(ledger)?),
            (Collection::Treatment, self.seed::<Treatment>(ledger)?),
            (Collection::InsuranceClaim, self.seed::<InsuranceClaim>(ledger)?),
        ] {
            if fresh {
                seeded.push(collection);
            }
        }
        Ok(seeded)
    }

    fn seed<R: Record>(&self, ledger: &InMemoryLedger) -> LedgerResult<bool> {
        let service = self.service::<R>();
        match ledger.submit(R::COLLECTION.namespace(), |tx| service.initialise(tx)) {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                tracing::info!(collection = %R::COLLECTION, "already seeded, skipping");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}
