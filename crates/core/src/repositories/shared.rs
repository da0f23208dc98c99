//! Existence-guarded CRUD shared by every collection.
//!
//! Every mutation follows the same check-then-act protocol against the invocation's stub:
//!
//! | Operation | Requires | Result            | Failure                     |
//! |-----------|----------|-------------------|-----------------------------|
//! | create    | absent   | present           | `AlreadyExists`             |
//! | update    | present  | present (replace) | `NotFound`                  |
//! | delete    | present  | absent            | `NotFound`                  |
//!
//! The existence probe is an ordinary read, so it lands in the invocation's read set. Two
//! invocations that both see a key as absent and both create it cannot both commit: the ledger
//! invalidates whichever is ordered second. No lock is taken here.
//!
//! A key counts as present only if the stored value is non-empty.

use crate::codec::RecordCodec;
use crate::config::CoreConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::records::Record;
use crate::registry::Collection;
use crate::repositories::scan::RecordScan;
use crate::store::LedgerStub;
use crate::validation::check_references;
use medledger_types::RecordKey;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;

/// A record together with the key it is stored under.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Entry<R> {
    pub key: String,
    pub record: R,
}

/// Record operations for one collection.
///
/// The service holds configuration only. Ledger state always arrives through the `stub`
/// argument, which is scoped to a single invocation.
#[derive(Debug)]
pub struct RecordService<R> {
    cfg: Arc<CoreConfig>,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for RecordService<R> {
    fn clone(&self) -> Self {
        Self {
            cfg: Arc::clone(&self.cfg),
            _record: PhantomData,
        }
    }
}

impl<R: Record> RecordService<R> {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self {
            cfg,
            _record: PhantomData,
        }
    }

    pub fn collection(&self) -> Collection {
        R::COLLECTION
    }

    /// Returns whether a non-empty value is stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidKey` for an empty key, or the store error unchanged.
    pub fn exists<S: LedgerStub>(&self, stub: &mut S, key: &str) -> LedgerResult<bool> {
        let key = RecordKey::new(key)?;
        self.probe(stub, &key)
    }

    /// Stores `record` under `key`, which must not already hold a record.
    ///
    /// Records that embed their own key have it overwritten with `key` first.
    ///
    /// # Returns
    ///
    /// The record as written.
    ///
    /// # Errors
    ///
    /// - `LedgerError::AlreadyExists` if `key` is present.
    /// - `LedgerError::InvalidInput` if the record fails validation.
    /// - `LedgerError::DanglingReference` if reference validation is enforced and a reference
    ///   does not resolve.
    pub fn create<S: LedgerStub>(&self, stub: &mut S, key: &str, mut record: R) -> LedgerResult<R> {
        let key = RecordKey::new(key)?;
        record.bind_key(&key);
        record.validate().map_err(LedgerError::InvalidInput)?;

        if self.probe(stub, &key)? {
            return Err(LedgerError::AlreadyExists {
                collection: R::COLLECTION,
                key: key.into_string(),
            });
        }

        self.write(stub, &key, &record, "created")?;
        Ok(record)
    }

    /// Reads the record stored under `key`.
    ///
    /// # Errors
    ///
    /// - `LedgerError::NotFound` if `key` is absent.
    /// - `LedgerError::Codec` if the stored payload does not decode. A payload that fails to
    ///   decode is never reported as absent.
    pub fn read<S: LedgerStub>(&self, stub: &mut S, key: &str) -> LedgerResult<R> {
        let key = RecordKey::new(key)?;
        match stub.get_state(key.as_str())? {
            Some(bytes) if !bytes.is_empty() => RecordCodec::decode(key.as_str(), &bytes),
            _ => Err(LedgerError::NotFound {
                collection: R::COLLECTION,
                key: key.into_string(),
            }),
        }
    }

    /// Replaces the record stored under `key` wholesale.
    ///
    /// # Errors
    ///
    /// `LedgerError::NotFound` if `key` is absent, otherwise as for [`create`](Self::create).
    pub fn update<S: LedgerStub>(&self, stub: &mut S, key: &str, mut record: R) -> LedgerResult<R> {
        let key = RecordKey::new(key)?;
        record.bind_key(&key);
        record.validate().map_err(LedgerError::InvalidInput)?;

        if !self.probe(stub, &key)? {
            return Err(LedgerError::NotFound {
                collection: R::COLLECTION,
                key: key.into_string(),
            });
        }

        self.write(stub, &key, &record, "updated")?;
        Ok(record)
    }

    /// Removes the record stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::NotFound` if `key` is absent.
    pub fn delete<S: LedgerStub>(&self, stub: &mut S, key: &str) -> LedgerResult<()> {
        let key = RecordKey::new(key)?;
        if !self.probe(stub, &key)? {
            return Err(LedgerError::NotFound {
                collection: R::COLLECTION,
                key: key.into_string(),
            });
        }

        stub.del_state(key.as_str())?;
        tracing::debug!(
            tx_id = stub.tx_id(),
            collection = %R::COLLECTION,
            key = key.as_str(),
            "record deleted"
        );
        Ok(())
    }

    /// Opens a lazy scan over every record in the collection, in ascending key order.
    ///
    /// The underlying range iterator is released when the scan is exhausted, fails, or is
    /// dropped, whichever comes first.
    pub fn scan<S: LedgerStub>(&self, stub: &mut S) -> LedgerResult<RecordScan<R, S::Range>> {
        let range = stub.get_state_by_range("", "")?;
        Ok(RecordScan::new(range))
    }

    /// Every record in the collection, in ascending key order.
    ///
    /// # Errors
    ///
    /// The first decode or iterator error aborts the whole listing.
    pub fn list_all<S: LedgerStub>(&self, stub: &mut S) -> LedgerResult<Vec<R>> {
        self.scan(stub)?
            .map(|entry| entry.map(|entry| entry.record))
            .collect()
    }

    /// Like [`list_all`](Self::list_all) but keeps each record's key.
    pub fn list_entries<S: LedgerStub>(&self, stub: &mut S) -> LedgerResult<Vec<Entry<R>>> {
        self.scan(stub)?.collect()
    }

    /// Seeds the collection's sample records through [`create`](Self::create).
    ///
    /// Running it a second time fails with `AlreadyExists` on the first seed key.
    ///
    /// # Returns
    ///
    /// The seeded entries, in seeding order.
    pub fn initialise<S: LedgerStub>(&self, stub: &mut S) -> LedgerResult<Vec<Entry<R>>> {
        let mut seeded = Vec::new();
        for (key, record) in R::seed() {
            let record = self.create(stub, key, record)?;
            seeded.push(Entry {
                key: key.to_owned(),
                record,
            });
        }

        tracing::info!(
            tx_id = stub.tx_id(),
            collection = %R::COLLECTION,
            count = seeded.len(),
            "collection initialised"
        );
        Ok(seeded)
    }

    fn probe<S: LedgerStub>(&self, stub: &mut S, key: &RecordKey) -> LedgerResult<bool> {
        debug_assert_eq!(stub.namespace(), R::COLLECTION.namespace());
        Ok(stub
            .get_state(key.as_str())?
            .is_some_and(|value| !value.is_empty()))
    }

    fn write<S: LedgerStub>(
        &self,
        stub: &mut S,
        key: &RecordKey,
        record: &R,
        action: &'static str,
    ) -> LedgerResult<()> {
        check_references(self.cfg.reference_validation(), stub, record)?;
        let bytes = RecordCodec::encode(record)?;
        stub.put_state(key.as_str(), bytes)?;
        tracing::debug!(
            tx_id = stub.tx_id(),
            collection = %R::COLLECTION,
            key = key.as_str(),
            "record {action}"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::ledger::{InMemoryLedger, ValidationCode};
    use crate::records::{Insurance, InsuranceClaim, Patient, Treatment};
    use crate::store::{LedgerStub, StateIterator, StoreError};
    use crate::validation::ReferenceValidation;

    fn service<R: Record>(policy: ReferenceValidation) -> RecordService<R> {
        let cfg = CoreConfig::new("medledger.test", policy).expect("config");
        RecordService::new(Arc::new(cfg))
    }

    fn seed_record<R: Record>(key: &str) -> R {
        R::seed()
            .into_iter()
            .find(|(k, _)| *k == key)
            .map(|(_, record)| record)
            .expect("seed record")
    }

    fn submit<R, T>(
        ledger: &InMemoryLedger,
        f: impl FnOnce(&mut crate::ledger::Transaction) -> LedgerResult<T>,
    ) -> LedgerResult<T>
    where
        R: Record,
    {
        ledger
            .submit(R::COLLECTION.namespace(), f)
            .map(|submitted| submitted.value)
    }

    #[test]
    fn test_create_then_read_round_trips() {
        let ledger = InMemoryLedger::new();
        let patients = service::<Patient>(ReferenceValidation::Disabled);
        let patient: Patient = seed_record("PATIENT1");

        submit::<Patient, _>(&ledger, |tx| patients.create(tx, "PATIENT1", patient.clone()))
            .unwrap();
        let read = submit::<Patient, _>(&ledger, |tx| patients.read(tx, "PATIENT1")).unwrap();

        assert_eq!(read, patient);
    }

    #[test]
    fn test_second_create_fails_and_keeps_first_value() {
        let ledger = InMemoryLedger::new();
        let patients = service::<Patient>(ReferenceValidation::Disabled);
        let first: Patient = seed_record("PATIENT1");
        let mut second = first.clone();
        second.name = "Someone Else".into();

        submit::<Patient, _>(&ledger, |tx| patients.create(tx, "PATIENT1", first.clone())).unwrap();
        let err = submit::<Patient, _>(&ledger, |tx| patients.create(tx, "PATIENT1", second))
            .expect_err("duplicate create should fail");
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);

        let read = submit::<Patient, _>(&ledger, |tx| patients.read(tx, "PATIENT1")).unwrap();
        assert_eq!(read, first);
    }

    #[test]
    fn test_update_of_absent_key_is_not_found_and_creates_nothing() {
        let ledger = InMemoryLedger::new();
        let treatments = service::<Treatment>(ReferenceValidation::Disabled);
        let treatment: Treatment = seed_record("TREATMENT1");

        let err = submit::<Treatment, _>(&ledger, |tx| treatments.update(tx, "TREATMENT9", treatment))
            .expect_err("update of absent key should fail");
        assert!(matches!(err, LedgerError::NotFound { ref key, .. } if key == "TREATMENT9"));

        let exists =
            submit::<Treatment, _>(&ledger, |tx| treatments.exists(tx, "TREATMENT9")).unwrap();
        assert!(!exists);
    }

    #[test]
    fn test_update_replaces_record_wholesale() {
        let ledger = InMemoryLedger::new();
        let insurances = service::<Insurance>(ReferenceValidation::Disabled);
        let insurance: Insurance = seed_record("INS123456");
        submit::<Insurance, _>(&ledger, |tx| insurances.create(tx, "INS123456", insurance.clone()))
            .unwrap();

        let mut replacement = insurance.clone();
        replacement.claim_limit = 250000.0;
        replacement.insurance_number = "ignored".into();
        let written =
            submit::<Insurance, _>(&ledger, |tx| insurances.update(tx, "INS123456", replacement))
                .unwrap();
        assert_eq!(written.insurance_number, "INS123456");

        let read = submit::<Insurance, _>(&ledger, |tx| insurances.read(tx, "INS123456")).unwrap();
        assert_eq!(read.claim_limit, 250000.0);
    }

    #[test]
    fn test_delete_then_read_is_not_found() {
        let ledger = InMemoryLedger::new();
        let patients = service::<Patient>(ReferenceValidation::Disabled);
        submit::<Patient, _>(&ledger, |tx| {
            patients.create(tx, "PATIENT1", seed_record("PATIENT1"))
        })
        .unwrap();

        submit::<Patient, _>(&ledger, |tx| patients.delete(tx, "PATIENT1")).unwrap();
        let err = submit::<Patient, _>(&ledger, |tx| patients.read(tx, "PATIENT1"))
            .expect_err("read after delete should fail");
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = submit::<Patient, _>(&ledger, |tx| patients.delete(tx, "PATIENT1"))
            .expect_err("second delete should fail");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_key_can_be_recreated_after_delete() {
        let ledger = InMemoryLedger::new();
        let patients = service::<Patient>(ReferenceValidation::Disabled);
        let patient: Patient = seed_record("PATIENT2");

        submit::<Patient, _>(&ledger, |tx| patients.create(tx, "PATIENT2", patient.clone()))
            .unwrap();
        submit::<Patient, _>(&ledger, |tx| patients.delete(tx, "PATIENT2")).unwrap();
        submit::<Patient, _>(&ledger, |tx| patients.create(tx, "PATIENT2", patient.clone()))
            .unwrap();

        assert!(submit::<Patient, _>(&ledger, |tx| patients.exists(tx, "PATIENT2")).unwrap());
    }

    #[test]
    fn test_empty_key_is_invalid_input() {
        let ledger = InMemoryLedger::new();
        let patients = service::<Patient>(ReferenceValidation::Disabled);

        let err = submit::<Patient, _>(&ledger, |tx| patients.read(tx, "  "))
            .expect_err("blank key should fail");
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_empty_stored_value_counts_as_absent() {
        let ledger = InMemoryLedger::new();
        let patients = service::<Patient>(ReferenceValidation::Disabled);
        ledger
            .submit::<_, StoreError, _>(Collection::Patient.namespace(), |tx| {
                tx.put_state("PATIENT1", Vec::new())
            })
            .unwrap();

        assert!(!submit::<Patient, _>(&ledger, |tx| patients.exists(tx, "PATIENT1")).unwrap());
        submit::<Patient, _>(&ledger, |tx| {
            patients.create(tx, "PATIENT1", seed_record("PATIENT1"))
        })
        .unwrap();
    }

    #[test]
    fn test_list_all_is_ordered_by_key() {
        let ledger = InMemoryLedger::new();
        let patients = service::<Patient>(ReferenceValidation::Disabled);
        let second: Patient = seed_record("PATIENT2");
        let first: Patient = seed_record("PATIENT1");

        submit::<Patient, _>(&ledger, |tx| patients.create(tx, "PATIENT2", second.clone()))
            .unwrap();
        submit::<Patient, _>(&ledger, |tx| patients.create(tx, "PATIENT1", first.clone()))
            .unwrap();

        let all = submit::<Patient, _>(&ledger, |tx| patients.list_all(tx)).unwrap();
        assert_eq!(all, vec![first, second]);

        let keys: Vec<String> = submit::<Patient, _>(&ledger, |tx| patients.list_entries(tx))
            .unwrap()
            .into_iter()
            .map(|entry| entry.key)
            .collect();
        assert_eq!(keys, ["PATIENT1", "PATIENT2"]);
        assert_eq!(ledger.open_iterators(), 0);
    }

    #[test]
    fn test_list_all_of_empty_collection_is_empty() {
        let ledger = InMemoryLedger::new();
        let claims = service::<InsuranceClaim>(ReferenceValidation::Disabled);

        let all = submit::<InsuranceClaim, _>(&ledger, |tx| claims.list_all(tx)).unwrap();
        assert!(all.is_empty());
    }

    #[test]
    fn test_claim_lifecycle() {
        let ledger = InMemoryLedger::new();
        let claims = service::<InsuranceClaim>(ReferenceValidation::Disabled);
        let claim = InsuranceClaim {
            claim_id: String::new(),
            treatment_id: "TREATMENT1".into(),
            patient_id: "PATIENT1".into(),
            national_id: "123456789012".into(),
            insurance_number: "INS123456".into(),
            status: "Pending".into(),
        };

        submit::<InsuranceClaim, _>(&ledger, |tx| claims.create(tx, "CLAIM1", claim)).unwrap();
        let read = submit::<InsuranceClaim, _>(&ledger, |tx| claims.read(tx, "CLAIM1")).unwrap();
        assert_eq!(read, seed_record::<InsuranceClaim>("CLAIM1"));

        submit::<InsuranceClaim, _>(&ledger, |tx| claims.delete(tx, "CLAIM1")).unwrap();
        let err = submit::<InsuranceClaim, _>(&ledger, |tx| claims.read(tx, "CLAIM1"))
            .expect_err("read after delete should fail");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = submit::<InsuranceClaim, _>(&ledger, |tx| claims.delete(tx, "CLAIM1"))
            .expect_err("second delete should fail");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_initialise_seeds_treatments_once() {
        let ledger = InMemoryLedger::new();
        let treatments = service::<Treatment>(ReferenceValidation::Disabled);

        let seeded = submit::<Treatment, _>(&ledger, |tx| treatments.initialise(tx)).unwrap();
        assert_eq!(seeded.len(), 2);

        let entries = submit::<Treatment, _>(&ledger, |tx| treatments.list_entries(tx)).unwrap();
        let keys: Vec<&str> = entries.iter().map(|entry| entry.key.as_str()).collect();
        assert_eq!(keys, ["TREATMENT1", "TREATMENT2"]);
        assert_eq!(
            entries[0].record,
            Treatment {
                medical_condition: "Fever".into(),
                hospital_name: "City Hospital".into(),
                room_number: "101".into(),
                admission_type: "Emergency".into(),
                medication: "Paracetamol".into(),
                patient_id: "PATIENT1".into(),
                admission_date: "2023-10-01".into(),
                release_date: "2023-10-05".into(),
                billing_amount: 500.50,
                doctor_name: "Dr. Smith".into(),
            }
        );
        assert_eq!(
            entries[1].record,
            Treatment {
                medical_condition: "Fracture".into(),
                hospital_name: "General Hospital".into(),
                room_number: "202".into(),
                admission_type: "Inpatient".into(),
                medication: "Painkillers".into(),
                patient_id: "PATIENT2".into(),
                admission_date: "2023-09-15".into(),
                release_date: "2023-09-25".into(),
                billing_amount: 1200.75,
                doctor_name: "Dr. Johnson".into(),
            }
        );

        let err = submit::<Treatment, _>(&ledger, |tx| treatments.initialise(tx))
            .expect_err("second initialise should fail");
        assert!(matches!(err, LedgerError::AlreadyExists { ref key, .. } if key == "TREATMENT1"));
    }

    #[test]
    fn test_concurrent_creates_of_one_key_conflict() {
        let ledger = InMemoryLedger::new();
        let patients = service::<Patient>(ReferenceValidation::Disabled);
        let namespace = Collection::Patient.namespace();

        let mut first = ledger.begin(namespace).unwrap();
        let mut second = ledger.begin(namespace).unwrap();
        patients
            .create(&mut first, "PATIENT1", seed_record("PATIENT1"))
            .unwrap();
        patients
            .create(&mut second, "PATIENT1", seed_record("PATIENT2"))
            .unwrap();

        let receipts = ledger.order_and_commit(vec![first, second]).unwrap();
        assert!(receipts[0].code.is_valid());
        assert!(matches!(
            receipts[1].code,
            ValidationCode::MvccReadConflict { ref key, .. } if key == "PATIENT1"
        ));

        let read = submit::<Patient, _>(&ledger, |tx| patients.read(tx, "PATIENT1")).unwrap();
        assert_eq!(read.name, "John Doe");
    }

    fn read_write_sets(tx: &crate::ledger::Transaction) -> (Vec<(String, String)>, Vec<String>) {
        let reads = tx
            .read_keys()
            .map(|(namespace, key)| (namespace.to_owned(), key.to_owned()))
            .collect();
        let writes = tx.written_keys().map(str::to_owned).collect();
        (reads, writes)
    }

    #[test]
    fn test_same_invocation_on_same_state_is_deterministic() {
        let ledger = InMemoryLedger::new();
        let claims = service::<InsuranceClaim>(ReferenceValidation::Disabled);
        submit::<InsuranceClaim, _>(&ledger, |tx| {
            claims.create(tx, "CLAIM1", seed_record("CLAIM1"))
        })
        .unwrap();
        let namespace = Collection::InsuranceClaim.namespace();

        let mut first = ledger.begin(namespace).unwrap();
        let mut second = ledger.begin(namespace).unwrap();
        let created = [&mut first, &mut second]
            .map(|tx| claims.create(tx, "CLAIM2", seed_record("CLAIM2")).unwrap());
        assert_eq!(created[0], created[1]);
        assert_eq!(created[0].claim_id, "CLAIM2");
        assert_eq!(read_write_sets(&first), read_write_sets(&second));
        assert_eq!(
            read_write_sets(&first),
            (
                vec![(namespace.to_owned(), "CLAIM2".to_owned())],
                vec!["CLAIM2".to_owned()]
            )
        );

        let mut first = ledger.begin(namespace).unwrap();
        let mut second = ledger.begin(namespace).unwrap();
        let failed = [&mut first, &mut second].map(|tx| {
            claims
                .update(tx, "CLAIM9", seed_record("CLAIM1"))
                .expect_err("update of absent key")
        });
        assert_eq!(failed[0].to_string(), failed[1].to_string());
        assert_eq!(failed[0].kind(), ErrorKind::NotFound);
        assert_eq!(read_write_sets(&first), read_write_sets(&second));
        assert!(first.written_keys().next().is_none());
    }

    #[test]
    fn test_scan_releases_iterator_on_decode_error() {
        let ledger = InMemoryLedger::new();
        let patients = service::<Patient>(ReferenceValidation::Disabled);
        submit::<Patient, _>(&ledger, |tx| {
            patients.create(tx, "PATIENT1", seed_record("PATIENT1"))
        })
        .unwrap();
        ledger
            .submit::<_, StoreError, _>(Collection::Patient.namespace(), |tx| {
                tx.put_state("PATIENT2", b"{not a patient".to_vec())
            })
            .unwrap();

        let err = submit::<Patient, _>(&ledger, |tx| patients.list_all(tx))
            .expect_err("corrupt record should abort the listing");
        assert!(matches!(err, LedgerError::Codec { ref key, .. } if key == "PATIENT2"));
        assert_eq!(ledger.open_iterators(), 0);

        let err = submit::<Patient, _>(&ledger, |tx| patients.read(tx, "PATIENT2"))
            .expect_err("corrupt record is not absent");
        assert_eq!(err.kind(), ErrorKind::Codec);
    }

    #[test]
    fn test_scan_stops_after_first_error() {
        let ledger = InMemoryLedger::new();
        let patients = service::<Patient>(ReferenceValidation::Disabled);
        ledger
            .submit::<_, StoreError, _>(Collection::Patient.namespace(), |tx| {
                tx.put_state("A", b"garbage".to_vec())?;
                tx.put_state("B", b"garbage".to_vec())
            })
            .unwrap();

        let mut tx = ledger.begin(Collection::Patient.namespace()).unwrap();
        let mut scan = patients.scan(&mut tx).unwrap();
        assert!(scan.is_open());
        assert_eq!(ledger.open_iterators(), 1);
        assert!(matches!(scan.next(), Some(Err(_))));
        assert!(!scan.is_open());
        assert!(scan.next().is_none());
        assert_eq!(ledger.open_iterators(), 0);
    }

    #[test]
    fn test_abandoned_scan_is_released_on_drop() {
        let ledger = InMemoryLedger::new();
        let treatments = service::<Treatment>(ReferenceValidation::Disabled);
        submit::<Treatment, _>(&ledger, |tx| treatments.initialise(tx)).unwrap();

        let mut tx = ledger.begin(Collection::Treatment.namespace()).unwrap();
        {
            let mut scan = treatments.scan(&mut tx).unwrap();
            let first = scan.next().unwrap().unwrap();
            assert_eq!(first.key, "TREATMENT1");
            assert_eq!(ledger.open_iterators(), 1);
        }
        assert_eq!(ledger.open_iterators(), 0);

        let mut range = tx.get_state_by_range("", "").unwrap();
        range.close();
        range.close();
        assert_eq!(ledger.open_iterators(), 0);
    }

    #[test]
    fn test_enforced_references_reject_dangling_treatment() {
        let ledger = InMemoryLedger::new();
        let treatments = service::<Treatment>(ReferenceValidation::Enforced);
        let patients = service::<Patient>(ReferenceValidation::Enforced);
        let insurances = service::<Insurance>(ReferenceValidation::Enforced);

        let err = submit::<Treatment, _>(&ledger, |tx| {
            treatments.create(tx, "TREATMENT1", seed_record("TREATMENT1"))
        })
        .expect_err("patient does not exist yet");
        assert!(matches!(
            err,
            LedgerError::DanglingReference { field: "patientID", target: Collection::Patient, .. }
        ));

        submit::<Insurance, _>(&ledger, |tx| insurances.initialise(tx)).unwrap();
        submit::<Patient, _>(&ledger, |tx| patients.initialise(tx)).unwrap();
        submit::<Treatment, _>(&ledger, |tx| {
            treatments.create(tx, "TREATMENT1", seed_record("TREATMENT1"))
        })
        .unwrap();
    }

    #[test]
    fn test_disabled_references_accept_dangling_claim() {
        let ledger = InMemoryLedger::new();
        let claims = service::<InsuranceClaim>(ReferenceValidation::Disabled);

        submit::<InsuranceClaim, _>(&ledger, |tx| claims.initialise(tx)).unwrap();
        let all = submit::<InsuranceClaim, _>(&ledger, |tx| claims.list_all(tx)).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_non_finite_amount_is_rejected() {
        let ledger = InMemoryLedger::new();
        let treatments = service::<Treatment>(ReferenceValidation::Disabled);
        let mut treatment: Treatment = seed_record("TREATMENT1");
        treatment.billing_amount = f64::NAN;

        let err = submit::<Treatment, _>(&ledger, |tx| treatments.create(tx, "TREATMENT1", treatment))
            .expect_err("NaN should be rejected");
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
