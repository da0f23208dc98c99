use super::Record;
use crate::dispatch::{Args, FromArgs};
use crate::error::LedgerResult;
use crate::registry::Collection;
use crate::validation::SoftReference;
use medledger_types::RecordKey;
use serde::{Deserialize, Serialize};

/// An insurance claim raised against a treatment. Stored under its own `claimID`.
///
/// `status` is free text; in practice it moves through `Pending`, `Approved` and `Rejected`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InsuranceClaim {
    /// Filled from the record key on write.
    #[serde(rename = "claimID", default)]
    pub claim_id: String,
    #[serde(rename = "treatmentID")]
    pub treatment_id: String,
    #[serde(rename = "patientID")]
    pub patient_id: String,
    #[serde(rename = "aadharNumber")]
    pub national_id: String,
    pub insurance_number: String,
    pub status: String,
}

impl Record for InsuranceClaim {
    const COLLECTION: Collection = Collection::InsuranceClaim;

    fn bind_key(&mut self, key: &RecordKey) {
        self.claim_id = key.as_str().to_owned();
    }

    fn references(&self) -> Vec<SoftReference> {
        vec![
            SoftReference::new("treatmentID", Collection::Treatment, &self.treatment_id),
            SoftReference::new("patientID", Collection::Patient, &self.patient_id),
            SoftReference::new(
                "insuranceNumber",
                Collection::Insurance,
                &self.insurance_number,
            ),
        ]
    }

    fn seed() -> Vec<(&'static str, Self)> {
        vec![
            (
                "CLAIM1",
                InsuranceClaim {
                    claim_id: "CLAIM1".into(),
                    treatment_id: "TREATMENT1".into(),
                    patient_id: "PATIENT1".into(),
                    national_id: "123456789012".into(),
                    insurance_number: "INS123456".into(),
                    status: "Pending".into(),
                },
            ),
            (
                "CLAIM2",
                InsuranceClaim {
                    claim_id: "CLAIM2".into(),
                    treatment_id: "TREATMENT2".into(),
                    patient_id: "PATIENT2".into(),
                    national_id: "987654321098".into(),
                    insurance_number: "INS654321".into(),
                    status: "Approved".into(),
                },
            ),
        ]
    }
}

impl FromArgs for InsuranceClaim {
    const PARAMS: &'static [&'static str] = &[
        "treatmentID",
        "patientID",
        "aadharNumber",
        "insuranceNumber",
        "status",
    ];

    fn from_args(args: &Args<'_>) -> LedgerResult<Self> {
        Ok(InsuranceClaim {
            claim_id: args.key().to_owned(),
            treatment_id: args.text(0)?,
            patient_id: args.text(1)?,
            national_id: args.text(2)?,
            insurance_number: args.text(3)?,
            status: args.text(4)?,
        })
    }
}
