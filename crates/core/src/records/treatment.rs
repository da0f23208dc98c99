use super::{require_finite, Record};
use crate::dispatch::{Args, FromArgs};
use crate::error::LedgerResult;
use crate::registry::Collection;
use crate::validation::SoftReference;
use serde::{Deserialize, Serialize};

/// A hospital admission with its clinical and billing details.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Treatment {
    pub medical_condition: String,
    pub hospital_name: String,
    pub room_number: String,
    pub admission_type: String,
    pub medication: String,
    /// Soft reference to a [`Patient`](super::Patient) record.
    #[serde(rename = "patientID")]
    pub patient_id: String,
    pub admission_date: String,
    pub release_date: String,
    pub billing_amount: f64,
    pub doctor_name: String,
}

impl Record for Treatment {
    const COLLECTION: Collection = Collection::Treatment;

    fn validate(&self) -> Result<(), String> {
        require_finite("billingAmount", self.billing_amount)
    }

    fn references(&self) -> Vec<SoftReference> {
        vec![SoftReference::new(
            "patientID",
            Collection::Patient,
            &self.patient_id,
        )]
    }

    fn seed() -> Vec<(&'static str, Self)> {
        vec![
            (
                "TREATMENT1",
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
                },
            ),
            (
                "TREATMENT2",
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
                },
            ),
        ]
    }
}

impl FromArgs for Treatment {
    const PARAMS: &'static [&'static str] = &[
        "medicalCondition",
        "hospitalName",
        "roomNumber",
        "admissionType",
        "medication",
        "patientID",
        "admissionDate",
        "releaseDate",
        "billingAmount",
        "doctorName",
    ];

    fn from_args(args: &Args<'_>) -> LedgerResult<Self> {
        Ok(Treatment {
            medical_condition: args.text(0)?,
            hospital_name: args.text(1)?,
            room_number: args.text(2)?,
            admission_type: args.text(3)?,
            medication: args.text(4)?,
            patient_id: args.text(5)?,
            admission_date: args.text(6)?,
            release_date: args.text(7)?,
            billing_amount: args.float(8)?,
            doctor_name: args.text(9)?,
        })
    }
}
