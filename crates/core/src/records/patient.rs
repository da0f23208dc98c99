use super::Record;
use crate::dispatch::{Args, FromArgs};
use crate::error::LedgerResult;
use crate::registry::Collection;
use crate::validation::SoftReference;
use serde::{Deserialize, Serialize};

/// Patient identity and demographics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Patient {
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub blood_type: String,
    /// Height in centimetres.
    pub height: i32,
    /// Weight in kilograms.
    pub weight: i32,
    pub address: String,
    /// Date of birth, `YYYY-MM-DD`.
    pub dob: String,
    #[serde(rename = "aadharNumber")]
    pub national_id: String,
    /// Soft reference to an [`Insurance`](super::Insurance) record.
    pub insurance_number: String,
    pub phone_number: String,
    #[serde(rename = "emailID")]
    pub email: String,
    /// `"1"` for smokers, `"0"` otherwise.
    pub smoker_status: String,
}

impl Record for Patient {
    const COLLECTION: Collection = Collection::Patient;

    fn references(&self) -> Vec<SoftReference> {
        vec![SoftReference::new(
            "insuranceNumber",
            Collection::Insurance,
            &self.insurance_number,
        )]
    }

    fn seed() -> Vec<(&'static str, Self)> {
        vec![
            (
                "PATIENT1",
                Patient {
                    name: "John Doe".into(),
                    age: 30,
                    gender: "Male".into(),
                    blood_type: "O+".into(),
                    height: 180,
                    weight: 75,
                    address: "123 Main St".into(),
                    dob: "1990-01-01".into(),
                    national_id: "123456789012".into(),
                    insurance_number: "INS123456".into(),
                    phone_number: "1234567890".into(),
                    email: "john.doe@example.com".into(),
                    smoker_status: "1".into(),
                },
            ),
            (
                "PATIENT2",
                Patient {
                    name: "Jane Doe".into(),
                    age: 25,
                    gender: "Female".into(),
                    blood_type: "A+".into(),
                    height: 165,
                    weight: 60,
                    address: "456 Elm St".into(),
                    dob: "1995-05-05".into(),
                    national_id: "987654321098".into(),
                    insurance_number: "INS654321".into(),
                    phone_number: "0987654321".into(),
                    email: "jane.doe@example.com".into(),
                    smoker_status: "0".into(),
                },
            ),
        ]
    }
}

impl FromArgs for Patient {
    const PARAMS: &'static [&'static str] = &[
        "name",
        "age",
        "gender",
        "bloodType",
        "height",
        "weight",
        "address",
        "dob",
        "aadharNumber",
        "insuranceNumber",
        "phoneNumber",
        "emailID",
        "smokerStatus",
    ];

    fn from_args(args: &Args<'_>) -> LedgerResult<Self> {
        Ok(Patient {
            name: args.text(0)?,
            age: args.int(1)?,
            gender: args.text(2)?,
            blood_type: args.text(3)?,
            height: args.int(4)?,
            weight: args.int(5)?,
            address: args.text(6)?,
            dob: args.text(7)?,
            national_id: args.text(8)?,
            insurance_number: args.text(9)?,
            phone_number: args.text(10)?,
            email: args.text(11)?,
            smoker_status: args.text(12)?,
        })
    }
}
