use super::{require_finite, Record};
use crate::dispatch::{Args, FromArgs};
use crate::error::LedgerResult;
use crate::registry::Collection;
use medledger_types::RecordKey;
use serde::{Deserialize, Serialize};

/// An insurance policy. Stored under its own `insuranceNumber`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Insurance {
    /// Policy holder.
    pub name: String,
    #[serde(rename = "aadharNumber")]
    pub national_id: String,
    pub start_date: String,
    pub end_date: String,
    pub age: i32,
    /// Filled from the record key on write.
    #[serde(default)]
    pub insurance_number: String,
    pub claim_limit: f64,
    pub already_claimed: f64,
}

impl Record for Insurance {
    const COLLECTION: Collection = Collection::Insurance;

    fn bind_key(&mut self, key: &RecordKey) {
        self.insurance_number = key.as_str().to_owned();
    }

    fn validate(&self) -> Result<(), String> {
        require_finite("claimLimit", self.claim_limit)?;
        require_finite("alreadyClaimed", self.already_claimed)
    }

    fn seed() -> Vec<(&'static str, Self)> {
        vec![
            (
                "INS123456",
                Insurance {
                    name: "John Doe".into(),
                    national_id: "123456789012".into(),
                    start_date: "2023-01-01".into(),
                    end_date: "2024-01-01".into(),
                    age: 35,
                    insurance_number: "INS123456".into(),
                    claim_limit: 100000.00,
                    already_claimed: 25000.00,
                },
            ),
            (
                "INS654321",
                Insurance {
                    name: "Jane Smith".into(),
                    national_id: "987654321098".into(),
                    start_date: "2023-02-15".into(),
                    end_date: "2024-02-15".into(),
                    age: 28,
                    insurance_number: "INS654321".into(),
                    claim_limit: 150000.00,
                    already_claimed: 50000.00,
                },
            ),
        ]
    }
}

impl FromArgs for Insurance {
    const PARAMS: &'static [&'static str] = &[
        "name",
        "aadharNumber",
        "startDate",
        "endDate",
        "age",
        "claimLimit",
        "alreadyClaimed",
    ];

    fn from_args(args: &Args<'_>) -> LedgerResult<Self> {
        Ok(Insurance {
            name: args.text(0)?,
            national_id: args.text(1)?,
            start_date: args.text(2)?,
            end_date: args.text(3)?,
            age: args.int(4)?,
            insurance_number: args.key().to_owned(),
            claim_limit: args.float(5)?,
            already_claimed: args.float(6)?,
        })
    }
}
