//! Optional write-time checks on soft references between collections.
//!
//! Records point at each other by business key (a treatment's `patientID`, a claim's
//! `treatmentID`, ...). By default none of these are checked: a treatment may be written for a
//! patient that does not exist yet, or any more. Deployments that want the ledger to refuse
//! dangling references can switch to [`ReferenceValidation::Enforced`].
//!
//! Enforcement reads the referenced keys from the other collections' namespaces through the same
//! invocation, so those keys join the invocation's read set. A concurrent delete of a referenced
//! record therefore invalidates the write at commit rather than slipping past the check.

use crate::error::{LedgerError, LedgerResult};
use crate::records::Record;
use crate::registry::Collection;
use crate::store::LedgerStub;
use std::str::FromStr;

/// Whether Create and Update verify that soft references resolve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReferenceValidation {
    /// References are stored as given.
    #[default]
    Disabled,
    /// Every reference must name an existing record in its target collection.
    Enforced,
}

impl FromStr for ReferenceValidation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" | "off" | "false" | "0" => Ok(ReferenceValidation::Disabled),
            "enforced" | "on" | "true" | "1" => Ok(ReferenceValidation::Enforced),
            other => Err(format!(
                "unknown reference validation mode {other:?} (expected \"disabled\" or \"enforced\")"
            )),
        }
    }
}

/// A business key held by one record that names a record in another collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SoftReference {
    /// Wire name of the referencing field.
    pub field: &'static str,
    pub target: Collection,
    pub key: String,
}

impl SoftReference {
    pub fn new(field: &'static str, target: Collection, key: &str) -> Self {
        Self {
            field,
            target,
            key: key.to_owned(),
        }
    }
}

/// Checks `record`'s soft references according to `policy`.
///
/// # Errors
///
/// With [`ReferenceValidation::Enforced`], returns `LedgerError::DanglingReference` for the first
/// reference that is empty or does not resolve, or a store error if a lookup fails.
pub(crate) fn check_references<S, R>(
    policy: ReferenceValidation,
    stub: &mut S,
    record: &R,
) -> LedgerResult<()>
where
    S: LedgerStub,
    R: Record,
{
    if policy == ReferenceValidation::Disabled {
        return Ok(());
    }

    for reference in record.references() {
        let resolved = !reference.key.is_empty()
            && stub
                .get_foreign_state(reference.target.namespace(), &reference.key)?
                .is_some_and(|value| !value.is_empty());
        if !resolved {
            return Err(LedgerError::DanglingReference {
                collection: R::COLLECTION,
                field: reference.field,
                target: reference.target,
                key: reference.key,
            });
        }
    }

    Ok(())
}
