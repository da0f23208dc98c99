//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services. The
//! library never reads environment variables itself; binaries do that and hand the values to the
//! parsing helpers here.

use crate::error::{LedgerError, LedgerResult};
use crate::validation::ReferenceValidation;
use medledger_types::NonEmptyText;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    ledger_name: NonEmptyText,
    reference_validation: ReferenceValidation,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidInput` if `ledger_name` is empty or whitespace.
    pub fn new(
        ledger_name: impl AsRef<str>,
        reference_validation: ReferenceValidation,
    ) -> LedgerResult<Self> {
        let ledger_name = NonEmptyText::new(ledger_name)
            .map_err(|_| LedgerError::InvalidInput("ledger_name cannot be empty".into()))?;

        Ok(Self {
            ledger_name,
            reference_validation,
        })
    }

    /// Name of the ledger (channel) this deployment serves.
    pub fn ledger_name(&self) -> &str {
        self.ledger_name.as_str()
    }

    pub fn reference_validation(&self) -> ReferenceValidation {
        self.reference_validation
    }
}

/// Parse the reference validation policy from an optional string value.
///
/// If `value` is `None` or empty/whitespace, references are not validated.
pub fn reference_validation_from_env_value(
    value: Option<String>,
) -> LedgerResult<ReferenceValidation> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value
        .map(|v| v.parse::<ReferenceValidation>())
        .transpose()
        .map_err(LedgerError::InvalidInput)?;

    Ok(parsed.unwrap_or_default())
}

/// Parse a boolean switch such as `MEDLEDGER_SEED` from an optional string value.
pub fn flag_from_env_value(value: Option<String>) -> LedgerResult<bool> {
    match value.as_deref().map(str::trim).map(str::to_ascii_lowercase) {
        None => Ok(false),
        Some(v) if v.is_empty() => Ok(false),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(LedgerError::InvalidInput(format!(
                "expected a boolean flag, got {v:?}"
            ))),
        },
    }
}
