//! Validated primitive types shared across the MedLedger crates.
//!
//! - [`NonEmptyText`] for free text that must carry at least one visible character
//! - [`RecordKey`] for the caller-chosen business identifiers records are stored under

/// Errors that can occur when creating validated text types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The input started with the NUL character, which ledgers reserve for composite keys
    #[error("Key cannot start with the reserved NUL character")]
    ReservedPrefix,
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` if the input is empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Business identifier a record is stored under (for example `PATIENT1` or `INS123456`).
///
/// Unlike [`NonEmptyText`] the key is kept verbatim: ledger keys are compared byte for byte, so
/// trimming would silently address a different record. Ordering is the byte order of the UTF-8
/// encoding, which is the order range scans return records in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordKey(String);

impl RecordKey {
    /// Validates `input` as a record key.
    ///
    /// # Errors
    ///
    /// - `TextError::Empty` if the key is empty or whitespace only
    /// - `TextError::ReservedPrefix` if the key starts with `\u{0}`
    pub fn new(input: impl Into<String>) -> Result<Self, TextError> {
        let key = input.into();
        if key.trim().is_empty() {
            return Err(TextError::Empty);
        }
        if key.starts_with('\u{0}') {
            return Err(TextError::ReservedPrefix);
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RecordKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  medledger.dev  ").expect("should accept padded text");
        assert_eq!(text.as_str(), "medledger.dev");
    }

    #[test]
    fn non_empty_text_rejects_whitespace() {
        assert_eq!(NonEmptyText::new("   "), Err(TextError::Empty));
    }

    #[test]
    fn record_key_is_kept_verbatim() {
        let key = RecordKey::new(" PATIENT1").expect("should accept key with leading space");
        assert_eq!(key.as_str(), " PATIENT1");
    }

    #[test]
    fn record_key_rejects_empty_and_reserved() {
        assert_eq!(RecordKey::new(""), Err(TextError::Empty));
        assert_eq!(RecordKey::new(" \t"), Err(TextError::Empty));
        assert_eq!(
            RecordKey::new("\u{0}patient\u{0}1"),
            Err(TextError::ReservedPrefix)
        );
    }

    #[test]
    fn record_key_orders_by_bytes() {
        let mut keys: Vec<RecordKey> = ["PATIENT2", "PATIENT10", "PATIENT1", "CLAIM1"]
            .into_iter()
            .map(|k| RecordKey::new(k).unwrap())
            .collect();
        keys.sort();
        let ordered: Vec<&str> = keys.iter().map(RecordKey::as_str).collect();
        assert_eq!(ordered, ["CLAIM1", "PATIENT1", "PATIENT10", "PATIENT2"]);
    }
}
