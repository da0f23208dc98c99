//! Record codec.
//!
//! Records are stored as compact JSON. Encoding is deterministic: record structs have a fixed
//! field order and contain no maps, so equal records always produce identical bytes, which the
//! ledger relies on when it compares payloads between endorsements.
//!
//! Decoding is strict. Unknown fields, missing fields, wrong types and trailing data are all
//! rejected with [`LedgerError::Codec`], naming the failing field path (e.g. `billingAmount`).

use crate::error::{LedgerError, LedgerResult};
use crate::records::Record;

/// Zero-sized namespace for record encode/decode.
pub struct RecordCodec;

impl RecordCodec {
    /// Encode a record to its ledger payload.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Encode` if serialisation fails.
    pub fn encode<R: Record>(record: &R) -> LedgerResult<Vec<u8>> {
        serde_json::to_vec(record).map_err(|source| LedgerError::Encode {
            collection: R::COLLECTION,
            source,
        })
    }

    /// Decode the payload stored under `key`.
    ///
    /// `key` is only used to make the error actionable.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Codec` if `bytes` is not a valid encoding of `R`.
    pub fn decode<R: Record>(key: &str, bytes: &[u8]) -> LedgerResult<R> {
        let codec_error = |path: String, source: serde_json::Error| LedgerError::Codec {
            collection: R::COLLECTION,
            key: key.to_owned(),
            path,
            source,
        };

        let mut deserializer = serde_json::Deserializer::from_slice(bytes);
        let record = serde_path_to_error::deserialize::<_, R>(&mut deserializer).map_err(|err| {
            let path = err.path().to_string();
            let path = if path.is_empty() || path == "." {
                "<root>".to_owned()
            } else {
                path
            };
            codec_error(path, err.into_inner())
        })?;
        deserializer
            .end()
            .map_err(|source| codec_error("<root>".to_owned(), source))?;

        Ok(record)
    }
}
