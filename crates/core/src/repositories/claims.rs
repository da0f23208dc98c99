//! Claim-specific operations.

use crate::error::{LedgerError, LedgerResult};
use crate::records::InsuranceClaim;
use crate::repositories::shared::RecordService;
use crate::store::LedgerStub;
use medledger_types::NonEmptyText;

impl RecordService<InsuranceClaim> {
    /// Moves the claim stored under `key` to `status`, leaving every other field unchanged.
    ///
    /// The claim is read and then written back through [`update`](RecordService::update) in
    /// the same invocation, so a concurrent change to the claim invalidates this one at commit.
    ///
    /// # Errors
    ///
    /// - `LedgerError::InvalidInput` if `status` is empty.
    /// - `LedgerError::NotFound` if no claim is stored under `key`.
    pub fn update_status<S: LedgerStub>(
        &self,
        stub: &mut S,
        key: &str,
        status: &str,
    ) -> LedgerResult<InsuranceClaim> {
        let status = NonEmptyText::new(status)
            .map_err(|_| LedgerError::InvalidInput("claim status cannot be empty".into()))?;

        let mut claim = self.read(stub, key)?;
        let previous = std::mem::replace(&mut claim.status, status.as_str().to_owned());
        let claim = self.update(stub, key, claim)?;

        tracing::info!(
            tx_id = stub.tx_id(),
            key,
            from = %previous,
            to = %claim.status,
            "claim status changed"
        );
        Ok(claim)
    }
}
