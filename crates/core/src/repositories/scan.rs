use crate::codec::RecordCodec;
use crate::error::LedgerResult;
use crate::records::Record;
use crate::repositories::shared::Entry;
use crate::store::StateIterator;
use std::iter::FusedIterator;
use std::marker::PhantomData;

/// Lazy, decoding scan over one collection.
///
/// Owns the ledger range iterator and releases it exactly once: when the range is exhausted,
/// on the first error, or when the scan is dropped. The scan is not restartable and yields
/// nothing after an error.
pub struct RecordScan<R, I: StateIterator> {
    range: Option<I>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record, I: StateIterator> RecordScan<R, I> {
    pub(crate) fn new(range: I) -> Self {
        Self {
            range: Some(range),
            _record: PhantomData,
        }
    }

    /// Whether the underlying range iterator is still held.
    pub fn is_open(&self) -> bool {
        self.range.is_some()
    }

    fn release(&mut self) {
        if let Some(mut range) = self.range.take() {
            range.close();
        }
    }
}

impl<R: Record, I: StateIterator> Iterator for RecordScan<R, I> {
    type Item = LedgerResult<Entry<R>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let next = self.range.as_mut()?.next();
            let item = match next {
                None => {
                    self.release();
                    return None;
                }
                // Empty values are absent records.
                Some(Ok(kv)) if kv.value.is_empty() => continue,
                Some(Ok(kv)) => RecordCodec::decode::<R>(&kv.key, &kv.value).map(|record| Entry {
                    key: kv.key,
                    record,
                }),
                Some(Err(err)) => Err(err.into()),
            };

            if item.is_err() {
                self.release();
            }
            return Some(item);
        }
    }
}

impl<R: Record, I: StateIterator> FusedIterator for RecordScan<R, I> {}

impl<R, I: StateIterator> Drop for RecordScan<R, I> {
    fn drop(&mut self) {
        if let Some(mut range) = self.range.take() {
            range.close();
        }
    }
}

impl<R, I: StateIterator> std::fmt::Debug for RecordScan<R, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordScan")
            .field("open", &self.range.is_some())
            .finish()
    }
}
