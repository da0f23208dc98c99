//! Record repositories.
//!
//! [`shared::RecordService`] implements the existence-guarded mutation protocol once, generically
//! over the record type; [`scan`] provides the scoped range-scan iterator and [`claims`] adds the
//! claim-specific status transition.

pub mod claims;
pub mod scan;
pub mod shared;
