//! High-level queries over the archive tables.
//!
//! A [`Query`] borrows the store and layers block/tx assembly,
//! confirmation-set construction, validation state, fee aggregation
//! and merkle proofs over the raw tables. Parallel steps partition
//! work per transaction or per height with rayon and observe a
//! relaxed cancel flag; the first failure wins any equally valid
//! diagnosis.

mod archive;
mod confirm;
mod fees;
mod merkle;
mod validate;

pub use self::confirm::{SpendItem, SpendSet};

use link::{PointLink, TxLink};
use store::Store;

/// Virtual size and fee of one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeRate {
	pub bytes: u64,
	pub fee: u64,
}

pub type FeeRates = Vec<FeeRate>;
pub type FeeRateSets = Vec<FeeRates>;

/// Prevout resolution for one spend: either inside the block being
/// checked, or an archived transaction with its coinbase flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedPrevout {
	Internal,
	External(bool, TxLink),
}

#[derive(Clone, Copy)]
pub struct Query<'a> {
	store: &'a Store,
}

impl<'a> Query<'a> {
	pub fn new(store: &'a Store) -> Query<'a> {
		Query { store }
	}

	pub fn store(&self) -> &'a Store {
		self.store
	}

	pub(crate) fn full_index(point_index: u32, hash: &::chain::Hash) -> u32 {
		// The truncation round-trips except for the null sentinel.
		if point_index == ::keys::NULL_INDEX && *hash == ::chain::NULL_HASH {
			::chain::NULL_INDEX
		} else {
			point_index
		}
	}

	pub(crate) fn stub_of(point_fk: PointLink) -> u32 {
		::schema::to_stub(point_fk)
	}
}
