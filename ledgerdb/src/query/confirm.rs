//! Block confirmability: BIP30 duplicate-coinbase handling, BIP68
//! relative timelocks, coinbase maturity and confirmed double-spend
//! detection, parallel per transaction.

use rayon::prelude::*;

use chain::{self, Block, Hash};
use error::{Code, Result};
use link::{HeaderLink, InsLink, Link, PointLink, TxLink};
use query::{Query, ResolvedPrevout};
use schema::{Context, PrevoutEntry, BIP30_RULE, BIP68_RULE};

/// One input's spend, as materialized for the confirmability checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpendItem {
	pub sequence: u32,
	pub point_fk: PointLink,
	pub point_index: u32,
	pub stub: u32,
}

/// All spends of one non-coinbase transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendSet {
	pub version: u32,
	pub tx_fk: TxLink,
	pub spends: Vec<SpendItem>,
}

impl<'a> Query<'a> {
	/// Mark every transaction of the block strong (reorg-visible) in
	/// ascending tx order; readers may observe a prefix but no gap.
	pub fn set_strong(&self, link: HeaderLink) -> Result<()> {
		self.set_strong_with(link, true)
	}

	pub fn set_unstrong(&self, link: HeaderLink) -> Result<()> {
		self.set_strong_with(link, false)
	}

	fn set_strong_with(&self, link: HeaderLink, positive: bool) -> Result<()> {
		let _exclusive = self.store().get_exclusive_transactor();
		let tx_fks = self.store().txs.get_tx_fks(link.value())?;
		for tx_fk in tx_fks {
			self.store().strong_tx.put(tx_fk, link, positive)?;
		}
		Ok(())
	}

	/// The header a transaction is currently strong in, or terminal.
	pub fn to_block(&self, tx_fk: TxLink) -> Result<HeaderLink> {
		self.store().strong_tx.to_block(tx_fk)
	}

	pub fn is_strong_tx(&self, tx_fk: TxLink) -> Result<bool> {
		self.store().strong_tx.is_strong(tx_fk)
	}

	/// Cache the prevout tx links for the block's non-coinbase spends.
	/// Skipped (left uncached) when any prevout is not yet archived.
	pub fn set_prevouts(&self, link: HeaderLink, block: &Block) -> Result<()> {
		let _exclusive = self.store().get_exclusive_transactor();
		self.set_prevouts_internal(link, block)
	}

	pub(crate) fn set_prevouts_internal(&self, link: HeaderLink, block: &Block) -> Result<()> {
		let block_hashes: Vec<Hash> = block.transactions.iter().map(|tx| tx.hash()).collect();

		let mut entries = Vec::new();
		for tx in block.transactions.iter().skip(1) {
			for input in &tx.inputs {
				// In-block spends are stored as the null sentinel and
				// skipped by the spendability checks.
				if block_hashes.contains(&input.point.hash) {
					entries.push(PrevoutEntry::Internal);
					continue;
				}

				let prevout_tx = self.store().tx.first(&input.point.hash)?;
				if prevout_tx.is_terminal() {
					return Ok(());
				}

				let coinbase = self.store().tx.is_coinbase(prevout_tx)?;
				entries.push(PrevoutEntry::External(coinbase, prevout_tx));
			}
		}

		self.store().prevout.put(link.value(), &entries)
	}

	/// Build the spend set of one transaction: version plus one item
	/// per input, read through the tx record, its ins slots and the
	/// spend payloads.
	pub fn get_spend_set(&self, tx_fk: TxLink) -> Result<SpendSet> {
		let record = self.store().tx.get(tx_fk)?;
		let mut spends = Vec::with_capacity(record.ins_count as usize);

		for index in 0..record.ins_count as u64 {
			let slot = self.store().ins.get(InsLink::from_value(record.point_fk.value() + index))?;
			let spend = self.store().spend.get(slot.spend_fk)?;
			spends.push(SpendItem {
				sequence: spend.sequence,
				point_fk: spend.point_fk,
				point_index: spend.point_index,
				stub: Self::stub_of(spend.point_fk),
			});
		}

		Ok(SpendSet { version: record.version, tx_fk, spends })
	}

	/// Every header in which some archived transaction with this hash
	/// is currently strong. Inner results are materialized before the
	/// outer chain advances.
	pub fn get_strong_txs(&self, hash: &Hash) -> Result<Vec<(TxLink, HeaderLink)>> {
		let tx_fks: Vec<TxLink> = self.store().tx.iter(hash)?.collect();

		let mut out = Vec::new();
		for tx_fk in tx_fks {
			let block = self.to_block(tx_fk)?;
			if !block.is_terminal() {
				out.push((tx_fk, block));
			}
		}
		Ok(out)
	}

	/// True if every output of the coinbase is spent by a strong
	/// transaction. The historical implementation short-circuits to
	/// true; the real scan is carried behind `spent-coinbase-scan`.
	#[cfg(not(feature = "spent-coinbase-scan"))]
	pub fn is_spent_coinbase(&self, _tx_fk: TxLink) -> Result<bool> {
		Ok(true)
	}

	#[cfg(feature = "spent-coinbase-scan")]
	pub fn is_spent_coinbase(&self, tx_fk: TxLink) -> Result<bool> {
		let record = self.store().tx.get(tx_fk)?;
		let hash = self.store().tx.get_key(tx_fk)?;
		let point_fk = self.store().point.first(&hash)?;
		if point_fk.is_terminal() {
			return Ok(false);
		}

		for index in 0..record.outs_count {
			match self.spent_prevout(point_fk, index, Self::stub_of(point_fk), HeaderLink::terminal()) {
				Code::ConfirmedDoubleSpend => {},
				_ => return Ok(false),
			}
		}
		Ok(true)
	}

	/// Decide whether the block can join the confirmed chain under
	/// the rules carried by its stored context.
	pub fn block_confirmable(&self, link: HeaderLink) -> Code {
		let ctx = match self.store().header.get_context(link) {
			Ok(ctx) => ctx,
			Err(_) => return Code::Integrity1,
		};

		let tx_fks = match self.store().txs.get_tx_fks(link.value()) {
			Ok(fks) => fks,
			Err(_) => return Code::Integrity1,
		};
		if tx_fks.is_empty() {
			return Code::Integrity1;
		}

		if ctx.is_enabled(BIP30_RULE) {
			let code = self.unspent_duplicates(tx_fks[0], link);
			if !code.is_success() {
				return code;
			}
		}

		let spending = &tx_fks[1..];
		if spending.is_empty() {
			return Code::Success;
		}

		let sets: ::std::result::Result<Vec<SpendSet>, _> = spending
			.par_iter()
			.map(|tx_fk| self.get_spend_set(*tx_fk))
			.collect();
		let sets = match sets {
			Ok(sets) => sets,
			Err(_) => return Code::Integrity2,
		};

		let resolved = match self.resolve_prevouts(link, &sets) {
			Ok(resolved) => resolved,
			Err(code) => return code,
		};

		let checks: Vec<(&SpendSet, &SpendItem, &ResolvedPrevout)> = sets
			.iter()
			.flat_map(|set| set.spends.iter().map(move |item| (set, item)))
			.zip(resolved.iter())
			.map(|((set, item), prevout)| (set, item, prevout))
			.collect();

		let failure = checks.par_iter().find_map_any(|&(set, item, prevout)| {
			let code = self.unspendable_prevout(set.version, item, prevout, &ctx);
			if code.is_success() { None } else { Some(code) }
		});
		if let Some(code) = failure {
			return code;
		}

		// Terminal marks a block not yet set strong; its own spends
		// are then not yet attributable to it.
		let self_link = match self.to_block(tx_fks[0]) {
			Ok(strong) if strong == link => link,
			Ok(_) => HeaderLink::terminal(),
			Err(_) => return Code::Integrity8,
		};

		let failure = checks.par_iter().find_map_any(|&(_, item, prevout)| {
			if let ResolvedPrevout::Internal = *prevout {
				return None;
			}
			let code = self.spent_prevout(item.point_fk, item.point_index, item.stub, self_link);
			if code.is_success() { None } else { Some(code) }
		});
		if let Some(code) = failure {
			return code;
		}

		Code::Success
	}

	// BIP30: a duplicated coinbase hash is only tolerable when every
	// other strong instance is fully spent.
	fn unspent_duplicates(&self, coinbase_fk: TxLink, link: HeaderLink) -> Code {
		let hash = match self.store().tx.get_key(coinbase_fk) {
			Ok(hash) => hash,
			Err(_) => return Code::Integrity1,
		};

		match self.store().duplicate.contains(&hash) {
			Ok(false) => return Code::Success,
			Ok(true) => {},
			Err(_) => return Code::Integrity1,
		}

		let strong = match self.get_strong_txs(&hash) {
			Ok(strong) => strong,
			Err(_) => return Code::Integrity1,
		};

		// Remove self when the current block is already set strong.
		for (tx_fk, block) in strong {
			if block == link {
				continue;
			}
			match self.is_spent_coinbase(tx_fk) {
				Ok(true) => {},
				Ok(false) => return Code::UnspentCoinbaseCollision,
				Err(_) => return Code::Integrity1,
			}
		}

		Code::Success
	}

	// Map each spend (block order) to its prevout tx: from the cache
	// when present, otherwise by point-hash lookup.
	fn resolve_prevouts(
		&self,
		link: HeaderLink,
		sets: &[SpendSet],
	) -> ::std::result::Result<Vec<ResolvedPrevout>, Code> {
		let cached = self.store().prevout.exists(link.value()).map_err(|_| Code::Integrity3)?;
		if cached {
			let entries = self.store().prevout.get(link.value()).map_err(|_| Code::Integrity3)?;
			let total: usize = sets.iter().map(|set| set.spends.len()).sum();
			if entries.len() != total {
				return Err(Code::Integrity3);
			}

			return Ok(entries.into_iter().map(|entry| match entry {
				PrevoutEntry::Internal => ResolvedPrevout::Internal,
				PrevoutEntry::External(coinbase, tx_fk) => ResolvedPrevout::External(coinbase, tx_fk),
			}).collect());
		}

		let mut resolved = Vec::new();
		for set in sets {
			for item in &set.spends {
				let hash = self.store().point.get_key(item.point_fk).map_err(|_| Code::Integrity3)?;
				let prevout_tx = self.store().tx.first(&hash).map_err(|_| Code::Integrity3)?;
				if prevout_tx.is_terminal() {
					return Err(Code::Integrity3);
				}
				let coinbase = self.store().tx.is_coinbase(prevout_tx).map_err(|_| Code::Integrity3)?;
				resolved.push(ResolvedPrevout::External(coinbase, prevout_tx));
			}
		}
		Ok(resolved)
	}

	// Confirmation, BIP68 and maturity checks for one spend.
	fn unspendable_prevout(
		&self,
		version: u32,
		item: &SpendItem,
		prevout: &ResolvedPrevout,
		ctx: &Context,
	) -> Code {
		let (coinbase, prevout_tx) = match *prevout {
			ResolvedPrevout::Internal => return Code::Success,
			ResolvedPrevout::External(coinbase, tx_fk) => (coinbase, tx_fk),
		};

		let strong = match self.to_block(prevout_tx) {
			Ok(strong) => strong,
			Err(_) => return Code::Integrity4,
		};
		if strong.is_terminal() {
			return Code::UnconfirmedSpend;
		}

		let prev_ctx = match self.store().header.get_context(strong) {
			Ok(prev_ctx) => prev_ctx,
			Err(_) => return Code::Integrity4,
		};

		if ctx.is_enabled(BIP68_RULE) && version >= chain::RELATIVE_LOCKTIME_MIN_VERSION {
			if chain::is_locked(
				item.sequence,
				ctx.height as u64,
				ctx.mtp,
				prev_ctx.height as u64,
				prev_ctx.mtp,
			) {
				return Code::RelativeTimeLocked;
			}
		}

		if coinbase && !chain::is_coinbase_mature(prev_ctx.height as u64, ctx.height as u64) {
			return Code::CoinbaseMaturity;
		}

		Code::Success
	}

	// Double-spend check for one prevout. `self_link` is the block
	// under evaluation when it is already set strong, terminal
	// otherwise; spenders strong in that block are its own.
	pub(crate) fn spent_prevout(
		&self,
		point_fk: PointLink,
		index: u32,
		stub: u32,
		self_link: HeaderLink,
	) -> Code {
		let hash = match self.store().point.get_key(point_fk) {
			Ok(hash) => hash,
			Err(_) => return Code::Integrity6,
		};

		let full_index = Self::full_index(index, &hash);
		let key = ::keys::Key::Point { hash: &hash, index: full_index, stub };

		let spenders: Vec<::link::SpendLink> = match self.store().spend.iter(&key) {
			Ok(iter) => iter.collect(),
			Err(_) => return Code::Integrity7,
		};

		if spenders.is_empty() {
			// At minimum the block's own spend must be present.
			return if self_link.is_terminal() { Code::Success } else { Code::Integrity5 };
		}

		for link in spenders {
			let record = match self.store().spend.get(link) {
				Ok(record) => record,
				Err(_) => return Code::Integrity7,
			};

			// Filter stub collisions through the point hashes.
			let spender_hash = match self.store().point.get_key(record.point_fk) {
				Ok(spender_hash) => spender_hash,
				Err(_) => return Code::Integrity6,
			};
			if spender_hash != hash || record.point_index != index & 0xff_ffff {
				continue;
			}

			match self.to_block(record.tx_fk) {
				Ok(strong) if strong.is_terminal() => {},
				Ok(strong) if strong == self_link => {},
				Ok(_) => return Code::ConfirmedDoubleSpend,
				Err(_) => return Code::Integrity8,
			}
		}

		Code::Success
	}
}

#[cfg(test)]
mod tests {
	use super::SpendItem;
	use link::{Link, PointLink};

	#[test]
	fn test_spend_item_stub() {
		let item = SpendItem {
			sequence: 0,
			point_fk: PointLink::from_value(0x0104_0506),
			point_index: 1,
			stub: ::schema::to_stub(PointLink::from_value(0x0104_0506)),
		};
		assert_eq!(item.stub, 0x04_0506);
	}

	#[test]
	fn test_null_index_keys() {
		// The null sentinel keeps its bucket-zero identity.
		assert_eq!(::query::Query::full_index(::keys::NULL_INDEX, &::chain::NULL_HASH),
			::chain::NULL_INDEX);
		assert_eq!(::query::Query::full_index(5, &[1u8; 32]), 5);
	}
}
