//! Fee, value and virtual-size aggregation, per transaction, per
//! block and per confirmed branch.

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use error::{ErrorKind, Result};
use link::{HeaderLink, Link, PutLink, TxLink};
use query::{FeeRate, FeeRateSets, FeeRates, Query};

impl<'a> Query<'a> {
	/// Sum of the transaction's own output values.
	pub fn get_tx_spend(&self, tx_fk: TxLink) -> Result<u64> {
		let (_, outs_count, _, outs_fk) = self.store().tx.get_puts(tx_fk)?;
		self.sum_outputs(outs_fk, outs_count as usize)
	}

	/// Sum of the prevout values the transaction consumes; zero for a
	/// coinbase, an error for any unresolvable prevout.
	pub fn get_tx_value(&self, tx_fk: TxLink) -> Result<u64> {
		if self.store().tx.is_coinbase(tx_fk)? {
			return Ok(0);
		}

		let set = self.get_spend_set(tx_fk)?;
		let mut value = 0u64;
		for item in &set.spends {
			let hash = self.store().point.get_key(item.point_fk)?;
			let prevout_tx = self.store().tx.first(&hash)?;
			if prevout_tx.is_terminal() {
				return Err(ErrorKind::NotFound.into());
			}

			let (_, outs_count, _, outs_fk) = self.store().tx.get_puts(prevout_tx)?;
			if item.point_index >= outs_count {
				return Err(ErrorKind::NotFound.into());
			}

			let out_fk = self.store().puts.get(
				PutLink::from_value(outs_fk.value() + item.point_index as u64))?;
			value += self.store().output.get_value(out_fk)?;
		}
		Ok(value)
	}

	/// Prevout values minus output values; zero for a coinbase.
	pub fn get_tx_fee(&self, tx_fk: TxLink) -> Result<u64> {
		if self.store().tx.is_coinbase(tx_fk)? {
			return Ok(0);
		}

		let value = self.get_tx_value(tx_fk)?;
		let spend = self.get_tx_spend(tx_fk)?;
		Ok(value.saturating_sub(spend))
	}

	/// `ceil(weight / 4)` from the archived light/heavy sizes.
	pub fn get_tx_virtual_size(&self, tx_fk: TxLink) -> Result<u64> {
		let (light, heavy) = self.store().tx.get_sizes(tx_fk)?;
		Ok((3 * light as u64 + heavy as u64 + 3) / 4)
	}

	/// Fee rate of a non-coinbase transaction.
	pub fn get_tx_fees(&self, tx_fk: TxLink) -> Result<FeeRate> {
		if self.store().tx.is_coinbase(tx_fk)? {
			return Err(ErrorKind::InvalidArgument.into());
		}

		Ok(FeeRate {
			bytes: self.get_tx_virtual_size(tx_fk)?,
			fee: self.get_tx_fee(tx_fk)?,
		})
	}

	/// Total fees of the block's spending transactions.
	pub fn get_block_fee(&self, link: HeaderLink) -> Result<u64> {
		let tx_fks = self.store().txs.get_tx_fks(link.value())?;
		let mut fee = 0u64;
		for tx_fk in tx_fks.iter().skip(1) {
			fee += self.get_tx_fee(*tx_fk)?;
		}
		Ok(fee)
	}

	pub fn get_block_virtual_size(&self, link: HeaderLink) -> Result<u64> {
		let (light, heavy) = self.store().txs.get_sizes(link.value())?;
		Ok((3 * light as u64 + heavy as u64 + 3) / 4)
	}

	/// Per-tx fee rates of the block, coinbase excluded, in block
	/// order; computed in parallel.
	pub fn get_block_fees(&self, link: HeaderLink) -> Result<FeeRates> {
		let tx_fks = self.store().txs.get_tx_fks(link.value())?;
		tx_fks[1..]
			.par_iter()
			.map(|tx_fk| self.get_tx_fees(*tx_fk))
			.collect()
	}

	/// Fee rates for every confirmed block in `[start, start+count)`,
	/// in height order, computed in parallel. Cancellation and any
	/// per-block failure yield an error and no partial results.
	pub fn get_branch_fees(
		&self,
		cancel: &AtomicBool,
		start: u64,
		count: u64,
	) -> Result<FeeRateSets> {
		if count == 0 {
			return Ok(Vec::new());
		}
		if cancel.load(Ordering::Relaxed) {
			return Err(ErrorKind::Cancelled.into());
		}

		let mut links = Vec::with_capacity(count as usize);
		for height in start..start + count {
			let link = self.to_confirmed(height)?;
			if link.is_terminal() {
				return Err(ErrorKind::NotFound.into());
			}
			links.push(link);
		}

		links
			.par_iter()
			.map(|link| {
				if cancel.load(Ordering::Relaxed) {
					return Err(ErrorKind::Cancelled.into());
				}
				self.get_block_fees(*link)
			})
			.collect()
	}

	fn sum_outputs(&self, outs_fk: PutLink, count: usize) -> Result<u64> {
		let out_fks = self.store().puts.get_range(outs_fk, count)?;
		let mut value = 0u64;
		for out_fk in out_fks {
			value += self.store().output.get_value(out_fk)?;
		}
		Ok(value)
	}
}
