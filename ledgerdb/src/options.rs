//! Store configuration.

use error::{ErrorKind, Result};

/// Hash table sizing for one archive table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableOptions {
	/// Head bucket count (fixed at create for hash tables, initial
	/// for array tables).
	pub buckets: u64,
	/// Initial body file bytes.
	pub size: usize,
	/// Expansion rate in percent applied when the body outgrows its
	/// mapped capacity.
	pub rate: u16,
}

impl TableOptions {
	fn new(buckets: u64, size: usize, rate: u16) -> TableOptions {
		TableOptions { buckets, size, rate }
	}
}

/// Store-wide options. Table bucket counts are fixed at create time
/// and must match at open.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
	pub header: TableOptions,
	pub point: TableOptions,
	pub input: TableOptions,
	pub output: TableOptions,
	pub ins: TableOptions,
	pub puts: TableOptions,
	pub tx: TableOptions,
	pub txs: TableOptions,
	pub spend: TableOptions,
	pub candidate: TableOptions,
	pub confirmed: TableOptions,
	pub strong_tx: TableOptions,
	pub duplicate: TableOptions,
	pub prevout: TableOptions,
	pub validated_bk: TableOptions,
	pub validated_tx: TableOptions,
	pub filter_bk: TableOptions,
	pub filter_tx: TableOptions,
	pub address: TableOptions,

	/// Merkle interval depth: the interval spans `2^depth` blocks.
	/// Zero caches per block, `0xff` disables caching.
	pub interval_depth: u8,
	/// Disables the prevout cache table when false.
	pub prevouts: bool,
}

impl Default for Options {
	fn default() -> Self {
		Options {
			header: TableOptions::new(100, 1 << 12, 50),
			point: TableOptions::new(100, 1 << 12, 50),
			input: TableOptions::new(0, 1 << 14, 50),
			output: TableOptions::new(0, 1 << 14, 50),
			ins: TableOptions::new(0, 1 << 12, 50),
			puts: TableOptions::new(0, 1 << 12, 50),
			tx: TableOptions::new(100, 1 << 13, 50),
			txs: TableOptions::new(100, 1 << 12, 50),
			spend: TableOptions::new(100, 1 << 13, 50),
			candidate: TableOptions::new(1, 1 << 8, 50),
			confirmed: TableOptions::new(1, 1 << 8, 50),
			strong_tx: TableOptions::new(100, 1 << 12, 50),
			duplicate: TableOptions::new(10, 1 << 8, 50),
			prevout: TableOptions::new(100, 1 << 12, 50),
			validated_bk: TableOptions::new(100, 1 << 10, 50),
			validated_tx: TableOptions::new(100, 1 << 12, 50),
			filter_bk: TableOptions::new(100, 1 << 10, 50),
			filter_tx: TableOptions::new(100, 1 << 10, 50),
			address: TableOptions::new(100, 1 << 12, 50),
			interval_depth: 0xff,
			prevouts: true,
		}
	}
}

impl Options {
	pub fn validate(&self) -> Result<()> {
		if self.spend.buckets < 2 {
			bail!(ErrorKind::InvalidOptions(
				"spend.buckets",
				"must be at least 2; bucket 0 is reserved for the null outpoint.".into()
			));
		}

		let hashed = [
			("header.buckets", self.header.buckets),
			("point.buckets", self.point.buckets),
			("tx.buckets", self.tx.buckets),
			("strong_tx.buckets", self.strong_tx.buckets),
			("duplicate.buckets", self.duplicate.buckets),
			("validated_tx.buckets", self.validated_tx.buckets),
			("address.buckets", self.address.buckets),
		];
		for &(field, buckets) in &hashed {
			if buckets == 0 {
				bail!(ErrorKind::InvalidOptions(
					field,
					"must not be 0.".into()
				));
			}
		}

		let rates = [
			self.header.rate, self.point.rate, self.input.rate, self.output.rate,
			self.ins.rate, self.puts.rate, self.tx.rate, self.txs.rate,
			self.spend.rate, self.candidate.rate, self.confirmed.rate,
			self.strong_tx.rate, self.duplicate.rate, self.prevout.rate,
			self.validated_bk.rate, self.validated_tx.rate,
			self.filter_bk.rate, self.filter_tx.rate, self.address.rate,
		];
		if rates.iter().any(|rate| *rate == 0) {
			bail!(ErrorKind::InvalidOptions(
				"rate",
				"expansion rates must be greater than 0.".into()
			));
		}

		Ok(())
	}

	/// Blocks per merkle interval; `usize::MAX` disables caching.
	pub fn interval_span(&self) -> usize {
		if self.interval_depth == 0xff {
			return usize::max_value();
		}
		1usize << self.interval_depth.min(62)
	}
}
