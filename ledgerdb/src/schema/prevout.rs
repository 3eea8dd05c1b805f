//! Cached prevout tx links per block: a slab arraymap keyed by header
//! link. One entry per non-coinbase input in block order, each merging
//! the prevout's coinbase flag into bit 31 of its tx link. In-block
//! spends are stored as the null sentinel and skipped by the
//! confirmability checks.

use std::sync::Arc;

use error::Result;
use link::{Link, SlabLink, TxLink};
use serial::{ByteReader, ByteWriter};
use storage::Storage;
use table::ArrayMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrevoutEntry {
	/// The prevout lives inside the same block.
	Internal,
	/// (coinbase, prevout tx link).
	External(bool, TxLink),
}

impl PrevoutEntry {
	fn write(&self, writer: &mut ByteWriter) {
		let raw = match *self {
			PrevoutEntry::Internal => 0xffff_ffffu64,
			PrevoutEntry::External(coinbase, tx_fk) => tx_fk.to_merged(coinbase),
		};
		writer.write_le(raw, 4);
	}

	fn read(reader: &mut ByteReader) -> Result<PrevoutEntry> {
		let raw = reader.read_le(4)?;
		let (coinbase, tx_fk) = TxLink::from_merged(raw);
		if tx_fk.is_terminal() {
			return Ok(PrevoutEntry::Internal);
		}
		Ok(PrevoutEntry::External(coinbase, tx_fk))
	}
}

pub struct PrevoutTable {
	map: ArrayMap<SlabLink>,
}

impl PrevoutTable {
	pub fn new(head: Arc<Storage>, body: Arc<Storage>, initial_buckets: u64) -> Self {
		PrevoutTable { map: ArrayMap::slabs(head, body, initial_buckets) }
	}

	pub fn inner(&self) -> &ArrayMap<SlabLink> {
		&self.map
	}

	pub fn put(&self, header_fk: u64, entries: &[PrevoutEntry]) -> Result<()> {
		let mut writer = ByteWriter::with_capacity(4 + entries.len() * 4);
		writer.write_u32(entries.len() as u32);
		for entry in entries {
			entry.write(&mut writer);
		}
		self.map.put(header_fk, writer.as_slice()).map(|_| ())
	}

	pub fn exists(&self, header_fk: u64) -> Result<bool> {
		self.map.exists(header_fk)
	}

	pub fn get(&self, header_fk: u64) -> Result<Vec<PrevoutEntry>> {
		self.map.get(header_fk, |reader| {
			let count = reader.read_u32()? as usize;
			let mut entries = Vec::with_capacity(count);
			for _ in 0..count {
				entries.push(PrevoutEntry::read(reader)?);
			}
			Ok(entries)
		})
	}
}
