//! Block-to-transaction association: a slab arraymap keyed by header
//! link.
//!
//! Slab layout: merged light(3, high bit = interval present), heavy(3),
//! tx count(3), count × tx_fk(4), optional 32-byte merkle interval
//! root, optional genesis depth byte (present iff the first tx_fk is
//! zero, which only the genesis coinbase can claim).

use std::sync::Arc;

use chain::Hash;
use error::Result;
use link::{Link, SlabLink, TxLink};
use serial::{ByteReader, ByteWriter};
use storage::Storage;
use table::ArrayMap;

// High bit of the 24-bit light field flags a stored interval.
const INTERVAL_BIT: u32 = 23;
const LIGHT_MASK: u32 = (1 << INTERVAL_BIT) - 1;

fn merge(is_interval: bool, light: u32) -> u32 {
	debug_assert_eq!(light & !LIGHT_MASK, 0, "light size overflows the flag bit");
	light | ((is_interval as u32) << INTERVAL_BIT)
}

fn is_interval(merged: u32) -> bool {
	merged >> INTERVAL_BIT != 0
}

fn to_light(merged: u32) -> u32 {
	merged & LIGHT_MASK
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxsRecord {
	/// Block serialized size without witness data.
	pub light: u32,
	/// Block serialized size with witness data.
	pub heavy: u32,
	pub tx_fks: Vec<TxLink>,
	pub interval: Option<Hash>,
	pub depth: u8,
}

impl TxsRecord {
	pub fn is_genesis(&self) -> bool {
		self.tx_fks.first().map_or(false, |fk| fk.value() == 0)
	}

	pub fn serialized_size(&self) -> usize {
		3 + 3 + 3 + self.tx_fks.len() * TxLink::SIZE
			+ if self.interval.is_some() { 32 } else { 0 }
			+ self.is_genesis() as usize
	}

	pub fn write(&self, writer: &mut ByteWriter) {
		writer.write_le(merge(self.interval.is_some(), self.light) as u64, 3);
		writer.write_le(self.heavy as u64, 3);
		writer.write_le(self.tx_fks.len() as u64, 3);
		for fk in &self.tx_fks {
			writer.write_u32(fk.value() as u32);
		}
		if let Some(ref interval) = self.interval {
			writer.write_bytes(interval);
		}
		if self.is_genesis() {
			writer.write_u8(self.depth);
		}
	}

	pub fn read(reader: &mut ByteReader) -> Result<TxsRecord> {
		let merged = reader.read_le(3)? as u32;
		let heavy = reader.read_le(3)? as u32;
		let count = reader.read_le(3)? as usize;

		let mut tx_fks = Vec::with_capacity(count);
		for _ in 0..count {
			tx_fks.push(TxLink::from_value(reader.read_u32()? as u64 & TxLink::mask()));
		}

		let interval = if is_interval(merged) {
			Some(reader.read_hash()?)
		} else {
			None
		};

		let record = TxsRecord {
			light: to_light(merged),
			heavy,
			tx_fks,
			interval,
			depth: 0,
		};

		let depth = if record.is_genesis() { reader.read_u8()? } else { 0 };
		Ok(TxsRecord { depth, ..record })
	}
}

pub struct TxsTable {
	map: ArrayMap<SlabLink>,
}

impl TxsTable {
	pub fn new(head: Arc<Storage>, body: Arc<Storage>, initial_buckets: u64) -> Self {
		TxsTable { map: ArrayMap::slabs(head, body, initial_buckets) }
	}

	pub fn inner(&self) -> &ArrayMap<SlabLink> {
		&self.map
	}

	pub fn put(&self, header_fk: u64, record: &TxsRecord) -> Result<SlabLink> {
		let mut writer = ByteWriter::with_capacity(record.serialized_size());
		record.write(&mut writer);
		self.map.put(header_fk, writer.as_slice())
	}

	pub fn is_associated(&self, header_fk: u64) -> Result<bool> {
		self.map.exists(header_fk)
	}

	pub fn get(&self, header_fk: u64) -> Result<TxsRecord> {
		self.map.get(header_fk, TxsRecord::read)
	}

	pub fn get_tx_fks(&self, header_fk: u64) -> Result<Vec<TxLink>> {
		self.map.get(header_fk, |reader| {
			reader.skip(6)?;
			let count = reader.read_le(3)? as usize;
			let mut tx_fks = Vec::with_capacity(count);
			for _ in 0..count {
				tx_fks.push(TxLink::from_value(reader.read_u32()? as u64 & TxLink::mask()));
			}
			Ok(tx_fks)
		})
	}

	pub fn get_coinbase(&self, header_fk: u64) -> Result<Option<TxLink>> {
		self.map.get(header_fk, |reader| {
			reader.skip(6)?;
			let count = reader.read_le(3)?;
			if count == 0 {
				return Ok(None);
			}
			Ok(Some(TxLink::from_value(reader.read_u32()? as u64 & TxLink::mask())))
		})
	}

	pub fn get_tx_count(&self, header_fk: u64) -> Result<u64> {
		self.map.get(header_fk, |reader| {
			reader.skip(6)?;
			reader.read_le(3)
		})
	}

	/// (light, heavy) block sizes.
	pub fn get_sizes(&self, header_fk: u64) -> Result<(u32, u32)> {
		self.map.get(header_fk, |reader| {
			let merged = reader.read_le(3)? as u32;
			let heavy = reader.read_le(3)? as u32;
			Ok((to_light(merged), heavy))
		})
	}

	pub fn get_interval(&self, header_fk: u64) -> Result<Option<Hash>> {
		self.map.get(header_fk, |reader| {
			let merged = reader.read_le(3)? as u32;
			if !is_interval(merged) {
				return Ok(None);
			}
			reader.skip(3)?;
			let count = reader.read_le(3)? as usize;
			reader.skip(count * TxLink::SIZE)?;
			Ok(Some(reader.read_hash()?))
		})
	}

	/// Genesis association depth, stored only for the genesis block.
	pub fn get_genesis_depth(&self, header_fk: u64) -> Result<Option<u8>> {
		let record = self.get(header_fk)?;
		if record.is_genesis() {
			Ok(Some(record.depth))
		} else {
			Ok(None)
		}
	}
}
