//! Input storage: the `input` slab holds serialized script and
//! witness data; the `ins` table holds fixed per-input slots
//! (input_fk, spend_fk, sequence), contiguous per transaction from
//! `tx.point_fk`.

use std::sync::Arc;

use error::Result;
use link::{InsLink, Link, SlabLink, SpendLink};
use serial::{ByteReader, ByteWriter};
use storage::Storage;
use table::NoMap;

pub const INS_RECORD_SIZE: usize = SlabLink::SIZE + SpendLink::SIZE + 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsRecord {
	pub input_fk: SlabLink,
	pub spend_fk: SpendLink,
	pub sequence: u32,
}

impl InsRecord {
	pub fn write(&self, writer: &mut ByteWriter) {
		self.input_fk.write(writer);
		self.spend_fk.write(writer);
		writer.write_u32(self.sequence);
	}

	pub fn read(reader: &mut ByteReader) -> Result<InsRecord> {
		Ok(InsRecord {
			input_fk: SlabLink::read(reader)?,
			spend_fk: SpendLink::read(reader)?,
			sequence: reader.read_u32()?,
		})
	}
}

pub struct InsTable {
	map: NoMap<InsLink>,
}

impl InsTable {
	pub fn new(head: Arc<Storage>, body: Arc<Storage>) -> Self {
		InsTable { map: NoMap::records(head, body, INS_RECORD_SIZE) }
	}

	pub fn inner(&self) -> &NoMap<InsLink> {
		&self.map
	}

	/// Reserve one contiguous slot range for a transaction.
	pub fn allocate(&self, count: usize) -> Result<InsLink> {
		self.map.allocate(count)
	}

	pub fn write_slot(&self, link: InsLink, record: &InsRecord) -> Result<()> {
		let mut writer = ByteWriter::with_capacity(INS_RECORD_SIZE);
		record.write(&mut writer);
		self.map.write_record(link, writer.as_slice())
	}

	pub fn get(&self, link: InsLink) -> Result<InsRecord> {
		self.map.read(link, InsRecord::read)
	}
}

/// Serialized input script and witness stack.
pub struct InputTable {
	map: NoMap<SlabLink>,
}

impl InputTable {
	pub fn new(head: Arc<Storage>, body: Arc<Storage>) -> Self {
		InputTable { map: NoMap::slabs(head, body) }
	}

	pub fn inner(&self) -> &NoMap<SlabLink> {
		&self.map
	}

	pub fn put(&self, script: &[u8], witness: &[Vec<u8>]) -> Result<SlabLink> {
		let mut writer = ByteWriter::new();
		writer.write_varint(script.len() as u64);
		writer.write_bytes(script);
		writer.write_varint(witness.len() as u64);
		for item in witness {
			writer.write_varint(item.len() as u64);
			writer.write_bytes(item);
		}
		self.map.put(writer.as_slice())
	}

	pub fn get(&self, link: SlabLink) -> Result<(Vec<u8>, Vec<Vec<u8>>)> {
		self.map.read(link, |reader| {
			let script_len = reader.read_varint()? as usize;
			let script = reader.read_bytes(script_len)?.to_vec();
			let items = reader.read_varint()?;
			let mut witness = Vec::with_capacity(items as usize);
			for _ in 0..items {
				let len = reader.read_varint()? as usize;
				witness.push(reader.read_bytes(len)?.to_vec());
			}
			Ok((script, witness))
		})
	}
}
