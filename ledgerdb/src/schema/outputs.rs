//! Output storage: the `output` slab holds serialized value and
//! script; the `puts` table holds one output_fk per record,
//! contiguous per transaction from `tx.outs_fk`.

use std::sync::Arc;

use error::Result;
use link::{Link, PutLink, SlabLink};
use serial::ByteWriter;
use storage::Storage;
use table::NoMap;

pub struct PutsTable {
	map: NoMap<PutLink>,
}

impl PutsTable {
	pub fn new(head: Arc<Storage>, body: Arc<Storage>) -> Self {
		PutsTable { map: NoMap::records(head, body, SlabLink::SIZE) }
	}

	pub fn inner(&self) -> &NoMap<PutLink> {
		&self.map
	}

	pub fn allocate(&self, count: usize) -> Result<PutLink> {
		self.map.allocate(count)
	}

	pub fn write_put(&self, link: PutLink, out_fk: SlabLink) -> Result<()> {
		self.map.write_record(link, &out_fk.to_bytes())
	}

	pub fn get(&self, link: PutLink) -> Result<SlabLink> {
		self.map.read(link, SlabLink::read)
	}

	/// The contiguous output links of one transaction.
	pub fn get_range(&self, first: PutLink, count: usize) -> Result<Vec<SlabLink>> {
		let mut out = Vec::with_capacity(count);
		for offset in 0..count as u64 {
			out.push(self.get(PutLink::from_value(first.value() + offset))?);
		}
		Ok(out)
	}
}

/// Serialized output value and script.
pub struct OutputTable {
	map: NoMap<SlabLink>,
}

impl OutputTable {
	pub fn new(head: Arc<Storage>, body: Arc<Storage>) -> Self {
		OutputTable { map: NoMap::slabs(head, body) }
	}

	pub fn inner(&self) -> &NoMap<SlabLink> {
		&self.map
	}

	pub fn put(&self, value: u64, script: &[u8]) -> Result<SlabLink> {
		let mut writer = ByteWriter::new();
		writer.write_varint(value);
		writer.write_varint(script.len() as u64);
		writer.write_bytes(script);
		self.map.put(writer.as_slice())
	}

	pub fn get(&self, link: SlabLink) -> Result<(u64, Vec<u8>)> {
		self.map.read(link, |reader| {
			let value = reader.read_varint()?;
			let script_len = reader.read_varint()? as usize;
			let script = reader.read_bytes(script_len)?.to_vec();
			Ok((value, script))
		})
	}

	pub fn get_value(&self, link: SlabLink) -> Result<u64> {
		self.map.read(link, |reader| reader.read_varint())
	}
}
