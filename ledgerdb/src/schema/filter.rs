//! Optional compact-filter storage. `filter_bk` keys a 32-byte filter
//! header plus filter bytes by header link; `filter_tx` keys bare
//! filter bytes by tx link. Filter construction is the caller's
//! concern.

use std::sync::Arc;

use chain::Hash;
use error::Result;
use link::{Link, SlabLink};
use serial::{ByteReader, ByteWriter};
use storage::Storage;
use table::ArrayMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterBkRecord {
	pub filter_head: Hash,
	pub filter: Vec<u8>,
}

impl FilterBkRecord {
	pub fn write(&self, writer: &mut ByteWriter) {
		writer.write_bytes(&self.filter_head);
		writer.write_varint(self.filter.len() as u64);
		writer.write_bytes(&self.filter);
	}

	pub fn read(reader: &mut ByteReader) -> Result<FilterBkRecord> {
		let filter_head = reader.read_hash()?;
		let len = reader.read_varint()? as usize;
		let filter = reader.read_bytes(len)?.to_vec();
		Ok(FilterBkRecord { filter_head, filter })
	}
}

pub struct FilterBkTable {
	map: ArrayMap<SlabLink>,
}

impl FilterBkTable {
	pub fn new(head: Arc<Storage>, body: Arc<Storage>, initial_buckets: u64) -> Self {
		FilterBkTable { map: ArrayMap::slabs(head, body, initial_buckets) }
	}

	pub fn inner(&self) -> &ArrayMap<SlabLink> {
		&self.map
	}

	pub fn put(&self, header_fk: u64, record: &FilterBkRecord) -> Result<()> {
		let mut writer = ByteWriter::with_capacity(32 + 9 + record.filter.len());
		record.write(&mut writer);
		self.map.put(header_fk, writer.as_slice()).map(|_| ())
	}

	pub fn get(&self, header_fk: u64) -> Result<Option<FilterBkRecord>> {
		let link = self.map.at(header_fk)?;
		if link.is_terminal() {
			return Ok(None);
		}
		self.map.read(link, FilterBkRecord::read).map(Some)
	}

	pub fn get_head(&self, header_fk: u64) -> Result<Option<Hash>> {
		let link = self.map.at(header_fk)?;
		if link.is_terminal() {
			return Ok(None);
		}
		self.map.read(link, |reader| reader.read_hash()).map(Some)
	}
}

pub struct FilterTxTable {
	map: ArrayMap<SlabLink>,
}

impl FilterTxTable {
	pub fn new(head: Arc<Storage>, body: Arc<Storage>, initial_buckets: u64) -> Self {
		FilterTxTable { map: ArrayMap::slabs(head, body, initial_buckets) }
	}

	pub fn inner(&self) -> &ArrayMap<SlabLink> {
		&self.map
	}

	pub fn put(&self, tx_fk: u64, filter: &[u8]) -> Result<()> {
		let mut writer = ByteWriter::with_capacity(9 + filter.len());
		writer.write_varint(filter.len() as u64);
		writer.write_bytes(filter);
		self.map.put(tx_fk, writer.as_slice()).map(|_| ())
	}

	pub fn get(&self, tx_fk: u64) -> Result<Option<Vec<u8>>> {
		let link = self.map.at(tx_fk)?;
		if link.is_terminal() {
			return Ok(None);
		}
		self.map.read(link, |reader| {
			let len = reader.read_varint()? as usize;
			Ok(reader.read_bytes(len)?.to_vec())
		}).map(Some)
	}
}
