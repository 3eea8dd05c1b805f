//! Transaction archive keyed by tx hash.
//!
//! Record layout after `[next][key]`: coinbase(1), light(3), heavy(3),
//! locktime(4), version(4), ins_count(3), outs_count(3), point_fk(4),
//! outs_fk(4). `point_fk` is the first per-input slot in the ins
//! table, `outs_fk` the first record in the puts table; both ranges
//! are contiguous per transaction.

use std::sync::Arc;

use chain::Hash;
use error::Result;
use keys::Key;
use link::{InsLink, Link, PutLink, TxLink};
use serial::{ByteReader, ByteWriter};
use sieve::Sieve;
use storage::Storage;
use table::{ChainIter, HashMap};

pub const PAYLOAD_SIZE: usize = 1 + 3 + 3 + 4 + 4 + 3 + 3 + 4 + 4;

const SKIP_TO_COUNTS: usize = 1 + 3 + 3 + 4 + 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRecord {
	pub coinbase: bool,
	pub light: u32,
	pub heavy: u32,
	pub locktime: u32,
	pub version: u32,
	pub ins_count: u32,
	pub outs_count: u32,
	pub point_fk: InsLink,
	pub outs_fk: PutLink,
}

impl TxRecord {
	pub fn write(&self, writer: &mut ByteWriter) {
		writer.write_u8(self.coinbase as u8);
		writer.write_le(self.light as u64, 3);
		writer.write_le(self.heavy as u64, 3);
		writer.write_u32(self.locktime);
		writer.write_u32(self.version);
		writer.write_le(self.ins_count as u64, 3);
		writer.write_le(self.outs_count as u64, 3);
		writer.write_u32(self.point_fk.value() as u32);
		writer.write_u32(self.outs_fk.value() as u32);
	}

	pub fn read(reader: &mut ByteReader) -> Result<TxRecord> {
		Ok(TxRecord {
			coinbase: reader.read_u8()? != 0,
			light: reader.read_le(3)? as u32,
			heavy: reader.read_le(3)? as u32,
			locktime: reader.read_u32()?,
			version: reader.read_u32()?,
			ins_count: reader.read_le(3)? as u32,
			outs_count: reader.read_le(3)? as u32,
			point_fk: InsLink::from_value(reader.read_u32()? as u64),
			outs_fk: PutLink::from_value(reader.read_u32()? as u64),
		})
	}
}

pub struct TxTable {
	map: HashMap<TxLink>,
}

impl TxTable {
	pub fn new(head: Arc<Storage>, body: Arc<Storage>, buckets: u64) -> Self {
		TxTable {
			map: HashMap::records(head, body, buckets, Sieve::new(4), 32, PAYLOAD_SIZE),
		}
	}

	pub fn inner(&self) -> &HashMap<TxLink> {
		&self.map
	}

	pub fn put(&self, key: &Hash, record: &TxRecord) -> Result<TxLink> {
		let mut writer = ByteWriter::with_capacity(PAYLOAD_SIZE);
		record.write(&mut writer);
		self.map.put(&Key::Plain(key), writer.as_slice())
	}

	pub fn first(&self, key: &Hash) -> Result<TxLink> {
		self.map.first(&Key::Plain(key))
	}

	/// All records sharing a hash, newest first. Duplicate coinbases
	/// make this a genuine multimap.
	pub fn iter(&self, key: &Hash) -> Result<ChainIter<TxLink>> {
		self.map.iter(&Key::Plain(key))
	}

	pub fn get(&self, link: TxLink) -> Result<TxRecord> {
		self.map.read(link, TxRecord::read)
	}

	pub fn get_key(&self, link: TxLink) -> Result<Hash> {
		let bytes = self.map.get_key(link)?;
		let mut hash = [0u8; 32];
		hash.copy_from_slice(&bytes);
		Ok(hash)
	}

	pub fn is_coinbase(&self, link: TxLink) -> Result<bool> {
		self.map.read(link, |reader| Ok(reader.read_u8()? != 0))
	}

	/// (light, heavy) serialized sizes.
	pub fn get_sizes(&self, link: TxLink) -> Result<(u32, u32)> {
		self.map.read(link, |reader| {
			reader.skip(1)?;
			let light = reader.read_le(3)? as u32;
			let heavy = reader.read_le(3)? as u32;
			Ok((light, heavy))
		})
	}

	/// (ins_count, outs_count, point_fk, outs_fk).
	pub fn get_puts(&self, link: TxLink) -> Result<(u32, u32, InsLink, PutLink)> {
		self.map.read(link, |reader| {
			reader.skip(SKIP_TO_COUNTS)?;
			let ins = reader.read_le(3)? as u32;
			let outs = reader.read_le(3)? as u32;
			let point_fk = InsLink::from_value(reader.read_u32()? as u64);
			let outs_fk = PutLink::from_value(reader.read_u32()? as u64);
			Ok((ins, outs, point_fk, outs_fk))
		})
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use super::{TxRecord, TxTable};
	use link::{InsLink, Link, PutLink, TxLink};
	use storage::ChunkStorage;

	fn test_key() -> [u8; 32] {
		let mut key = [0u8; 32];
		key[0] = 0x11;
		for (index, byte) in key.iter_mut().enumerate().skip(1).take(15) {
			*byte = index as u8;
		}
		key[16] = 0x22;
		for index in 17..32 {
			key[index] = (index - 16) as u8;
		}
		key
	}

	fn expected() -> TxRecord {
		TxRecord {
			coinbase: true,
			light: 0x0034_1201,
			heavy: 0x0034_1202,
			locktime: 0x5634_1203,
			version: 0x5634_1204,
			ins_count: 0x0034_1205,
			outs_count: 0x0034_1206,
			point_fk: InsLink::from_value(0x5634_1207),
			outs_fk: PutLink::from_value(0x5634_1208),
		}
	}

	// The canonical record byte vector: a default record under the
	// null key, then the populated record under the test key.
	fn expected_file() -> Vec<u8> {
		let mut file = Vec::new();

		// next
		file.extend_from_slice(&[0xff, 0xff, 0xff, 0x7f]);
		// key
		file.extend_from_slice(&[0u8; 32]);
		// record
		file.extend_from_slice(&[
			0x00,
			0x00, 0x00, 0x00,
			0x00, 0x00, 0x00,
			0x00, 0x00, 0x00, 0x00,
			0x00, 0x00, 0x00, 0x00,
			0x00, 0x00, 0x00,
			0x00, 0x00, 0x00,
			0x00, 0x00, 0x00, 0x00,
			0x00, 0x00, 0x00, 0x00,
		]);

		// next
		file.extend_from_slice(&[0xff, 0xff, 0xff, 0x7f]);
		// key
		file.extend_from_slice(&test_key());
		// record
		file.extend_from_slice(&[
			0x01,
			0x01, 0x12, 0x34,
			0x02, 0x12, 0x34,
			0x03, 0x12, 0x34, 0x56,
			0x04, 0x12, 0x34, 0x56,
			0x05, 0x12, 0x34,
			0x06, 0x12, 0x34,
			0x07, 0x12, 0x34, 0x56,
			0x08, 0x12, 0x34, 0x56,
		]);

		file
	}

	fn default_record() -> TxRecord {
		TxRecord {
			coinbase: false,
			light: 0,
			heavy: 0,
			locktime: 0,
			version: 0,
			ins_count: 0,
			outs_count: 0,
			point_fk: InsLink::from_value(0),
			outs_fk: PutLink::from_value(0),
		}
	}

	fn table_with_body() -> (TxTable, Arc<ChunkStorage>) {
		let head = Arc::new(ChunkStorage::new());
		let body = Arc::new(ChunkStorage::new());
		let table = TxTable::new(head, body.clone(), 20);
		table.inner().create().unwrap();
		(table, body)
	}

	#[test]
	fn test_put_get_expected_bytes() {
		let (table, body) = table_with_body();

		let first = table.put(&[0u8; 32], &default_record()).unwrap();
		assert!(!first.is_terminal());
		let second = table.put(&test_key(), &expected()).unwrap();
		assert!(!second.is_terminal());
		assert_eq!(second, TxLink::from_value(1));
		assert_eq!(body.buffer(), expected_file());

		assert_eq!(table.get(TxLink::from_value(0)).unwrap(), default_record());
		assert_eq!(table.get(TxLink::from_value(1)).unwrap(), expected());
	}

	#[test]
	fn test_get_key() {
		let (table, body) = table_with_body();
		table.put(&[0u8; 32], &default_record()).unwrap();
		table.put(&test_key(), &expected()).unwrap();
		assert_eq!(body.buffer(), expected_file());
		assert_eq!(table.get_key(TxLink::from_value(1)).unwrap(), test_key());
	}

	#[test]
	fn test_get_puts() {
		let (table, _) = table_with_body();
		table.put(&[0u8; 32], &default_record()).unwrap();
		table.put(&test_key(), &expected()).unwrap();

		let (ins, outs, point_fk, outs_fk) = table.get_puts(TxLink::from_value(1)).unwrap();
		assert_eq!(ins, 0x0034_1205);
		assert_eq!(outs, 0x0034_1206);
		assert_eq!(point_fk.value(), 0x5634_1207);
		assert_eq!(outs_fk.value(), 0x5634_1208);
	}

	#[test]
	fn test_iter_finds_link() {
		let (table, _) = table_with_body();
		table.put(&[0u8; 32], &default_record()).unwrap();
		table.put(&test_key(), &expected()).unwrap();

		let mut it = table.iter(&test_key()).unwrap();
		assert_eq!(it.next(), Some(TxLink::from_value(1)));
		assert_eq!(it.next(), None);
	}
}
