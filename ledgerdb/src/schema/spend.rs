//! Spend relations keyed by outpoint.
//!
//! The stored key is the 3-byte point stub plus the 3-byte truncated
//! output index; buckets are chosen from the full (hash, index) pair,
//! with the null outpoint owning bucket zero. Entries sharing a
//! (stub, index) key need not share a prevout hash; readers resolve
//! collisions through the point table at `point_fk`.
//!
//! Payload: tx_fk(4) of the spending transaction, point_fk(4),
//! point_index(3), sequence(4).

use std::sync::Arc;

use chain::Hash;
use error::Result;
use keys::Key;
use link::{Link, PointLink, SpendLink, TxLink};
use schema::point::to_stub;
use serial::{ByteReader, ByteWriter};
use sieve::Sieve;
use storage::Storage;
use table::{ChainIter, HashMap};

pub const PAYLOAD_SIZE: usize = 4 + 4 + 3 + 4;
pub const KEY_SIZE: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendRecord {
	/// The spending transaction.
	pub tx_fk: TxLink,
	pub point_fk: PointLink,
	pub point_index: u32,
	pub sequence: u32,
}

impl SpendRecord {
	pub fn write(&self, writer: &mut ByteWriter) {
		writer.write_u32(self.tx_fk.value() as u32);
		writer.write_u32(self.point_fk.value() as u32);
		writer.write_le((self.point_index & 0xff_ffff) as u64, 3);
		writer.write_u32(self.sequence);
	}

	pub fn read(reader: &mut ByteReader) -> Result<SpendRecord> {
		Ok(SpendRecord {
			tx_fk: TxLink::from_value(reader.read_u32()? as u64 & TxLink::mask()),
			point_fk: PointLink::from_value(reader.read_u32()? as u64),
			point_index: reader.read_le(3)? as u32,
			sequence: reader.read_u32()?,
		})
	}
}

pub struct SpendTable {
	map: HashMap<SpendLink>,
}

impl SpendTable {
	pub fn new(head: Arc<Storage>, body: Arc<Storage>, buckets: u64) -> Self {
		assert!(buckets >= 2, "bucket zero is reserved for the null outpoint");
		SpendTable {
			map: HashMap::records(head, body, buckets, Sieve::new(4), KEY_SIZE, PAYLOAD_SIZE),
		}
	}

	pub fn inner(&self) -> &HashMap<SpendLink> {
		&self.map
	}

	pub fn compose<'a>(hash: &'a Hash, index: u32, point_fk: PointLink) -> Key<'a> {
		Key::Point { hash, index, stub: to_stub(point_fk) }
	}

	pub fn put(&self, key: &Key, record: &SpendRecord) -> Result<SpendLink> {
		let mut writer = ByteWriter::with_capacity(PAYLOAD_SIZE);
		record.write(&mut writer);
		self.map.put(key, writer.as_slice())
	}

	/// All spenders of an outpoint, newest first, stub collisions
	/// included.
	pub fn iter(&self, key: &Key) -> Result<ChainIter<SpendLink>> {
		self.map.iter(key)
	}

	pub fn get(&self, link: SpendLink) -> Result<SpendRecord> {
		self.map.read(link, SpendRecord::read)
	}
}
