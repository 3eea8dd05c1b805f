//! Point archive: empty-payload records providing a compression
//! mapping between 32-byte prevout tx hashes and 4-byte links. Each
//! record is next(4) + hash(32) = 36 bytes; the low three bytes of a
//! record's link form the stub used by the spend table.

use std::sync::Arc;

use chain::Hash;
use error::Result;
use keys::Key;
use link::{Link, PointLink};
use sieve::Sieve;
use storage::Storage;
use table::HashMap;

/// Truncate a point link to its spend-table stub.
pub fn to_stub(link: PointLink) -> u32 {
	(link.value() & 0xff_ffff) as u32
}

pub struct PointTable {
	map: HashMap<PointLink>,
}

impl PointTable {
	pub fn new(head: Arc<Storage>, body: Arc<Storage>, buckets: u64) -> Self {
		PointTable {
			map: HashMap::records(head, body, buckets, Sieve::new(4), 32, 0),
		}
	}

	pub fn inner(&self) -> &HashMap<PointLink> {
		&self.map
	}

	/// The link for a hash, inserting it on first sight.
	pub fn put_if_absent(&self, hash: &Hash) -> Result<PointLink> {
		let existing = self.map.first(&Key::Plain(hash))?;
		if !existing.is_terminal() {
			return Ok(existing);
		}
		self.map.put(&Key::Plain(hash), &[])
	}

	pub fn first(&self, hash: &Hash) -> Result<PointLink> {
		self.map.first(&Key::Plain(hash))
	}

	pub fn get_key(&self, link: PointLink) -> Result<Hash> {
		let bytes = self.map.get_key(link)?;
		let mut hash = [0u8; 32];
		hash.copy_from_slice(&bytes);
		Ok(hash)
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use super::{to_stub, PointTable};
	use link::{Link, PointLink};
	use storage::ChunkStorage;

	#[test]
	fn test_dedup_and_stub() {
		let table = PointTable::new(
			Arc::new(ChunkStorage::new()),
			Arc::new(ChunkStorage::new()),
			8,
		);
		table.inner().create().unwrap();

		let hash = [0x77u8; 32];
		let link = table.put_if_absent(&hash).unwrap();
		assert_eq!(table.put_if_absent(&hash).unwrap(), link);
		assert_eq!(table.inner().count(), 1);
		assert_eq!(table.get_key(link).unwrap(), hash);

		let other = [0x78u8; 32];
		let second = table.put_if_absent(&other).unwrap();
		assert_eq!(second.value(), 1);
		assert_eq!(table.inner().count(), 2);
	}

	#[test]
	fn test_stub_truncation() {
		assert_eq!(to_stub(PointLink::from_value(0x0102_0304)), 0x02_0304);
	}

	#[test]
	fn test_record_is_36_bytes() {
		let head = Arc::new(ChunkStorage::new());
		let body = Arc::new(ChunkStorage::new());
		let table = PointTable::new(head, body.clone(), 8);
		table.inner().create().unwrap();

		table.put_if_absent(&[0x01; 32]).unwrap();
		assert_eq!(body.buffer().len(), 36);
	}
}
