//! Validation state caches.
//!
//! `validated_bk` is a slab arraymap keyed by header link: a code byte
//! followed by varint fees when (and only when) the code is
//! block-confirmable. `validated_tx` is a slab hashmap keyed by tx
//! link: context, code, varint fee and varint sigops; one tx may carry
//! one record per validation context.

use std::sync::Arc;

use error::{Code, Result};
use keys::Key;
use link::{HeightLink, Link, SlabLink, TxLink};
use schema::Context;
use serial::{ByteReader, ByteWriter};
use sieve::Sieve;
use storage::Storage;
use table::{ArrayMap, HashMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBkRecord {
	pub code: u8,
	pub fees: Option<u64>,
}

impl ValidatedBkRecord {
	pub fn confirmable(fees: u64) -> ValidatedBkRecord {
		ValidatedBkRecord { code: Code::BlockConfirmable as u8, fees: Some(fees) }
	}

	pub fn plain(code: Code) -> ValidatedBkRecord {
		ValidatedBkRecord { code: code as u8, fees: None }
	}

	pub fn write(&self, writer: &mut ByteWriter) {
		writer.write_u8(self.code);
		if self.code == Code::BlockConfirmable as u8 {
			writer.write_varint(self.fees.unwrap_or(0));
		}
	}

	pub fn read(reader: &mut ByteReader) -> Result<ValidatedBkRecord> {
		let code = reader.read_u8()?;
		let fees = if code == Code::BlockConfirmable as u8 {
			Some(reader.read_varint()?)
		} else {
			None
		};
		Ok(ValidatedBkRecord { code, fees })
	}
}

pub struct ValidatedBkTable {
	map: ArrayMap<HeightLink>,
}

impl ValidatedBkTable {
	pub fn new(head: Arc<Storage>, body: Arc<Storage>, initial_buckets: u64) -> Self {
		ValidatedBkTable { map: ArrayMap::slabs(head, body, initial_buckets) }
	}

	pub fn inner(&self) -> &ArrayMap<HeightLink> {
		&self.map
	}

	pub fn put(&self, header_fk: u64, record: &ValidatedBkRecord) -> Result<HeightLink> {
		let mut writer = ByteWriter::new();
		record.write(&mut writer);
		self.map.put(header_fk, writer.as_slice())
	}

	pub fn get(&self, header_fk: u64) -> Result<Option<ValidatedBkRecord>> {
		let link = self.map.at(header_fk)?;
		if link.is_terminal() {
			return Ok(None);
		}
		self.map.read(link, ValidatedBkRecord::read).map(Some)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTxRecord {
	pub ctx: Context,
	pub code: u8,
	pub fee: u64,
	pub sigops: u64,
}

impl ValidatedTxRecord {
	pub fn write(&self, writer: &mut ByteWriter) {
		self.ctx.write(writer);
		writer.write_u8(self.code);
		writer.write_varint(self.fee);
		writer.write_varint(self.sigops);
	}

	pub fn read(reader: &mut ByteReader) -> Result<ValidatedTxRecord> {
		Ok(ValidatedTxRecord {
			ctx: Context::read(reader)?,
			code: reader.read_u8()?,
			fee: reader.read_varint()?,
			sigops: reader.read_varint()?,
		})
	}
}

pub struct ValidatedTxTable {
	map: HashMap<SlabLink>,
}

impl ValidatedTxTable {
	pub fn new(head: Arc<Storage>, body: Arc<Storage>, buckets: u64) -> Self {
		ValidatedTxTable {
			map: HashMap::slabs(head, body, buckets, Sieve::disabled(), TxLink::SIZE),
		}
	}

	pub fn inner(&self) -> &HashMap<SlabLink> {
		&self.map
	}

	pub fn put(&self, tx_fk: TxLink, record: &ValidatedTxRecord) -> Result<SlabLink> {
		let key_bytes = tx_fk.to_bytes();
		let mut writer = ByteWriter::new();
		record.write(&mut writer);
		self.map.put(&Key::Plain(&key_bytes), writer.as_slice())
	}

	/// The newest record for this tx under the given context.
	pub fn get_in_context(&self, tx_fk: TxLink, ctx: &Context) -> Result<Option<ValidatedTxRecord>> {
		let key_bytes = tx_fk.to_bytes();
		let links: Vec<SlabLink> = self.map.iter(&Key::Plain(&key_bytes))?.collect();
		for link in links {
			let record = self.map.read(link, ValidatedTxRecord::read)?;
			if record.ctx == *ctx {
				return Ok(Some(record));
			}
		}
		Ok(None)
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use super::{ValidatedBkRecord, ValidatedBkTable, ValidatedTxRecord, ValidatedTxTable};
	use link::{Link, TxLink};
	use schema::Context;
	use storage::ChunkStorage;

	// Head bytes after two puts into an eight-bucket table: zero body
	// count, slots zero and one assigned, the rest terminal.
	fn expected_head() -> Vec<u8> {
		let mut head = vec![
			0x00, 0x00, 0x00,
			0x00, 0x00, 0x00,
			0x01, 0x00, 0x00,
		];
		head.extend_from_slice(&[0xff; 6 * 3]);
		head
	}

	#[test]
	fn test_validated_bk_expected_bytes() {
		let head = Arc::new(ChunkStorage::new());
		let body = Arc::new(ChunkStorage::new());
		let table = ValidatedBkTable::new(head.clone(), body.clone(), 8);
		table.inner().create().unwrap();

		let record1 = ValidatedBkRecord { code: 0x42, fees: None };
		let record2 = ValidatedBkRecord { code: 0xab, fees: None };

		table.put(0, &record1).unwrap();
		assert_eq!(table.inner().at(0).unwrap().value(), 0);
		table.put(1, &record2).unwrap();
		assert_eq!(table.inner().at(1).unwrap().value(), 1);

		assert_eq!(head.buffer(), expected_head());
		assert_eq!(body.buffer(), vec![0x42, 0xab]);

		// Close persists the slab byte count.
		table.inner().close().unwrap();
		let mut closed = expected_head();
		closed[0] = 0x02;
		assert_eq!(head.buffer(), closed);

		assert_eq!(table.get(0).unwrap(), Some(record1));
		assert_eq!(table.get(1).unwrap(), Some(record2));
		assert_eq!(table.get(2).unwrap(), None);
	}

	#[test]
	fn test_validated_bk_confirmable_fees() {
		let table = ValidatedBkTable::new(
			Arc::new(ChunkStorage::new()),
			Arc::new(ChunkStorage::new()),
			2,
		);
		table.inner().create().unwrap();

		let record = ValidatedBkRecord::confirmable(42);
		table.put(1, &record).unwrap();
		assert_eq!(table.get(1).unwrap(), Some(record));
	}

	#[test]
	fn test_validated_tx_per_context() {
		let table = ValidatedTxTable::new(
			Arc::new(ChunkStorage::new()),
			Arc::new(ChunkStorage::new()),
			1,
		);
		table.inner().create().unwrap();

		let tx = TxLink::from_value(2);
		let ctx = Context::new(7, 8, 9);
		let other = Context::new(1, 5, 9);

		let connected = ValidatedTxRecord { ctx, code: 6, fee: 42, sigops: 24 };
		table.put(tx, &connected).unwrap();
		table.put(tx, &ValidatedTxRecord { ctx: other, code: 6, fee: 15, sigops: 16 }).unwrap();

		assert_eq!(table.get_in_context(tx, &ctx).unwrap(), Some(connected));
		assert_eq!(table.get_in_context(tx, &Context::new(2, 6, 0)).unwrap(), None);
		assert_eq!(table.get_in_context(TxLink::from_value(9), &ctx).unwrap(), None);
	}
}
