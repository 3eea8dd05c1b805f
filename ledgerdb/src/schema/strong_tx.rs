//! Strong-transaction associations: a record hashmap keyed by tx link.
//!
//! The payload merges the association polarity into bit 23 of the
//! header link. The newest record in a chain is authoritative, so
//! set_unstrong simply pushes a negative record.

use std::sync::Arc;

use error::Result;
use keys::Key;
use link::{HeaderLink, Link, StrongLink, TxLink};
use serial::ByteWriter;
use sieve::Sieve;
use storage::Storage;
use table::HashMap;

pub const PAYLOAD_SIZE: usize = HeaderLink::SIZE;

pub struct StrongTxTable {
	map: HashMap<StrongLink>,
}

impl StrongTxTable {
	pub fn new(head: Arc<Storage>, body: Arc<Storage>, buckets: u64) -> Self {
		StrongTxTable {
			map: HashMap::records(head, body, buckets, Sieve::disabled(), TxLink::SIZE, PAYLOAD_SIZE),
		}
	}

	pub fn inner(&self) -> &HashMap<StrongLink> {
		&self.map
	}

	pub fn put(&self, tx_fk: TxLink, header_fk: HeaderLink, positive: bool) -> Result<StrongLink> {
		let key_bytes = tx_fk.to_bytes();
		let mut writer = ByteWriter::with_capacity(PAYLOAD_SIZE);
		writer.write_le(header_fk.to_merged(positive), HeaderLink::SIZE);
		self.map.put(&Key::Plain(&key_bytes), writer.as_slice())
	}

	/// The authoritative association for a tx: the header it is strong
	/// in, or terminal when unknown or last unset.
	pub fn to_block(&self, tx_fk: TxLink) -> Result<HeaderLink> {
		let key_bytes = tx_fk.to_bytes();
		let link = self.map.first(&Key::Plain(&key_bytes))?;
		if link.is_terminal() {
			return Ok(HeaderLink::terminal());
		}

		let (positive, header_fk) = self.map.read(link, |reader| {
			Ok(HeaderLink::from_merged(reader.read_le(HeaderLink::SIZE)?))
		})?;

		if positive {
			Ok(header_fk)
		} else {
			Ok(HeaderLink::terminal())
		}
	}

	pub fn is_strong(&self, tx_fk: TxLink) -> Result<bool> {
		self.to_block(tx_fk).map(|link| !link.is_terminal())
	}
}
