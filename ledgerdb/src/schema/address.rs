//! Optional address index: a record multimap from 20-byte script
//! hashes to output links.

use std::sync::Arc;

use error::Result;
use keys::Key;
use link::{AddressLink, Link, SlabLink};
use sieve::Sieve;
use storage::Storage;
use table::HashMap;

pub struct AddressTable {
	map: HashMap<AddressLink>,
}

impl AddressTable {
	pub fn new(head: Arc<Storage>, body: Arc<Storage>, buckets: u64) -> Self {
		AddressTable {
			map: HashMap::records(head, body, buckets, Sieve::disabled(), 20, SlabLink::SIZE),
		}
	}

	pub fn inner(&self) -> &HashMap<AddressLink> {
		&self.map
	}

	pub fn put(&self, hash: &[u8; 20], output_fk: SlabLink) -> Result<AddressLink> {
		self.map.put(&Key::Plain(hash), &output_fk.to_bytes())
	}

	/// Every output paying the hash, newest first.
	pub fn outputs(&self, hash: &[u8; 20]) -> Result<Vec<SlabLink>> {
		let links: Vec<AddressLink> = self.map.iter(&Key::Plain(hash))?.collect();
		let mut outputs = Vec::with_capacity(links.len());
		for link in links {
			outputs.push(self.map.read(link, SlabLink::read)?);
		}
		Ok(outputs)
	}
}
