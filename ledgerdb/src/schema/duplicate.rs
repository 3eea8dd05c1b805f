//! Duplicate coinbase hashes: an empty-payload presence table. A hash
//! lands here when a coinbase repeats one already archived, which is
//! what makes the BIP30 scan affordable.

use std::sync::Arc;

use chain::Hash;
use error::Result;
use keys::Key;
use link::DuplicateLink;
use sieve::Sieve;
use storage::Storage;
use table::HashMap;

pub struct DuplicateTable {
	map: HashMap<DuplicateLink>,
}

impl DuplicateTable {
	pub fn new(head: Arc<Storage>, body: Arc<Storage>, buckets: u64) -> Self {
		DuplicateTable {
			map: HashMap::records(head, body, buckets, Sieve::new(4), 32, 0),
		}
	}

	pub fn inner(&self) -> &HashMap<DuplicateLink> {
		&self.map
	}

	pub fn put(&self, hash: &Hash) -> Result<()> {
		if self.contains(hash)? {
			return Ok(());
		}
		self.map.put(&Key::Plain(hash), &[]).map(|_| ())
	}

	pub fn contains(&self, hash: &Hash) -> Result<bool> {
		self.map.exists(&Key::Plain(hash))
	}
}
