//! Candidate and confirmed chain indexes: record arraymaps keyed by
//! height, each element a header link. Pushes publish the slot after
//! the header exists; pops retire the top slot and its element.

use std::sync::Arc;

use error::{ErrorKind, Result};
use link::{HeaderLink, HeightLink, Link};
use storage::Storage;
use table::ArrayMap;

pub struct HeightTable {
	map: ArrayMap<HeightLink>,
}

impl HeightTable {
	pub fn new(head: Arc<Storage>, body: Arc<Storage>, initial_buckets: u64) -> Self {
		HeightTable {
			map: ArrayMap::records(head, body, initial_buckets, HeaderLink::SIZE),
		}
	}

	pub fn inner(&self) -> &ArrayMap<HeightLink> {
		&self.map
	}

	pub fn push(&self, height: u64, header_fk: HeaderLink) -> Result<()> {
		self.map.put(height, &header_fk.to_bytes()).map(|_| ())
	}

	pub fn at(&self, height: u64) -> Result<HeaderLink> {
		let link = self.map.at(height)?;
		if link.is_terminal() {
			return Ok(HeaderLink::terminal());
		}
		self.map.read(link, HeaderLink::read)
	}

	/// Height of the highest assigned slot. Pushes are sequential, so
	/// at most the initial slots scan terminal.
	pub fn top(&self) -> Result<u64> {
		let mut height = self.map.buckets();
		while height > 0 {
			height -= 1;
			if !self.map.at(height)?.is_terminal() {
				return Ok(height);
			}
		}
		Err(ErrorKind::NotFound.into())
	}

	pub fn pop(&self) -> Result<()> {
		let top = self.top()?;
		self.map.pop(top)
	}
}
