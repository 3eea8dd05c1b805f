//! Logical allocators over a body storage.
//!
//! A record manager addresses fixed-size elements by ordinal; a slab
//! manager addresses variable-size elements by byte offset. Allocation
//! is an atomic bump of the storage's logical size, so concurrent
//! writers obtain disjoint regions; publication is the head's concern.

use std::marker::PhantomData;
use std::sync::Arc;

use error::{ErrorKind, Result};
use link::Link;
use storage::{Lease, Storage};

pub struct Manager<L: Link> {
	file: Arc<Storage>,
	// Some(bytes) for record managers, None for slabs.
	record_size: Option<usize>,
	_link: PhantomData<L>,
}

impl<L: Link> Manager<L> {
	pub fn records(file: Arc<Storage>, record_size: usize) -> Self {
		assert!(record_size > 0);
		Manager { file, record_size: Some(record_size), _link: PhantomData }
	}

	pub fn slabs(file: Arc<Storage>) -> Self {
		Manager { file, record_size: None, _link: PhantomData }
	}

	pub fn is_slab(&self) -> bool {
		self.record_size.is_none()
	}

	pub fn record_size(&self) -> Option<usize> {
		self.record_size
	}

	pub fn file(&self) -> &Arc<Storage> {
		&self.file
	}

	/// Record count, or next free byte offset for slabs.
	pub fn count(&self) -> u64 {
		match self.record_size {
			Some(size) => (self.file.size() / size) as u64,
			None => self.file.size() as u64,
		}
	}

	/// Allocate `n` records (or `n` slab bytes) and return the first
	/// element's link.
	pub fn allocate(&self, n: usize) -> Result<L> {
		let bytes = match self.record_size {
			Some(size) => n * size,
			None => n,
		};

		let offset = self.file.allocate(bytes)?;
		let link = match self.record_size {
			Some(size) => (offset / size) as u64,
			None => offset as u64,
		};

		// Eof: the link space is narrower than the offset space.
		if link.checked_add(n as u64).map_or(true, |end| end > L::mask()) {
			self.file.truncate(offset)?;
			return Err(ErrorKind::Integrity(9).into());
		}

		Ok(L::from_value(link))
	}

	/// Lower the element count; never raises it.
	pub fn truncate(&self, count: u64) -> Result<()> {
		let bytes = match self.record_size {
			Some(size) => count as usize * size,
			None => count as usize,
		};
		self.file.truncate(bytes)
	}

	pub fn link_to_position(&self, link: L) -> usize {
		debug_assert!(!link.is_terminal());
		match self.record_size {
			Some(size) => link.value() as usize * size,
			None => link.value() as usize,
		}
	}

	pub fn read(&self) -> Result<Lease> {
		self.file.read()
	}

	pub fn write_at(&self, position: usize, bytes: &[u8]) -> Result<()> {
		self.file.write_at(position, bytes)
	}
}
