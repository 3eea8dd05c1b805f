//! Vector-backed storage for table and codec tests.

use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use error::Result;
use storage::{Lease, Storage};

/// In-memory storage. Mirrors the mapped file's lease and allocation
/// behavior without touching the filesystem; capacity grows on demand.
pub struct ChunkStorage {
	buffer: RwLock<Vec<u8>>,
	logical: AtomicUsize,
}

impl ChunkStorage {
	pub fn new() -> Self {
		ChunkStorage {
			buffer: RwLock::new(Vec::new()),
			logical: AtomicUsize::new(0),
		}
	}

	/// Storage preloaded with committed bytes.
	pub fn with_buffer(buffer: Vec<u8>) -> Self {
		let len = buffer.len();
		ChunkStorage {
			buffer: RwLock::new(buffer),
			logical: AtomicUsize::new(len),
		}
	}

	/// Copy of the committed bytes, for byte-level assertions.
	pub fn buffer(&self) -> Vec<u8> {
		self.buffer.read()[..self.size()].to_vec()
	}
}

impl Default for ChunkStorage {
	fn default() -> Self {
		ChunkStorage::new()
	}
}

impl Storage for ChunkStorage {
	fn load(&self) -> Result<()> {
		Ok(())
	}

	fn unload(&self) -> Result<()> {
		Ok(())
	}

	fn is_loaded(&self) -> bool {
		true
	}

	fn size(&self) -> usize {
		self.logical.load(Ordering::Acquire)
	}

	fn capacity(&self) -> usize {
		self.buffer.read().len()
	}

	fn read(&self) -> Result<Lease> {
		Ok(Lease::Chunk(self.buffer.read()))
	}

	fn write_at(&self, offset: usize, bytes: &[u8]) -> Result<()> {
		let guard = self.buffer.read();
		assert!(offset + bytes.len() <= guard.len(),
			"write beyond reserved capacity");

		// Writes target disjoint unpublished regions while readers
		// hold leases elsewhere in the buffer; the read guard only
		// prevents reallocation.
		unsafe {
			let target = guard.as_ptr().add(offset) as *mut u8;
			ptr::copy_nonoverlapping(bytes.as_ptr(), target, bytes.len());
		}

		Ok(())
	}

	fn allocate(&self, bytes: usize) -> Result<usize> {
		let offset = self.logical.fetch_add(bytes, Ordering::AcqRel);
		let required = offset + bytes;
		if required > self.capacity() {
			self.reserve(required)?;
		}
		Ok(offset)
	}

	fn resize(&self, size: usize) -> Result<()> {
		if size > self.capacity() {
			self.reserve(size)?;
		}
		self.logical.store(size, Ordering::Release);
		Ok(())
	}

	fn truncate(&self, size: usize) -> Result<()> {
		if size < self.size() {
			self.logical.store(size, Ordering::Release);
		}
		Ok(())
	}

	fn reserve(&self, capacity: usize) -> Result<()> {
		let mut guard = self.buffer.write();
		if capacity > guard.len() {
			guard.resize(capacity, 0);
		}
		Ok(())
	}

	fn flush(&self) -> Result<()> {
		Ok(())
	}

	fn get_space(&self) -> usize {
		0
	}

	fn reload(&self) -> Result<()> {
		Ok(())
	}
}
