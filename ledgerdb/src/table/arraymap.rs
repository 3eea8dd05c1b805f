//! Array-keyed table: one head slot per natural key.
//!
//! Body elements carry payload only; the key is the slot index. A
//! repeated put for the same index shadows the older element by
//! overwriting the slot. Readers that observe a slot may assume the
//! element behind it is fully written.

use std::sync::Arc;

use error::{ErrorKind, Result};
use head::ArrayHead;
use link::Link;
use manager::Manager;
use serial::ByteReader;
use storage::Storage;

pub struct ArrayMap<L: Link> {
	head: ArrayHead<L>,
	body: Manager<L>,
}

impl<L: Link> ArrayMap<L> {
	pub fn records(
		head_file: Arc<Storage>,
		body_file: Arc<Storage>,
		initial_buckets: u64,
		record_size: usize,
	) -> Self {
		ArrayMap {
			head: ArrayHead::new(head_file, initial_buckets),
			body: Manager::records(body_file, record_size),
		}
	}

	pub fn slabs(
		head_file: Arc<Storage>,
		body_file: Arc<Storage>,
		initial_buckets: u64,
	) -> Self {
		ArrayMap {
			head: ArrayHead::new(head_file, initial_buckets),
			body: Manager::slabs(body_file),
		}
	}

	pub fn create(&self) -> Result<()> {
		self.body.file().resize(0)?;
		self.head.create()
	}

	pub fn verify(&self) -> bool {
		self.head.verify()
	}

	pub fn open(&self) -> Result<()> {
		let count = self.head.get_body_count()?;
		if self.body.count() < count {
			return Err(ErrorKind::Integrity(2).into());
		}
		self.body.truncate(count)
	}

	pub fn close(&self) -> Result<()> {
		self.head.set_body_count(self.body.count())
	}

	pub fn buckets(&self) -> u64 {
		self.head.buckets()
	}

	pub fn count(&self) -> u64 {
		self.body.count()
	}

	/// Allocate a body element, write the payload, publish the slot.
	pub fn put(&self, index: u64, payload: &[u8]) -> Result<L> {
		let link = match self.body.record_size() {
			Some(record_size) => {
				debug_assert_eq!(payload.len(), record_size);
				self.body.allocate(1)?
			},
			None => self.body.allocate(payload.len())?,
		};

		self.body.write_at(self.body.link_to_position(link), payload)?;
		self.head.push(link, index)?;
		Ok(link)
	}

	/// The slot's element link; terminal when unset or out of range.
	pub fn at(&self, index: u64) -> Result<L> {
		self.head.at(index)
	}

	pub fn exists(&self, index: u64) -> Result<bool> {
		self.at(index).map(|link| !link.is_terminal())
	}

	/// Decode the element behind a link.
	pub fn read<T, F>(&self, link: L, f: F) -> Result<T>
	where
		F: FnOnce(&mut ByteReader) -> Result<T>,
	{
		if link.is_terminal() {
			return Err(ErrorKind::NotFound.into());
		}

		let position = self.body.link_to_position(link);
		let lease = self.body.read()?;
		let bytes = lease.bytes();
		let committed = self.body.file().size();
		let end = match self.body.record_size() {
			Some(record_size) => position + record_size,
			None => committed,
		};
		if position > end || end > committed || bytes.len() < end {
			return Err(ErrorKind::Integrity(3).into());
		}

		f(&mut ByteReader::new(&bytes[position..end]))
	}

	/// Decode the element at a natural key.
	pub fn get<T, F>(&self, index: u64, f: F) -> Result<T>
	where
		F: FnOnce(&mut ByteReader) -> Result<T>,
	{
		self.read(self.at(index)?, f)
	}

	/// Retire the top slot and its body element (rollback path).
	pub fn pop(&self, index: u64) -> Result<()> {
		self.head.pop(index)?;
		let count = self.count();
		if count > 0 {
			match self.body.record_size() {
				Some(_) => self.body.truncate(count - 1)?,
				None => {},
			}
		}
		Ok(())
	}
}
