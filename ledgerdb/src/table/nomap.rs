//! Keyless record store, addressed purely by link.
//!
//! The head file carries only the body-count word used for restart
//! truncation.

use std::sync::Arc;

use error::{ErrorKind, Result};
use link::Link;
use manager::Manager;
use serial::{ByteReader, ByteWriter};
use storage::Storage;

pub struct NoMap<L: Link> {
	head_file: Arc<Storage>,
	body: Manager<L>,
}

impl<L: Link> NoMap<L> {
	pub fn records(head_file: Arc<Storage>, body_file: Arc<Storage>, record_size: usize) -> Self {
		NoMap { head_file, body: Manager::records(body_file, record_size) }
	}

	pub fn slabs(head_file: Arc<Storage>, body_file: Arc<Storage>) -> Self {
		NoMap { head_file, body: Manager::slabs(body_file) }
	}

	pub fn create(&self) -> Result<()> {
		self.body.file().resize(0)?;
		self.head_file.reserve(L::SIZE)?;
		self.head_file.resize(L::SIZE)?;
		let mut writer = ByteWriter::with_capacity(L::SIZE);
		writer.write_le(0, L::SIZE);
		self.head_file.write_at(0, writer.as_slice())
	}

	pub fn verify(&self) -> bool {
		self.head_file.size() == L::SIZE
	}

	pub fn open(&self) -> Result<()> {
		let count = self.get_body_count()?;
		if self.body.count() < count {
			return Err(ErrorKind::Integrity(2).into());
		}
		self.body.truncate(count)
	}

	pub fn close(&self) -> Result<()> {
		self.set_body_count(self.body.count())
	}

	pub fn get_body_count(&self) -> Result<u64> {
		let lease = self.head_file.read()?;
		let bytes = lease.bytes();
		if bytes.len() < L::SIZE {
			return Err(ErrorKind::Integrity(1).into());
		}
		ByteReader::new(&bytes[..L::SIZE]).read_le(L::SIZE)
	}

	pub fn set_body_count(&self, count: u64) -> Result<()> {
		let mut writer = ByteWriter::with_capacity(L::SIZE);
		writer.write_le(count, L::SIZE);
		self.head_file.write_at(0, writer.as_slice())
	}

	pub fn count(&self) -> u64 {
		self.body.count()
	}

	/// Allocate `n` contiguous records and return the first link.
	pub fn allocate(&self, n: usize) -> Result<L> {
		self.body.allocate(n)
	}

	/// Write a record previously allocated.
	pub fn write_record(&self, link: L, payload: &[u8]) -> Result<()> {
		debug_assert_eq!(Some(payload.len()), self.body.record_size());
		self.body.write_at(self.body.link_to_position(link), payload)
	}

	/// Append one element (records and slabs alike).
	pub fn put(&self, payload: &[u8]) -> Result<L> {
		let link = match self.body.record_size() {
			Some(record_size) => {
				debug_assert_eq!(payload.len(), record_size);
				self.body.allocate(1)?
			},
			None => self.body.allocate(payload.len())?,
		};
		self.body.write_at(self.body.link_to_position(link), payload)?;
		Ok(link)
	}

	pub fn truncate(&self, count: u64) -> Result<()> {
		self.body.truncate(count)
	}

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
}
