//! Bucket header files.
//!
//! A head file holds a body-count word followed by bucket cells:
//! `[body_count: link_bytes][cell_0]..[cell_{N-1}]`. A hashhead has a
//! fixed cell count and maps keys to cells by bucketing hash; an
//! arrayhead grows on demand and uses the natural key as the cell
//! index. Sieve-enabled hashheads widen each cell to eight bytes and
//! keep the screen field in the high half.
//!
//! The body count is only authoritative across restarts: it is written
//! on close and backup, and bodies are truncated to it on open.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockWriteGuard};

use error::{ErrorKind, Result};
use link::Link;
use serial::{ByteReader, ByteWriter};
use sieve::{Sieve, EMPTY};
use storage::Storage;

const SIEVE_CELL_SIZE: usize = 8;

fn read_count<L: Link>(file: &Arc<Storage>) -> Result<u64> {
	let lease = file.read()?;
	let bytes = lease.bytes();
	if bytes.len() < L::SIZE {
		return Err(ErrorKind::Integrity(1).into());
	}
	ByteReader::new(&bytes[..L::SIZE]).read_le(L::SIZE)
}

fn write_count<L: Link>(file: &Arc<Storage>, count: u64) -> Result<()> {
	let mut writer = ByteWriter::with_capacity(L::SIZE);
	writer.write_le(count, L::SIZE);
	file.write_at(0, writer.as_slice())
}

// All-ones fill produces terminal links and empty sieves alike.
fn fill_terminal(file: &Arc<Storage>, from: usize, to: usize) -> Result<()> {
	let ones = vec![0xffu8; 4096];
	let mut position = from;
	while position < to {
		let len = (to - position).min(ones.len());
		file.write_at(position, &ones[..len])?;
		position += len;
	}
	Ok(())
}

/// Fixed-bucket header for hash tables.
pub struct HashHead<L: Link> {
	file: Arc<Storage>,
	buckets: u64,
	sieve: Sieve,
	lock: RwLock<()>,
	_link: ::std::marker::PhantomData<L>,
}

impl<L: Link> HashHead<L> {
	pub fn new(file: Arc<Storage>, buckets: u64, sieve: Sieve) -> Self {
		assert!(buckets > 0);
		assert!(!sieve.is_enabled() || L::SIZE == 4,
			"sieve cells pack a four byte link");
		HashHead { file, buckets, sieve, lock: RwLock::new(()), _link: Default::default() }
	}

	pub fn buckets(&self) -> u64 {
		self.buckets
	}

	fn cell_size(&self) -> usize {
		if self.sieve.is_enabled() { SIEVE_CELL_SIZE } else { L::SIZE }
	}

	fn cell_position(&self, bucket: u64) -> usize {
		L::SIZE + bucket as usize * self.cell_size()
	}

	fn expected_size(&self) -> usize {
		L::SIZE + self.buckets as usize * self.cell_size()
	}

	/// Write an empty head: zero body count, all cells terminal.
	pub fn create(&self) -> Result<()> {
		let total = self.expected_size();
		self.file.reserve(total)?;
		self.file.resize(total)?;
		write_count::<L>(&self.file, 0)?;
		fill_terminal(&self.file, L::SIZE, total)
	}

	/// False if the file length does not match the bucket count.
	pub fn verify(&self) -> bool {
		self.file.size() == self.expected_size()
	}

	pub fn get_body_count(&self) -> Result<u64> {
		read_count::<L>(&self.file)
	}

	pub fn set_body_count(&self, count: u64) -> Result<()> {
		write_count::<L>(&self.file, count)
	}

	/// Load a bucket's head link.
	pub fn top(&self, bucket: u64) -> Result<L> {
		let _guard = self.lock.read();
		self.read_cell(bucket).map(|cell| cell.0)
	}

	/// False only when the bucket's sieve positively excludes the
	/// thumb; negative lookups then skip the chain walk.
	pub fn screened(&self, bucket: u64, thumb: u64) -> Result<bool> {
		if !self.sieve.is_enabled() {
			return Ok(true);
		}
		let _guard = self.lock.read();
		let (_, field) = self.read_cell(bucket)?;
		Ok(self.sieve.screened(field, thumb))
	}

	/// Exclusive access for the insert protocol: read the current top,
	/// link the new element's next, then publish.
	pub fn writer(&self) -> HeadWriter<L> {
		HeadWriter { head: self, _guard: self.lock.write() }
	}

	fn read_cell(&self, bucket: u64) -> Result<(L, u32)> {
		debug_assert!(bucket < self.buckets);
		let position = self.cell_position(bucket);
		let lease = self.file.read()?;
		let bytes = lease.bytes();
		if bytes.len() < position + self.cell_size() {
			return Err(ErrorKind::Integrity(1).into());
		}

		let mut reader = ByteReader::new(&bytes[position..]);
		let link = L::read(&mut reader)?;
		let field = if self.sieve.is_enabled() {
			reader.read_u32()?
		} else {
			EMPTY
		};
		Ok((link, field))
	}

	fn write_cell(&self, bucket: u64, link: L, field: u32) -> Result<()> {
		let mut writer = ByteWriter::with_capacity(self.cell_size());
		link.write(&mut writer);
		if self.sieve.is_enabled() {
			writer.write_u32(field);
		}
		self.file.write_at(self.cell_position(bucket), writer.as_slice())
	}
}

pub struct HeadWriter<'a, L: Link + 'a> {
	head: &'a HashHead<L>,
	_guard: RwLockWriteGuard<'a, ()>,
}

impl<'a, L: Link + 'a> HeadWriter<'a, L> {
	pub fn top(&self, bucket: u64) -> Result<L> {
		self.head.read_cell(bucket).map(|cell| cell.0)
	}

	/// Point the bucket at the new element and fold its thumb into the
	/// bucket's sieve.
	pub fn publish(&self, bucket: u64, link: L, thumb: u64) -> Result<()> {
		let (_, field) = self.head.read_cell(bucket)?;
		let (field, _) = self.head.sieve.screen(field, thumb);
		self.head.write_cell(bucket, link, field)
	}
}

/// Dynamically growing header for array tables.
pub struct ArrayHead<L: Link> {
	file: Arc<Storage>,
	initial_buckets: u64,
	lock: RwLock<()>,
	_link: ::std::marker::PhantomData<L>,
}

impl<L: Link> ArrayHead<L> {
	pub fn new(file: Arc<Storage>, initial_buckets: u64) -> Self {
		ArrayHead { file, initial_buckets, lock: RwLock::new(()), _link: Default::default() }
	}

	pub fn buckets(&self) -> u64 {
		let size = self.file.size();
		if size < L::SIZE { 0 } else { ((size - L::SIZE) / L::SIZE) as u64 }
	}

	pub fn create(&self) -> Result<()> {
		let total = L::SIZE + self.initial_buckets as usize * L::SIZE;
		self.file.reserve(total)?;
		self.file.resize(total)?;
		write_count::<L>(&self.file, 0)?;
		fill_terminal(&self.file, L::SIZE, total)
	}

	pub fn verify(&self) -> bool {
		let size = self.file.size();
		size >= L::SIZE && (size - L::SIZE) % L::SIZE == 0
	}

	pub fn get_body_count(&self) -> Result<u64> {
		read_count::<L>(&self.file)
	}

	pub fn set_body_count(&self, count: u64) -> Result<()> {
		write_count::<L>(&self.file, count)
	}

	/// Load the slot for a natural key; terminal when out of range.
	pub fn at(&self, index: u64) -> Result<L> {
		let _guard = self.lock.read();
		if index >= self.buckets() {
			return Ok(L::terminal());
		}

		let position = L::SIZE + index as usize * L::SIZE;
		let lease = self.file.read()?;
		let bytes = lease.bytes();
		if bytes.len() < position + L::SIZE {
			return Err(ErrorKind::Integrity(1).into());
		}
		L::read(&mut ByteReader::new(&bytes[position..]))
	}

	/// Grow the head to cover `index` and assign the slot.
	pub fn push(&self, link: L, index: u64) -> Result<()> {
		let _guard = self.lock.write();
		let needed = L::SIZE + (index as usize + 1) * L::SIZE;
		let current = self.file.size();
		if current < needed {
			if needed > self.file.capacity() {
				self.file.reserve(needed + needed / 2)?;
			}
			self.file.resize(needed)?;
			// Slots between the old end and the new one read terminal.
			fill_terminal(&self.file, current.max(L::SIZE), needed)?;
		}

		let position = L::SIZE + index as usize * L::SIZE;
		self.file.write_at(position, &link.to_bytes())
	}

	/// Drop the top slot; used by candidate/confirmed pops.
	pub fn pop(&self, index: u64) -> Result<()> {
		let _guard = self.lock.write();
		if index + 1 != self.buckets() {
			return Err(ErrorKind::InvalidArgument.into());
		}

		let position = L::SIZE + index as usize * L::SIZE;
		self.file.write_at(position, &L::terminal().to_bytes())?;
		self.file.truncate(position)
	}
}
