//! Hash-keyed table with per-bucket collision chains.
//!
//! Body elements are `[next: link][key][payload]`. Inserts allocate,
//! write the element with its `next` pointing at the current bucket
//! head, then publish the bucket under the head's write lock; within a
//! bucket, elements are therefore traversed newest first.

use std::sync::Arc;

use error::{ErrorKind, Result};
use head::HashHead;
use keys::Key;
use link::Link;
use manager::Manager;
use serial::{ByteReader, ByteWriter};
use sieve::Sieve;
use storage::{Lease, Storage};

pub struct HashMap<L: Link> {
	head: HashHead<L>,
	body: Manager<L>,
	key_size: usize,
}

impl<L: Link> HashMap<L> {
	/// A record hashmap; `payload_size` fixes the element size.
	pub fn records(
		head_file: Arc<Storage>,
		body_file: Arc<Storage>,
		buckets: u64,
		sieve: Sieve,
		key_size: usize,
		payload_size: usize,
	) -> Self {
		let record_size = L::SIZE + key_size + payload_size;
		HashMap {
			head: HashHead::new(head_file, buckets, sieve),
			body: Manager::records(body_file, record_size),
			key_size,
		}
	}

	/// A slab hashmap; element sizes vary per insert.
	pub fn slabs(
		head_file: Arc<Storage>,
		body_file: Arc<Storage>,
		buckets: u64,
		sieve: Sieve,
		key_size: usize,
	) -> Self {
		HashMap {
			head: HashHead::new(head_file, buckets, sieve),
			body: Manager::slabs(body_file),
			key_size,
		}
	}

	pub fn create(&self) -> Result<()> {
		self.body.file().resize(0)?;
		self.head.create()
	}

	pub fn verify(&self) -> bool {
		self.head.verify()
	}

	/// Truncate the body to the persisted count (crash recovery).
	pub fn open(&self) -> Result<()> {
		let count = self.head.get_body_count()?;
		if self.body.count() < count {
			return Err(ErrorKind::Integrity(2).into());
		}
		self.body.truncate(count)
	}

	/// Persist the body count.
	pub fn close(&self) -> Result<()> {
		self.head.set_body_count(self.body.count())
	}

	pub fn buckets(&self) -> u64 {
		self.head.buckets()
	}

	pub fn count(&self) -> u64 {
		self.body.count()
	}

	pub fn key_size(&self) -> usize {
		self.key_size
	}

	/// Serialize `(next, key, payload)` into a fresh element and make
	/// it the new head of its bucket.
	pub fn put(&self, key: &Key, payload: &[u8]) -> Result<L> {
		debug_assert_eq!(key.size(), self.key_size);

		let element_size = L::SIZE + self.key_size + payload.len();
		if let Some(record_size) = self.body.record_size() {
			debug_assert_eq!(element_size, record_size);
		}

		let link = match self.body.record_size() {
			Some(_) => self.body.allocate(1)?,
			None => self.body.allocate(element_size)?,
		};
		let position = self.body.link_to_position(link);

		let mut writer = ByteWriter::with_capacity(element_size - L::SIZE);
		key.write(&mut writer);
		writer.write_bytes(payload);
		self.body.write_at(position + L::SIZE, writer.as_slice())?;

		let bucket = key.bucket(self.head.buckets());
		let head = self.head.writer();
		let top = head.top(bucket)?;
		self.body.write_at(position, &top.to_bytes())?;
		head.publish(bucket, link, key.thumb())?;
		Ok(link)
	}

	/// First (most recently inserted) element matching the key, or
	/// terminal. The bucket sieve short-circuits negative lookups.
	pub fn first(&self, key: &Key) -> Result<L> {
		let bucket = key.bucket(self.head.buckets());
		if !self.head.screened(bucket, key.thumb())? {
			return Ok(L::terminal());
		}

		Ok(self.iter_from(self.head.top(bucket)?, key)?.next().unwrap_or_else(L::terminal))
	}

	pub fn exists(&self, key: &Key) -> Result<bool> {
		self.first(key).map(|link| !link.is_terminal())
	}

	/// Iterate every element matching the key, newest first.
	pub fn iter(&self, key: &Key) -> Result<ChainIter<L>> {
		let bucket = key.bucket(self.head.buckets());
		if !self.head.screened(bucket, key.thumb())? {
			return self.iter_from(L::terminal(), key);
		}
		let top = self.head.top(bucket)?;
		self.iter_from(top, key)
	}

	fn iter_from(&self, start: L, key: &Key) -> Result<ChainIter<L>> {
		Ok(ChainIter {
			lease: self.body.read()?,
			record_size: self.body.record_size(),
			key: key.to_bytes(),
			link: start,
		})
	}

	pub fn get_key(&self, link: L) -> Result<Vec<u8>> {
		let position = self.body.link_to_position(link);
		let lease = self.body.read()?;
		let bytes = lease.bytes();
		let start = position + L::SIZE;
		let committed = self.body.file().size();
		if committed < start + self.key_size || bytes.len() < start + self.key_size {
			return Err(ErrorKind::Integrity(3).into());
		}
		Ok(bytes[start..start + self.key_size].to_vec())
	}

	/// Decode the payload of an element. The reader spans from the
	/// payload start to the end of committed data; slab codecs are
	/// self-delimiting.
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
		let start = position + L::SIZE + self.key_size;
		let end = match self.body.record_size() {
			Some(record_size) => position + record_size,
			None => committed,
		};
		if start > end || end > committed || bytes.len() < end {
			return Err(ErrorKind::Integrity(3).into());
		}

		f(&mut ByteReader::new(&bytes[start..end]))
	}
}

pub struct ChainIter<'a, L: Link> {
	lease: Lease<'a>,
	record_size: Option<usize>,
	key: Vec<u8>,
	link: L,
}

impl<'a, L: Link> Iterator for ChainIter<'a, L> {
	type Item = L;

	fn next(&mut self) -> Option<L> {
		while !self.link.is_terminal() {
			let position = match self.record_size {
				Some(size) => self.link.value() as usize * size,
				None => self.link.value() as usize,
			};

			let bytes = self.lease.bytes();
			if bytes.len() < position + L::SIZE + self.key.len() {
				return None;
			}

			let mut reader = ByteReader::new(&bytes[position..]);
			let next = match L::read(&mut reader) {
				Ok(next) => next,
				Err(_) => return None,
			};
			let stored = match reader.read_bytes(self.key.len()) {
				Ok(stored) => stored,
				Err(_) => return None,
			};

			let current = self.link;
			self.link = next;

			if stored == &self.key[..] {
				return Some(current);
			}
		}

		None
	}
}
