//! Header archive: canonical record hash table keyed by block hash.
//!
//! Record layout after `[next][key]`: context(8), merged parent(3),
//! version(4), timestamp(4), bits(4), nonce(4), merkle_root(32). The
//! milestone flag occupies bit 23 of the merged parent field.

use std::sync::Arc;

use chain::{self, Hash};
use error::Result;
use keys::Key;
use link::{HeaderLink, Link};
use schema::Context;
use serial::{ByteReader, ByteWriter};
use sieve::Sieve;
use storage::Storage;
use table::HashMap;

pub const PAYLOAD_SIZE: usize = Context::SIZE + 3 + 4 + 4 + 4 + 4 + 32;

const SKIP_TO_PARENT: usize = Context::SIZE;
const SKIP_TO_VERSION: usize = SKIP_TO_PARENT + 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRecord {
	pub ctx: Context,
	pub milestone: bool,
	pub parent_fk: HeaderLink,
	pub version: u32,
	pub timestamp: u32,
	pub bits: u32,
	pub nonce: u32,
	pub merkle_root: Hash,
}

impl HeaderRecord {
	pub fn write(&self, writer: &mut ByteWriter) {
		self.ctx.write(writer);
		writer.write_le(self.parent_fk.to_merged(self.milestone), 3);
		writer.write_u32(self.version);
		writer.write_u32(self.timestamp);
		writer.write_u32(self.bits);
		writer.write_u32(self.nonce);
		writer.write_bytes(&self.merkle_root);
	}

	pub fn read(reader: &mut ByteReader) -> Result<HeaderRecord> {
		let ctx = Context::read(reader)?;
		let (milestone, parent_fk) = HeaderLink::from_merged(reader.read_le(3)?);
		Ok(HeaderRecord {
			ctx,
			milestone,
			parent_fk,
			version: reader.read_u32()?,
			timestamp: reader.read_u32()?,
			bits: reader.read_u32()?,
			nonce: reader.read_u32()?,
			merkle_root: reader.read_hash()?,
		})
	}

	/// Rebuild the chain header; the parent hash is resolved by the
	/// caller through the parent link.
	pub fn to_header(&self, previous: Hash) -> chain::Header {
		chain::Header {
			version: self.version,
			previous,
			merkle_root: self.merkle_root,
			timestamp: self.timestamp,
			bits: self.bits,
			nonce: self.nonce,
		}
	}
}

pub struct HeaderTable {
	map: HashMap<HeaderLink>,
}

impl HeaderTable {
	pub fn new(head: Arc<Storage>, body: Arc<Storage>, buckets: u64) -> Self {
		HeaderTable {
			map: HashMap::records(head, body, buckets, Sieve::disabled(), 32, PAYLOAD_SIZE),
		}
	}

	pub fn inner(&self) -> &HashMap<HeaderLink> {
		&self.map
	}

	pub fn put(&self, key: &Hash, record: &HeaderRecord) -> Result<HeaderLink> {
		let mut writer = ByteWriter::with_capacity(PAYLOAD_SIZE);
		record.write(&mut writer);
		self.map.put(&Key::Plain(key), writer.as_slice())
	}

	pub fn first(&self, key: &Hash) -> Result<HeaderLink> {
		self.map.first(&Key::Plain(key))
	}

	pub fn get(&self, link: HeaderLink) -> Result<HeaderRecord> {
		self.map.read(link, HeaderRecord::read)
	}

	pub fn get_key(&self, link: HeaderLink) -> Result<Hash> {
		let bytes = self.map.get_key(link)?;
		let mut hash = [0u8; 32];
		hash.copy_from_slice(&bytes);
		Ok(hash)
	}

	pub fn get_context(&self, link: HeaderLink) -> Result<Context> {
		self.map.read(link, |reader| Context::read(reader))
	}

	pub fn get_height(&self, link: HeaderLink) -> Result<u32> {
		self.map.read(link, |reader| {
			reader.skip(1)?;
			Ok(reader.read_le(3)? as u32)
		})
	}

	pub fn get_parent(&self, link: HeaderLink) -> Result<HeaderLink> {
		self.map.read(link, |reader| {
			reader.skip(SKIP_TO_PARENT)?;
			let (_, parent) = HeaderLink::from_merged(reader.read_le(3)?);
			Ok(parent)
		})
	}

	pub fn get_milestone(&self, link: HeaderLink) -> Result<bool> {
		self.map.read(link, |reader| {
			reader.skip(SKIP_TO_PARENT)?;
			let (milestone, _) = HeaderLink::from_merged(reader.read_le(3)?);
			Ok(milestone)
		})
	}

	pub fn get_version(&self, link: HeaderLink) -> Result<u32> {
		self.map.read(link, |reader| {
			reader.skip(SKIP_TO_VERSION)?;
			reader.read_u32()
		})
	}
}
