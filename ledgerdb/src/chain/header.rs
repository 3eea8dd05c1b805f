use chain::{sha256d, Hash};
use error::Result;
use serial::{ByteReader, ByteWriter};

pub const HEADER_SIZE: usize = 80;

/// A block header in its canonical 80-byte form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
	pub version: u32,
	pub previous: Hash,
	pub merkle_root: Hash,
	pub timestamp: u32,
	pub bits: u32,
	pub nonce: u32,
}

impl Header {
	pub fn write(&self, writer: &mut ByteWriter) {
		writer.write_u32(self.version);
		writer.write_bytes(&self.previous);
		writer.write_bytes(&self.merkle_root);
		writer.write_u32(self.timestamp);
		writer.write_u32(self.bits);
		writer.write_u32(self.nonce);
	}

	pub fn read(reader: &mut ByteReader) -> Result<Header> {
		Ok(Header {
			version: reader.read_u32()?,
			previous: reader.read_hash()?,
			merkle_root: reader.read_hash()?,
			timestamp: reader.read_u32()?,
			bits: reader.read_u32()?,
			nonce: reader.read_u32()?,
		})
	}

	pub fn to_bytes(&self) -> Vec<u8> {
		let mut writer = ByteWriter::with_capacity(HEADER_SIZE);
		self.write(&mut writer);
		writer.into_vec()
	}

	pub fn hash(&self) -> Hash {
		sha256d(&self.to_bytes())
	}
}
