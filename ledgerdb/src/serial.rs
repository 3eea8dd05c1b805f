//! Byte cursors used by every table codec.
//!
//! All on-disk integers are little-endian and occupy their declared
//! width exactly; truncated integers (3-byte heights, 3-byte counts)
//! are read and written through `read_le`/`write_le`.

use byteorder::{ByteOrder, LittleEndian};

use error::{ErrorKind, Result};

/// A reading cursor over an element's bytes.
pub struct ByteReader<'a> {
	data: &'a [u8],
	position: usize,
}

impl<'a> ByteReader<'a> {
	pub fn new(data: &'a [u8]) -> Self {
		ByteReader { data, position: 0 }
	}

	pub fn position(&self) -> usize {
		self.position
	}

	pub fn remaining(&self) -> usize {
		self.data.len() - self.position
	}

	pub fn skip(&mut self, bytes: usize) -> Result<()> {
		self.take(bytes).map(|_| ())
	}

	pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
		self.take(len)
	}

	pub fn read_u8(&mut self) -> Result<u8> {
		self.take(1).map(|b| b[0])
	}

	pub fn read_u32(&mut self) -> Result<u32> {
		self.take(4).map(LittleEndian::read_u32)
	}

	pub fn read_u64(&mut self) -> Result<u64> {
		self.take(8).map(LittleEndian::read_u64)
	}

	/// Read a little-endian integer of 1 to 8 bytes.
	pub fn read_le(&mut self, bytes: usize) -> Result<u64> {
		debug_assert!(bytes >= 1 && bytes <= 8);
		self.take(bytes).map(|b| LittleEndian::read_uint(b, bytes))
	}

	pub fn read_hash(&mut self) -> Result<[u8; 32]> {
		let bytes = self.take(32)?;
		let mut hash = [0u8; 32];
		hash.copy_from_slice(bytes);
		Ok(hash)
	}

	/// Satoshi variable-length integer.
	pub fn read_varint(&mut self) -> Result<u64> {
		let first = self.read_u8()?;
		match first {
			0xfd => self.read_le(2),
			0xfe => self.read_le(4),
			0xff => self.read_le(8),
			byte => Ok(byte as u64),
		}
	}

	fn take(&mut self, len: usize) -> Result<&'a [u8]> {
		if self.remaining() < len {
			return Err(ErrorKind::Exhausted(len, self.remaining()).into());
		}

		let slice = &self.data[self.position..self.position + len];
		self.position += len;
		Ok(slice)
	}
}

/// A writing cursor producing an element's bytes.
#[derive(Default)]
pub struct ByteWriter {
	out: Vec<u8>,
}

impl ByteWriter {
	pub fn new() -> Self {
		ByteWriter::default()
	}

	pub fn with_capacity(capacity: usize) -> Self {
		ByteWriter { out: Vec::with_capacity(capacity) }
	}

	pub fn position(&self) -> usize {
		self.out.len()
	}

	pub fn write_bytes(&mut self, bytes: &[u8]) {
		self.out.extend_from_slice(bytes);
	}

	pub fn write_u8(&mut self, value: u8) {
		self.out.push(value);
	}

	pub fn write_u32(&mut self, value: u32) {
		let mut buf = [0u8; 4];
		LittleEndian::write_u32(&mut buf, value);
		self.out.extend_from_slice(&buf);
	}

	pub fn write_u64(&mut self, value: u64) {
		let mut buf = [0u8; 8];
		LittleEndian::write_u64(&mut buf, value);
		self.out.extend_from_slice(&buf);
	}

	/// Write a little-endian integer into 1 to 8 bytes.
	/// Panics in debug builds if the value does not fit the width.
	pub fn write_le(&mut self, value: u64, bytes: usize) {
		debug_assert!(bytes >= 1 && bytes <= 8);
		debug_assert!(bytes == 8 || value < (1u64 << (bytes * 8)));
		let mut buf = [0u8; 8];
		LittleEndian::write_u64(&mut buf, value);
		self.out.extend_from_slice(&buf[..bytes]);
	}

	pub fn write_varint(&mut self, value: u64) {
		if value < 0xfd {
			self.write_u8(value as u8);
		} else if value <= 0xffff {
			self.write_u8(0xfd);
			self.write_le(value, 2);
		} else if value <= 0xffff_ffff {
			self.write_u8(0xfe);
			self.write_le(value, 4);
		} else {
			self.write_u8(0xff);
			self.write_le(value, 8);
		}
	}

	pub fn into_vec(self) -> Vec<u8> {
		self.out
	}

	pub fn as_slice(&self) -> &[u8] {
		&self.out
	}
}

/// Bytes a varint occupies.
pub fn varint_size(value: u64) -> usize {
	if value < 0xfd {
		1
	} else if value <= 0xffff {
		3
	} else if value <= 0xffff_ffff {
		5
	} else {
		9
	}
}

#[cfg(test)]
mod tests {
	use super::{varint_size, ByteReader, ByteWriter};
	use error::ErrorKind;

	#[test]
	fn test_le_round_trip() {
		let mut writer = ByteWriter::new();
		writer.write_le(0x341201, 3);
		writer.write_u32(0x56341203);
		writer.write_u8(0xab);
		let bytes = writer.into_vec();
		assert_eq!(bytes, [0x01, 0x12, 0x34, 0x03, 0x12, 0x34, 0x56, 0xab]);

		let mut reader = ByteReader::new(&bytes);
		assert_eq!(reader.read_le(3).unwrap(), 0x341201);
		assert_eq!(reader.read_u32().unwrap(), 0x56341203);
		assert_eq!(reader.read_u8().unwrap(), 0xab);
		assert_eq!(reader.remaining(), 0);
	}

	#[test]
	fn test_varint_round_trip() {
		let values = [0u64, 1, 0xfc, 0xfd, 0xffff, 0x10000, 0xffff_ffff, 0x1_0000_0000];
		let mut writer = ByteWriter::new();
		for value in &values {
			writer.write_varint(*value);
		}

		let bytes = writer.into_vec();
		assert_eq!(bytes.len(), values.iter().map(|v| varint_size(*v)).sum::<usize>());

		let mut reader = ByteReader::new(&bytes);
		for value in &values {
			assert_eq!(reader.read_varint().unwrap(), *value);
		}
	}

	#[test]
	fn test_exhausted() {
		let mut reader = ByteReader::new(&[1, 2]);
		assert_eq!(
			*reader.read_u32().unwrap_err().kind(),
			ErrorKind::Exhausted(4, 2)
		);
	}
}
