//! Search keys: serialization, bucketing and sieve thumbs.
//!
//! Keys are either plain byte strings (block/tx hashes, script hashes,
//! little-endian foreign keys) or outpoints. An outpoint is searched by
//! its full (hash, index) pair but stored as the 3-byte point stub plus
//! the 3-byte truncated output index; the index truncation round-trips
//! because the top byte of every real output index is zero, and the
//! null-index sentinel owns bucket zero exclusively.

use serial::ByteWriter;

/// The truncated form of the null output index (0xffffffff).
pub const NULL_INDEX: u32 = 0xff_ffff;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

#[derive(Debug, Clone, Copy)]
pub enum Key<'a> {
	/// Fixed-width byte key, stored verbatim.
	Plain(&'a [u8]),
	/// Outpoint: bucketed by (hash, index), stored as (stub, index).
	Point {
		hash: &'a [u8; 32],
		index: u32,
		stub: u32,
	},
}

impl<'a> Key<'a> {
	/// Bytes the key occupies inside a body element.
	pub fn size(&self) -> usize {
		match *self {
			Key::Plain(bytes) => bytes.len(),
			Key::Point { .. } => 6,
		}
	}

	/// Serialize the stored form.
	pub fn write(&self, writer: &mut ByteWriter) {
		match *self {
			Key::Plain(bytes) => writer.write_bytes(bytes),
			Key::Point { index, stub, .. } => {
				writer.write_le((stub & 0xff_ffff) as u64, 3);
				writer.write_le((index & 0xff_ffff) as u64, 3);
			},
		}
	}

	pub fn to_bytes(&self) -> Vec<u8> {
		let mut writer = ByteWriter::with_capacity(self.size());
		self.write(&mut writer);
		writer.into_vec()
	}

	/// Compare against the stored form.
	pub fn matches(&self, stored: &[u8]) -> bool {
		self.to_bytes() == stored
	}

	/// Head bucket for this key. The null outpoint owns bucket zero;
	/// every other outpoint avoids it.
	pub fn bucket(&self, buckets: u64) -> u64 {
		debug_assert!(buckets > 0);
		match *self {
			Key::Plain(bytes) => low64(bytes) % buckets,
			Key::Point { hash, index, .. } => {
				if index & 0xff_ffff == NULL_INDEX {
					return 0;
				}

				let bucket = fnv1a_combine(low64(hash), index as u64) % buckets;
				if bucket == 0 { 1 } else { bucket }
			},
		}
	}

	/// 64-bit sieve fingerprint source, taken past the bucketing bytes
	/// so the screen and the bucket index stay independent.
	pub fn thumb(&self) -> u64 {
		match *self {
			Key::Plain(bytes) => thumb64(bytes),
			Key::Point { hash, index, .. } => fnv1a_combine(thumb64(hash), index as u64),
		}
	}
}

/// FNV-1a fold of two 64-bit values.
pub fn fnv1a_combine(left: u64, right: u64) -> u64 {
	let mut hash = FNV_OFFSET;
	hash ^= left;
	hash = hash.wrapping_mul(FNV_PRIME);
	hash ^= right;
	hash.wrapping_mul(FNV_PRIME)
}

fn read_le(bytes: &[u8]) -> u64 {
	let mut value = 0u64;
	for (shift, byte) in bytes.iter().take(8).enumerate() {
		value |= (*byte as u64) << (shift * 8);
	}
	value
}

fn low64(bytes: &[u8]) -> u64 {
	read_le(bytes)
}

fn thumb64(bytes: &[u8]) -> u64 {
	if bytes.len() > 8 {
		read_le(&bytes[8..])
	} else {
		read_le(bytes)
	}
}
