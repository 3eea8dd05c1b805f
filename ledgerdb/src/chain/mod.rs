//! Minimal read-only chain object model.
//!
//! The store consumes blocks and transactions as given values; this
//! module provides just enough structure to hash, size and decode
//! them, plus the two consensus predicates the confirmability engine
//! evaluates (relative timelocks and coinbase maturity).

mod block;
mod header;
mod transaction;

pub use self::block::Block;
pub use self::header::Header;
pub use self::transaction::{Input, Output, Point, Transaction};

use sha2::{Digest, Sha256};

pub type Hash = [u8; 32];

pub const NULL_HASH: Hash = [0u8; 32];

/// Output index of the null outpoint.
pub const NULL_INDEX: u32 = 0xffff_ffff;

pub const COINBASE_MATURITY: u64 = 100;

/// Transactions below this version are exempt from BIP68.
pub const RELATIVE_LOCKTIME_MIN_VERSION: u32 = 2;

const SEQUENCE_DISABLE: u32 = 1 << 31;
const SEQUENCE_TIME_TYPE: u32 = 1 << 22;
const SEQUENCE_VALUE_MASK: u32 = 0xffff;
const SEQUENCE_TIME_SHIFT: u32 = 9;

pub fn sha256d(data: &[u8]) -> Hash {
	let first = Sha256::digest(data);
	let second = Sha256::digest(&first);
	let mut hash = [0u8; 32];
	hash.copy_from_slice(&second);
	hash
}

/// `sha256d(left || right)`, the merkle node combiner.
pub fn sha256d_pair(left: &Hash, right: &Hash) -> Hash {
	let mut data = [0u8; 64];
	data[..32].copy_from_slice(left);
	data[32..].copy_from_slice(right);
	sha256d(&data)
}

/// Bitcoin merkle root: pairwise sha256d, odd rows duplicate their
/// last element. A single leaf is its own root.
pub fn merkle_root(hashes: &[Hash]) -> Hash {
	if hashes.is_empty() {
		return NULL_HASH;
	}

	let mut row = hashes.to_vec();
	while row.len() > 1 {
		if row.len() % 2 != 0 {
			let last = *row.last().expect("row is non-empty; qed");
			row.push(last);
		}

		row = row
			.chunks(2)
			.map(|pair| sha256d_pair(&pair[0], &pair[1]))
			.collect();
	}

	row[0]
}

/// BIP68: is the input still locked at (height, mtp) given its
/// sequence and the prevout's confirmation context.
pub fn is_locked(sequence: u32, height: u64, mtp: u32, prev_height: u64, prev_mtp: u32) -> bool {
	if sequence & SEQUENCE_DISABLE != 0 {
		return false;
	}

	let value = (sequence & SEQUENCE_VALUE_MASK) as u64;
	if sequence & SEQUENCE_TIME_TYPE != 0 {
		(mtp as u64) < prev_mtp as u64 + (value << SEQUENCE_TIME_SHIFT)
	} else {
		height < prev_height + value
	}
}

/// A coinbase output is spendable once buried a hundred blocks deep.
pub fn is_coinbase_mature(prev_height: u64, height: u64) -> bool {
	height >= prev_height + COINBASE_MATURITY
}
