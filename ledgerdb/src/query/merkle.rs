//! Cached merkle intervals and waypoint proofs over the confirmed
//! chain.
//!
//! The confirmed header hashes form a merkle tree; complete
//! `2^interval_depth` segments cache their subroot inside the txs
//! slab at association time. Proofs are assembled from the in-segment
//! branch and the cross-segment subroot walk; partial tail segments
//! are elevated by duplication so all subroots align at the same
//! height, mirroring the odd-duplication of the plain tree.

use itertools::Itertools;

use chain::{merkle_root, sha256d_pair, Hash};
use error::{ErrorKind, Result};
use link::{HeaderLink, Link};
use query::Query;

fn ceilinged_log2(value: usize) -> u32 {
	debug_assert!(value > 0);
	if value == 1 { 0 } else { 64 - (value as u64 - 1).leading_zeros() }
}

/// A segment's merkle root elevated by duplication to the subroot
/// height of a full span.
pub fn partial_subroot(hashes: &[Hash], span: usize) -> Hash {
	debug_assert!(!hashes.is_empty() && hashes.len() <= span);
	let mut root = merkle_root(hashes);
	let levels = ceilinged_log2(span) - ceilinged_log2(hashes.len());
	for _ in 0..levels {
		root = sha256d_pair(&root, &root);
	}
	root
}

/// Append the merkle branch of `start` within `from` (root excluded)
/// onto `to`; odd rows duplicate their last element.
pub fn merge_merkle(to: &mut Vec<Hash>, from: Vec<Hash>, start: usize) {
	let mut row = from;
	let mut index = start;

	while row.len() > 1 {
		if row.len() % 2 != 0 {
			let last = *row.last().expect("row is non-empty; qed");
			row.push(last);
		}

		to.push(row[index ^ 1]);
		row = row
			.chunks(2)
			.map(|pair| sha256d_pair(&pair[0], &pair[1]))
			.collect();
		index /= 2;
	}
}

impl<'a> Query<'a> {
	/// Blocks per cached interval; `usize::MAX` disables caching.
	pub fn interval_span(&self) -> usize {
		self.store().options().interval_span()
	}

	/// The interval subroot ending at `height`, walking `span` parent
	/// headers back from `link`. None off interval boundaries.
	pub fn create_interval(&self, link: HeaderLink, height: u64) -> Result<Option<Hash>> {
		let span = self.interval_span();
		if span == usize::max_value() {
			return Ok(None);
		}
		if (height + 1) % span as u64 != 0 {
			return Ok(None);
		}

		let mut hashes = Vec::with_capacity(span);
		let mut current = link;
		for _ in 0..span {
			hashes.push(self.store().header.get_key(current)?);
			current = self.store().header.get_parent(current)?;
		}
		hashes.reverse();
		Ok(Some(merkle_root(&hashes)))
	}

	/// The cached interval subroot at a confirmed interval boundary.
	pub fn get_confirmed_interval(&self, height: u64) -> Result<Option<Hash>> {
		let span = self.interval_span();
		if span == usize::max_value() || (height + 1) % span as u64 != 0 {
			return Ok(None);
		}

		let link = self.to_confirmed(height)?;
		if link.is_terminal() {
			return Ok(None);
		}
		self.store().txs.get_interval(link.value())
	}

	/// Confirmed header hashes for heights `[first, first + count)`.
	pub fn get_confirmed_hashes(&self, first: u64, count: usize) -> Result<Vec<Hash>> {
		let mut hashes = Vec::with_capacity(count);
		for height in first..first + count as u64 {
			let link = self.to_confirmed(height)?;
			if link.is_terminal() {
				return Err(ErrorKind::MerkleHashes.into());
			}
			hashes.push(self.get_header_hash(link)?);
		}
		Ok(hashes)
	}

	/// Plain merkle root of the confirmed chain up to the waypoint;
	/// None when any height is unconfirmed.
	pub fn get_merkle_root(&self, waypoint: u64) -> Option<Hash> {
		self.get_confirmed_hashes(0, waypoint as usize + 1)
			.ok()
			.map(|hashes| merkle_root(&hashes))
	}

	/// Span-aligned subroots covering `[0, waypoint]`: cached interval
	/// roots for complete segments, an elevated partial subroot for
	/// the tail, or one plain root when everything fits a single span.
	pub fn get_merkle_subroots(&self, waypoint: u64) -> Result<Vec<Hash>> {
		let span = self.interval_span();
		let leaves = waypoint as usize + 1;

		if leaves <= span {
			let hashes = self.get_confirmed_hashes(0, leaves)?;
			return Ok(vec![merkle_root(&hashes)]);
		}

		let mut roots = Vec::with_capacity((leaves + span - 1) / span);
		for chunk in &(0..leaves).chunks(span) {
			let segment: Vec<usize> = chunk.collect();
			let first = segment[0] as u64;
			let size = segment.len();

			if size == span {
				let boundary = first + span as u64 - 1;
				if let Some(cached) = self.get_confirmed_interval(boundary)? {
					roots.push(cached);
					continue;
				}
				let hashes = self.get_confirmed_hashes(first, size)?;
				roots.push(merkle_root(&hashes));
			} else {
				let hashes = self.get_confirmed_hashes(first, size)?;
				roots.push(partial_subroot(&hashes, span));
			}
		}
		Ok(roots)
	}

	/// The sibling path proving `target` against the waypoint root:
	/// in-segment branch first, then the cross-segment walk over the
	/// given subroots.
	pub fn get_merkle_proof(
		&self,
		roots: &[Hash],
		target: u64,
		waypoint: u64,
	) -> Result<Vec<Hash>> {
		let top = self.top_confirmed().map_err(|_| ErrorKind::MerkleProof)?;
		if target > waypoint || waypoint > top {
			return Err(ErrorKind::MerkleProof.into());
		}

		let span = self.interval_span();
		let leaves = waypoint as usize + 1;
		let mut proof = Vec::new();

		if leaves <= span {
			let hashes = self.get_confirmed_hashes(0, leaves)
				.map_err(|_| ErrorKind::MerkleProof)?;
			merge_merkle(&mut proof, hashes, target as usize);
			merge_merkle(&mut proof, roots.to_vec(), target as usize / span);
			return Ok(proof);
		}

		let segment = target as usize / span;
		let first = segment * span;
		let size = (leaves - first).min(span);
		let hashes = self.get_confirmed_hashes(first as u64, size)
			.map_err(|_| ErrorKind::MerkleProof)?;

		merge_merkle(&mut proof, hashes.clone(), target as usize - first);

		// A partial tail elevates by self-pairing; the running hash
		// is its own sibling at each extra level.
		if size < span {
			let mut running = merkle_root(&hashes);
			for _ in 0..ceilinged_log2(span) - ceilinged_log2(size) {
				proof.push(running);
				running = sha256d_pair(&running, &running);
			}
		}

		merge_merkle(&mut proof, roots.to_vec(), segment);
		Ok(proof)
	}

	/// Root and proof for `target` at `waypoint`; arguments validate
	/// against the confirmed top.
	pub fn get_merkle_root_and_proof(
		&self,
		target: u64,
		waypoint: u64,
	) -> Result<(Hash, Vec<Hash>)> {
		if target > waypoint {
			return Err(ErrorKind::InvalidArgument.into());
		}
		let top = self.top_confirmed().map_err(|_| ErrorKind::NotFound)?;
		if waypoint > top {
			return Err(ErrorKind::NotFound.into());
		}

		let roots = self.get_merkle_subroots(waypoint)?;
		let proof = self.get_merkle_proof(&roots, target, waypoint)?;
		Ok((merkle_root(&roots), proof))
	}

	/// Recompute the waypoint root from a leaf hash and its proof;
	/// the structural inverse of `get_merkle_proof`.
	pub fn verify_merkle_proof(
		&self,
		leaf: &Hash,
		proof: &[Hash],
		target: u64,
		waypoint: u64,
	) -> Result<Hash> {
		let span = self.interval_span();
		let leaves = waypoint as usize + 1;
		let mut entries = proof.iter();
		let mut next = || entries.next().cloned().ok_or(ErrorKind::MerkleProof);

		let (segment, mut width, mut index) = if leaves <= span {
			(0, leaves, target as usize)
		} else {
			let segment = target as usize / span;
			let first = segment * span;
			(segment, (leaves - first).min(span), target as usize - first)
		};

		// In-segment branch.
		let mut current = *leaf;
		while width > 1 {
			let sibling = next()?;
			current = if index % 2 == 0 {
				sha256d_pair(&current, &sibling)
			} else {
				sha256d_pair(&sibling, &current)
			};
			width = (width + 1) / 2;
			index /= 2;
		}

		// Tail elevation.
		let size = if leaves <= span { leaves } else { (leaves - segment * span).min(span) };
		if leaves > span && size < span {
			for _ in 0..ceilinged_log2(span) - ceilinged_log2(size) {
				let sibling = next()?;
				current = sha256d_pair(&current, &sibling);
			}
		}

		// Cross-segment walk.
		if leaves > span {
			let mut width = (leaves + span - 1) / span;
			let mut index = segment;
			while width > 1 {
				let sibling = next()?;
				current = if index % 2 == 0 {
					sha256d_pair(&current, &sibling)
				} else {
					sha256d_pair(&sibling, &current)
				};
				width = (width + 1) / 2;
				index /= 2;
			}
		}

		if entries.next().is_some() {
			return Err(ErrorKind::MerkleProof.into());
		}
		Ok(current)
	}
}
