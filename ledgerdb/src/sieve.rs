//! Per-bucket screen for negative hashmap lookups.
//!
//! Each sieve-enabled head bucket carries a 32-bit field in the high
//! half of its cell: the top `select_bits` encode how many screens are
//! active, the rest hold fingerprint bits. Screen c of an s-screen
//! field owns a fixed disjoint subset of the fingerprint bits, given by
//! a triangular mask table; masks nest as screens are added, so a
//! fingerprint admitted once is admitted for the life of the sieve.
//! When all screens are taken and a new fingerprint arrives the field
//! saturates and admits everything from then on.

/// An empty field; matches the all-ones cell written by head create.
pub const EMPTY: u32 = 0xffff_ffff;

/// A saturated field; screens nothing out.
pub const SATURATED: u32 = 0x7fff_ffff;

pub struct Sieve {
	select_bits: u32,
	screen_bits: u32,
	// Row r holds the r + 1 disjoint screen masks of an (r + 1)-screen
	// field. Row r + 1 is row r with the widest mask split in half, so
	// masks[r + 1][c] is a subset of masks[r][c] for c <= r.
	masks: Vec<Vec<u32>>,
}

impl Sieve {
	/// A sieve with `2^select_bits` screens over `32 - select_bits`
	/// fingerprint bits. Zero selector bits disables screening.
	pub fn new(select_bits: u32) -> Sieve {
		let screen_bits = 32 - select_bits;
		let screens = 1usize << select_bits;
		assert!(select_bits == 0 || screens as u32 <= screen_bits,
			"not enough fingerprint bits for {} screens", screens);

		let masks = if select_bits == 0 {
			Vec::new()
		} else {
			generate_masks(screens, screen_bits)
		};

		Sieve { select_bits, screen_bits, masks }
	}

	pub fn disabled() -> Sieve {
		Sieve::new(0)
	}

	pub fn is_enabled(&self) -> bool {
		self.select_bits != 0
	}

	/// True if the field admits the fingerprint. Never false for a
	/// fingerprint previously folded in.
	pub fn screened(&self, field: u32, thumb: u64) -> bool {
		if !self.is_enabled() || field == SATURATED {
			return true;
		}
		if field == EMPTY {
			return false;
		}

		let fingerprint = thumb as u32;
		let active = (field >> self.screen_bits) as usize + 1;
		self.masks[active - 1]
			.iter()
			.any(|mask| (field ^ fingerprint) & mask == 0)
	}

	/// Fold the fingerprint into the field. Returns the updated field
	/// and false once the sieve is saturated.
	pub fn screen(&self, field: u32, thumb: u64) -> (u32, bool) {
		if !self.is_enabled() {
			return (field, false);
		}
		if field == SATURATED {
			return (field, false);
		}

		let fingerprint = thumb as u32;
		if field == EMPTY {
			return (self.guard(fingerprint & self.masks[0][0]), true);
		}
		if self.screened(field, thumb) {
			return (field, true);
		}

		let active = (field >> self.screen_bits) as usize + 1;
		if active == self.masks.len() {
			return (SATURATED, false);
		}

		// The widest mask of row `active - 1` shrank to make room for
		// the new screen; its leftover bits now belong to the new
		// screen and take the new fingerprint.
		let row = &self.masks[active];
		let new_mask = row[active];
		let data = (field & !new_mask & mask_right(self.screen_bits))
			| (fingerprint & new_mask);
		let selector = (active as u32) << self.screen_bits;
		(self.guard(selector | data), true)
	}

	// Reserved patterns are remapped to saturated; admitting extra
	// fingerprints is always sound, rejecting screened ones is not.
	fn guard(&self, field: u32) -> u32 {
		if field == EMPTY { SATURATED } else { field }
	}
}

fn mask_right(bits: u32) -> u32 {
	if bits >= 32 { !0 } else { (1u32 << bits) - 1 }
}

fn generate_masks(screens: usize, screen_bits: u32) -> Vec<Vec<u32>> {
	let mut rows: Vec<Vec<u32>> = Vec::with_capacity(screens);
	rows.push(vec![mask_right(screen_bits)]);

	for _ in 1..screens {
		let mut row = rows.last().expect("row zero inserted above; qed").clone();

		// Split the widest screen; lowest index wins ties.
		let widest = (0..row.len())
			.max_by_key(|index| (row[*index].count_ones(), row.len() - index))
			.expect("rows are never empty; qed");

		let split = lower_half(row[widest]);
		row[widest] &= !split;
		row.push(split);
		rows.push(row);
	}

	rows
}

// The lower floor(n/2) set bits of the mask.
fn lower_half(mask: u32) -> u32 {
	let take = mask.count_ones() / 2;
	let mut out = 0u32;
	let mut taken = 0;
	for bit in 0..32 {
		if taken == take {
			break;
		}
		if mask & (1 << bit) != 0 {
			out |= 1 << bit;
			taken += 1;
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::{generate_masks, Sieve, EMPTY, SATURATED};
	use quickcheck::TestResult;

	#[test]
	fn test_disabled_screens_nothing() {
		let sieve = Sieve::disabled();
		assert!(sieve.screened(EMPTY, 42));
		let (field, admitted) = sieve.screen(EMPTY, 42);
		assert_eq!(field, EMPTY);
		assert!(!admitted);
	}

	#[test]
	fn test_empty_then_screened() {
		let sieve = Sieve::new(4);
		assert!(!sieve.screened(EMPTY, 42));

		let (field, admitted) = sieve.screen(EMPTY, 42);
		assert!(admitted);
		assert!(sieve.screened(field, 42));
	}

	#[test]
	fn test_masks_triangular_and_nested() {
		let screens = 16;
		let rows = generate_masks(screens, 28);
		assert_eq!(rows.len(), screens);

		for (index, row) in rows.iter().enumerate() {
			assert_eq!(row.len(), index + 1);

			// Disjoint and covering.
			let mut seen = 0u32;
			for mask in row {
				assert!(*mask != 0);
				assert_eq!(seen & mask, 0);
				seen |= mask;
			}
			assert_eq!(seen, 0x0fff_ffff);
		}

		// Nesting across rows.
		for r in 1..rows.len() {
			for c in 0..rows[r - 1].len() {
				assert_eq!(rows[r][c] & !rows[r - 1][c], 0);
			}
		}
	}

	#[test]
	fn test_saturation_admits_all() {
		let sieve = Sieve::new(4);
		let mut field = EMPTY;
		let mut rounds = 0;

		// Feed fingerprints until one saturates the field. Screened
		// repeats return true without consuming a screen, so only an
		// iteration bound is asserted here.
		let mut thumb = 0x0123_4567u64;
		loop {
			let (next, admitted) = sieve.screen(field, thumb);
			field = next;
			if !admitted {
				break;
			}
			rounds += 1;
			assert!(rounds < 100_000, "sieve never saturated");
			thumb = thumb.wrapping_mul(0x9e37_79b9).wrapping_add(1);
		}

		assert_eq!(field, SATURATED);
		for probe in 0..1000u64 {
			assert!(sieve.screened(field, probe * 0x1_0001));
		}
		// Saturation is permanent.
		let (next, admitted) = sieve.screen(field, 7);
		assert_eq!(next, SATURATED);
		assert!(!admitted);
	}

	quickcheck! {
		fn quickcheck_no_false_negatives(thumbs: Vec<u64>) -> TestResult {
			if thumbs.is_empty() || thumbs.len() > 64 {
				return TestResult::discard();
			}

			let sieve = Sieve::new(4);
			let mut field = EMPTY;
			for thumb in &thumbs {
				let (next, _) = sieve.screen(field, *thumb);
				field = next;

				// Everything folded so far stays admitted.
				for prior in &thumbs {
					if prior == thumb {
						break;
					}
					if !sieve.screened(field, *prior) {
						return TestResult::failed();
					}
				}
				if !sieve.screened(field, *thumb) {
					return TestResult::failed();
				}
			}

			TestResult::passed()
		}
	}
}
