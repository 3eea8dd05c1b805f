#![allow(unknown_lints)]
#![allow(missing_docs)]

use std::io;
use std::path::PathBuf;

/// Stable state codes surfaced by the validation tables and the
/// confirmability engine. Values are persisted (validated_bk/validated_tx)
/// and must not be renumbered.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[repr(u8)]
pub enum Code {
	Success = 0,
	Unassociated = 1,
	Unvalidated = 2,
	BlockConfirmable = 3,
	BlockUnconfirmable = 4,
	BlockPreconfirmable = 5,
	TxConnected = 6,
	TxPreconnected = 7,
	TxDisconnected = 8,
	ConfirmedDoubleSpend = 9,
	UnspentCoinbaseCollision = 10,
	UnconfirmedSpend = 11,
	RelativeTimeLocked = 12,
	CoinbaseMaturity = 13,
	Integrity1 = 21,
	Integrity2 = 22,
	Integrity3 = 23,
	Integrity4 = 24,
	Integrity5 = 25,
	Integrity6 = 26,
	Integrity7 = 27,
	Integrity8 = 28,
	Integrity9 = 29,
}

impl Code {
	/// Decode a persisted code byte. Unknown bytes are preserved by the
	/// codecs as raw values and never reach this function.
	pub fn from_u8(byte: u8) -> Option<Code> {
		use self::Code::*;

		Some(match byte {
			0 => Success,
			1 => Unassociated,
			2 => Unvalidated,
			3 => BlockConfirmable,
			4 => BlockUnconfirmable,
			5 => BlockPreconfirmable,
			6 => TxConnected,
			7 => TxPreconnected,
			8 => TxDisconnected,
			9 => ConfirmedDoubleSpend,
			10 => UnspentCoinbaseCollision,
			11 => UnconfirmedSpend,
			12 => RelativeTimeLocked,
			13 => CoinbaseMaturity,
			21 => Integrity1,
			22 => Integrity2,
			23 => Integrity3,
			24 => Integrity4,
			25 => Integrity5,
			26 => Integrity6,
			27 => Integrity7,
			28 => Integrity8,
			29 => Integrity9,
			_ => return None,
		})
	}

	pub fn is_success(&self) -> bool {
		*self == Code::Success
	}

	pub fn is_integrity(&self) -> bool {
		(*self as u8) >= (Code::Integrity1 as u8)
	}
}

error_chain! {
	foreign_links {
		Io(io::Error);
	}

	errors {
		DatabaseLocked(path: PathBuf) {
			description("Store lock is currently acquired")
			display("Could not acquire store lock: {}. \
					 If no other process is using the store \
					 you can delete this file.", path.display()),
		}
		UnloadedFile(path: PathBuf) {
			description("File is not memory mapped"),
			display("File is not memory mapped: {}", path.display()),
		}
		DiskFull(needed: usize) {
			description("Disk full"),
			display("Disk full, {} more bytes required. Free space and reload.", needed),
		}
		MissingBackup {
			description("No backup snapshot exists"),
			display("No backup snapshot exists."),
		}
		CorruptedBackup(path: PathBuf, msg: String) {
			description("Hash of backup data is invalid"),
			display("Backup corruption detected in file at {}. {}", path.display(), msg),
		}
		InvalidOptions(field: &'static str, error: String) {
			description("Invalid options were provided"),
			display("Invalid value of `{}`: {}", field, error),
		}
		InvalidArgument {
			description("Argument out of range"),
			display("Argument out of range."),
		}
		NotFound {
			description("Requested element does not exist"),
			display("Requested element does not exist."),
		}
		MerkleProof {
			description("Merkle proof construction failed"),
			display("Merkle proof construction failed."),
		}
		MerkleHashes {
			description("Confirmed hash read failed"),
			display("Confirmed hash read failed."),
		}
		MerkleInterval {
			description("Merkle interval read failed"),
			display("Merkle interval read failed."),
		}
		Integrity(site: u8) {
			description("Store integrity violation"),
			display("Store integrity violation ({}).", site),
		}
		Exhausted(needed: usize, remaining: usize) {
			description("Record read past end of element"),
			display("Record read of {} bytes exceeds remaining {}.", needed, remaining),
		}
		Cancelled {
			description("Operation observed the cancel flag"),
			display("Operation observed the cancel flag."),
		}
	}
}

impl PartialEq for ErrorKind {
	fn eq(&self, other: &Self) -> bool {
		use self::ErrorKind::*;

		match (self, other) {
			(&DatabaseLocked(ref path), &DatabaseLocked(ref path2)) => path == path2,
			(&UnloadedFile(ref path), &UnloadedFile(ref path2)) => path == path2,
			(&DiskFull(needed), &DiskFull(needed2)) => needed == needed2,
			(&MissingBackup, &MissingBackup) => true,
			(&CorruptedBackup(ref path, ref msg), &CorruptedBackup(ref path2, ref msg2)) =>
				path == path2 && msg == msg2,
			(&InvalidOptions(field, ref error), &InvalidOptions(field2, ref error2)) =>
				field == field2 && error == error2,
			(&InvalidArgument, &InvalidArgument) => true,
			(&NotFound, &NotFound) => true,
			(&MerkleProof, &MerkleProof) => true,
			(&MerkleHashes, &MerkleHashes) => true,
			(&MerkleInterval, &MerkleInterval) => true,
			(&Integrity(site), &Integrity(site2)) => site == site2,
			(&Exhausted(needed, remaining), &Exhausted(needed2, remaining2)) =>
				needed == needed2 && remaining == remaining2,
			(&Cancelled, &Cancelled) => true,
			_ => false,
		}
	}
}
