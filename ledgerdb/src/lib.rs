//! Embedded, single-process storage engine for a blockchain archive.
//!
//! Assumptions:
//!
//! - headers, transactions, spends and confirmation state persist as
//!   a set of memory-mapped files
//!
//! - with blazingly fast hash-keyed reads through per-bucket sieves
//!
//! - multi-reader, single-writer, serialized by a store-wide
//!   transactor
//!
//! - records are immutable once published; rollback is whole-table
//!   truncation
//!
//! Each table is a head file (bucket slots plus a body count) and a
//! body file (chained elements):
//!
//! ```text
//!  head                      body
//!   /                         /
//! |count|cell_0|..|cell_N|  |next|key|payload|next|key|payload|...
//! ```
//!
//! The query layer builds block assembly, confirmability (BIP30,
//! BIP68, coinbase maturity, double spends), fee aggregation and
//! merkle proofs on top of the tables.

extern crate byteorder;
#[macro_use]
extern crate error_chain;
extern crate fs2;
extern crate hex_slice;
extern crate itertools;
#[macro_use]
extern crate log;
extern crate memmap;
extern crate parking_lot;
extern crate rayon;
extern crate sha2;
extern crate tiny_keccak;
#[cfg(test)]
#[macro_use]
extern crate matches;
#[cfg(test)]
#[macro_use]
extern crate quickcheck;

pub mod chain;
mod error;
mod head;
mod keys;
mod link;
mod manager;
mod options;
mod query;
mod schema;
mod serial;
mod sieve;
mod storage;
mod store;
mod table;

pub use error::{Code, Error, ErrorKind, Result};
pub use keys::Key;
pub use link::{
	AddressLink, DuplicateLink, HeaderLink, HeightLink, InsLink, Link, PointLink, PutLink,
	SlabLink, SpendLink, StrongLink, TxLink,
};
pub use options::{Options, TableOptions};
pub use query::{FeeRate, FeeRateSets, FeeRates, Query, SpendItem, SpendSet};
pub use schema::{Context, BIP30_RULE, BIP68_RULE};
pub use storage::{ChunkStorage, Lease, MapFile, Storage};
pub use store::Store;
