//! Table shapes composed from a head, a body manager and a chain
//! iterator: hash-keyed with collision chains, array-keyed with one
//! slot per natural key, and keyless record stores.

mod arraymap;
mod hashmap;
mod nomap;

pub use self::arraymap::ArrayMap;
pub use self::hashmap::{ChainIter, HashMap};
pub use self::nomap::NoMap;
