//! Store lifecycle: file layout, locks, flush, backup and restore.
//!
//! Layout under the configured directory:
//!
//! ```text
//! <dir>/archive_<table>.dat           body
//! <dir>/index/archive_<table>.idx     head
//! <dir>/flush.lock
//! <dir>/process.lock
//! <dir>/.backup/                      head snapshots
//! ```
//!
//! The transactor is an advisory store-wide read-write lock: shared
//! for reads and single-element inserts (which are serialized at the
//! bucket heads), exclusive for structural operations such as backup,
//! restore and multi-table strong/prevout sequences.

use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use fs2::FileExt;
use hex_slice::AsHex;
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tiny_keccak::sha3_256;

use error::{ErrorKind, Result};
use options::Options;
use schema::{
	AddressTable, DuplicateTable, FilterBkTable, FilterTxTable, HeaderTable, HeightTable,
	InputTable, InsTable, OutputTable, PointTable, PrevoutTable, PutsTable, SpendTable,
	StrongTxTable, TxTable, TxsTable, ValidatedBkTable, ValidatedTxTable,
};
use storage::{MapFile, Storage};

const BACKUP_DIR: &'static str = ".backup";
const BACKUP_TMP_DIR: &'static str = ".backup.tmp";
const PROCESS_LOCK: &'static str = "process.lock";
const FLUSH_LOCK: &'static str = "flush.lock";
const CHECKSUM_SIZE: usize = 32;

const TABLE_NAMES: [&'static str; 19] = [
	"header", "point", "input", "output", "ins", "puts", "tx", "txs", "spend",
	"candidate", "confirmed", "strong_tx", "duplicate", "prevout",
	"validated_bk", "validated_tx", "filter_bk", "filter_tx", "address",
];

struct TableFiles {
	name: &'static str,
	head: Arc<MapFile>,
	body: Arc<MapFile>,
}

macro_rules! each_table {
	($self: ident, $name: ident, $method: ident) => {
		$self.$name.inner().$method()
	}
}

macro_rules! all_tables {
	($self: ident, $method: ident) => {{
		each_table!($self, header, $method)?;
		each_table!($self, point, $method)?;
		each_table!($self, input, $method)?;
		each_table!($self, output, $method)?;
		each_table!($self, ins, $method)?;
		each_table!($self, puts, $method)?;
		each_table!($self, tx, $method)?;
		each_table!($self, txs, $method)?;
		each_table!($self, spend, $method)?;
		each_table!($self, candidate, $method)?;
		each_table!($self, confirmed, $method)?;
		each_table!($self, strong_tx, $method)?;
		each_table!($self, duplicate, $method)?;
		each_table!($self, prevout, $method)?;
		each_table!($self, validated_bk, $method)?;
		each_table!($self, validated_tx, $method)?;
		each_table!($self, filter_bk, $method)?;
		each_table!($self, filter_tx, $method)?;
		each_table!($self, address, $method)?;
	}}
}

pub struct Store {
	dir: PathBuf,
	options: Options,
	files: Vec<TableFiles>,

	pub header: HeaderTable,
	pub point: PointTable,
	pub input: InputTable,
	pub output: OutputTable,
	pub ins: InsTable,
	pub puts: PutsTable,
	pub tx: TxTable,
	pub txs: TxsTable,
	pub spend: SpendTable,
	pub candidate: HeightTable,
	pub confirmed: HeightTable,
	pub strong_tx: StrongTxTable,
	pub duplicate: DuplicateTable,
	pub prevout: PrevoutTable,
	pub validated_bk: ValidatedBkTable,
	pub validated_tx: ValidatedTxTable,
	pub filter_bk: FilterBkTable,
	pub filter_tx: FilterTxTable,
	pub address: AddressTable,

	transactor: RwLock<()>,
	process_lock: Mutex<Option<File>>,
	flush_lock: Mutex<Option<File>>,
	closed: AtomicBool,
}

fn body_path(dir: &Path, name: &str) -> PathBuf {
	dir.join(format!("archive_{}.dat", name))
}

fn head_path(dir: &Path, name: &str) -> PathBuf {
	dir.join("index").join(format!("archive_{}.idx", name))
}

fn acquire_lock_file(path: PathBuf) -> Result<File> {
	let lock_file = fs::OpenOptions::new()
		.write(true)
		.create(true)
		.open(&path)?;
	lock_file.try_lock_exclusive().map_err(|_| ErrorKind::DatabaseLocked(path))?;
	Ok(lock_file)
}

impl fmt::Debug for Store {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("Store").field("dir", &self.dir).finish()
	}
}

impl Store {
	/// Create a fresh store. Fails if any table file already exists.
	pub fn create<P: AsRef<Path>>(dir: P, options: Options) -> Result<Store> {
		options.validate()?;
		let dir = dir.as_ref();
		fs::create_dir_all(dir.join("index"))?;

		let process_lock = acquire_lock_file(dir.join(PROCESS_LOCK))?;

		let mut files = Vec::with_capacity(TABLE_NAMES.len());
		for &name in TABLE_NAMES.iter() {
			let body_size = Store::table_options(&options, name).size;
			files.push(TableFiles {
				name,
				head: Arc::new(MapFile::create(head_path(dir, name), 1)?),
				body: Arc::new(MapFile::create(body_path(dir, name), body_size)?),
			});
		}

		let store = Store::assemble(dir, options, files, process_lock)?;
		all_tables!(store, create);
		store.flush()?;
		info!("created store at {:?}", store.dir);
		Ok(store)
	}

	/// Open an existing store, truncating bodies to their persisted
	/// counts.
	pub fn open<P: AsRef<Path>>(dir: P, options: Options) -> Result<Store> {
		options.validate()?;
		let dir = dir.as_ref();

		let process_lock = acquire_lock_file(dir.join(PROCESS_LOCK))?;

		let mut files = Vec::with_capacity(TABLE_NAMES.len());
		for &name in TABLE_NAMES.iter() {
			files.push(TableFiles {
				name,
				head: Arc::new(MapFile::open(head_path(dir, name))?),
				body: Arc::new(MapFile::open(body_path(dir, name))?),
			});
		}

		let store = Store::assemble(dir, options, files, process_lock)?;
		if !store.verify() {
			return Err(ErrorKind::Integrity(1).into());
		}
		all_tables!(store, open);
		info!("opened store at {:?}", store.dir);
		Ok(store)
	}

	fn assemble(
		dir: &Path,
		options: Options,
		files: Vec<TableFiles>,
		process_lock: File,
	) -> Result<Store> {
		for table in &files {
			table.head.load()?;
			table.body.load()?;
		}

		let flush_lock = acquire_lock_file(dir.join(FLUSH_LOCK))?;

		let storage = |name: &str| -> (Arc<Storage>, Arc<Storage>) {
			let table = files.iter().find(|table| table.name == name)
				.expect("every table name is listed; qed");
			(table.head.clone(), table.body.clone())
		};

		let (header_h, header_b) = storage("header");
		let (point_h, point_b) = storage("point");
		let (input_h, input_b) = storage("input");
		let (output_h, output_b) = storage("output");
		let (ins_h, ins_b) = storage("ins");
		let (puts_h, puts_b) = storage("puts");
		let (tx_h, tx_b) = storage("tx");
		let (txs_h, txs_b) = storage("txs");
		let (spend_h, spend_b) = storage("spend");
		let (candidate_h, candidate_b) = storage("candidate");
		let (confirmed_h, confirmed_b) = storage("confirmed");
		let (strong_h, strong_b) = storage("strong_tx");
		let (duplicate_h, duplicate_b) = storage("duplicate");
		let (prevout_h, prevout_b) = storage("prevout");
		let (validated_bk_h, validated_bk_b) = storage("validated_bk");
		let (validated_tx_h, validated_tx_b) = storage("validated_tx");
		let (filter_bk_h, filter_bk_b) = storage("filter_bk");
		let (filter_tx_h, filter_tx_b) = storage("filter_tx");
		let (address_h, address_b) = storage("address");

		Ok(Store {
			header: HeaderTable::new(header_h, header_b, options.header.buckets),
			point: PointTable::new(point_h, point_b, options.point.buckets),
			input: InputTable::new(input_h, input_b),
			output: OutputTable::new(output_h, output_b),
			ins: InsTable::new(ins_h, ins_b),
			puts: PutsTable::new(puts_h, puts_b),
			tx: TxTable::new(tx_h, tx_b, options.tx.buckets),
			txs: TxsTable::new(txs_h, txs_b, options.txs.buckets),
			spend: SpendTable::new(spend_h, spend_b, options.spend.buckets),
			candidate: HeightTable::new(candidate_h, candidate_b, options.candidate.buckets),
			confirmed: HeightTable::new(confirmed_h, confirmed_b, options.confirmed.buckets),
			strong_tx: StrongTxTable::new(strong_h, strong_b, options.strong_tx.buckets),
			duplicate: DuplicateTable::new(duplicate_h, duplicate_b, options.duplicate.buckets),
			prevout: PrevoutTable::new(prevout_h, prevout_b, options.prevout.buckets),
			validated_bk: ValidatedBkTable::new(validated_bk_h, validated_bk_b, options.validated_bk.buckets),
			validated_tx: ValidatedTxTable::new(validated_tx_h, validated_tx_b, options.validated_tx.buckets),
			filter_bk: FilterBkTable::new(filter_bk_h, filter_bk_b, options.filter_bk.buckets),
			filter_tx: FilterTxTable::new(filter_tx_h, filter_tx_b, options.filter_tx.buckets),
			address: AddressTable::new(address_h, address_b, options.address.buckets),
			dir: dir.to_owned(),
			options,
			files,
			transactor: RwLock::new(()),
			process_lock: Mutex::new(Some(process_lock)),
			flush_lock: Mutex::new(Some(flush_lock)),
			closed: AtomicBool::new(false),
		})
	}

	fn table_options<'a>(options: &'a Options, name: &str) -> &'a ::options::TableOptions {
		match name {
			"header" => &options.header,
			"point" => &options.point,
			"input" => &options.input,
			"output" => &options.output,
			"ins" => &options.ins,
			"puts" => &options.puts,
			"tx" => &options.tx,
			"txs" => &options.txs,
			"spend" => &options.spend,
			"candidate" => &options.candidate,
			"confirmed" => &options.confirmed,
			"strong_tx" => &options.strong_tx,
			"duplicate" => &options.duplicate,
			"prevout" => &options.prevout,
			"validated_bk" => &options.validated_bk,
			"validated_tx" => &options.validated_tx,
			"filter_bk" => &options.filter_bk,
			"filter_tx" => &options.filter_tx,
			"address" => &options.address,
			_ => unreachable!("unknown table name"),
		}
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	pub fn options(&self) -> &Options {
		&self.options
	}

	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::Acquire)
	}

	fn check_open(&self) -> Result<()> {
		if self.is_closed() {
			return Err(ErrorKind::UnloadedFile(self.dir.clone()).into());
		}
		Ok(())
	}

	fn verify(&self) -> bool {
		self.header.inner().verify()
			&& self.point.inner().verify()
			&& self.input.inner().verify()
			&& self.output.inner().verify()
			&& self.ins.inner().verify()
			&& self.puts.inner().verify()
			&& self.tx.inner().verify()
			&& self.txs.inner().verify()
			&& self.spend.inner().verify()
			&& self.candidate.inner().verify()
			&& self.confirmed.inner().verify()
			&& self.strong_tx.inner().verify()
			&& self.duplicate.inner().verify()
			&& self.prevout.inner().verify()
			&& self.validated_bk.inner().verify()
			&& self.validated_tx.inner().verify()
			&& self.filter_bk.inner().verify()
			&& self.filter_tx.inner().verify()
			&& self.address.inner().verify()
	}

	/// Shared transactor guard for readers and single-element writers.
	pub fn get_transactor(&self) -> RwLockReadGuard<()> {
		self.transactor.read()
	}

	/// Exclusive transactor guard for structural operations.
	pub fn get_exclusive_transactor(&self) -> RwLockWriteGuard<()> {
		self.transactor.write()
	}

	pub fn flush(&self) -> Result<()> {
		self.check_open()?;
		for table in &self.files {
			table.body.flush()?;
			table.head.flush()?;
		}
		Ok(())
	}

	/// Retry pending grows after a disk-full condition.
	pub fn reload(&self) -> Result<()> {
		self.check_open()?;
		for table in &self.files {
			table.body.reload()?;
			table.head.reload()?;
		}
		Ok(())
	}

	/// Persist body counts, flush everything and release the locks.
	pub fn close(&self) -> Result<()> {
		if self.closed.swap(true, Ordering::AcqRel) {
			return Ok(());
		}

		let _exclusive = self.transactor.write();
		all_tables!(self, close);
		for table in &self.files {
			table.body.unload()?;
			table.head.unload()?;
		}

		if let Some(lock) = self.flush_lock.lock().take() {
			let _ = lock.unlock();
			let _ = fs::remove_file(self.dir.join(FLUSH_LOCK));
		}
		if let Some(lock) = self.process_lock.lock().take() {
			let _ = lock.unlock();
		}

		info!("closed store at {:?}", self.dir);
		Ok(())
	}

	/// Snapshot every head file (with a sha3-256 checksum prefix) into
	/// the backup directory. Takes the transactor exclusively.
	pub fn backup(&self) -> Result<()> {
		self.check_open()?;
		let _exclusive = self.transactor.write();

		all_tables!(self, close);
		self.flush()?;

		let tmp = self.dir.join(BACKUP_TMP_DIR);
		let _ = fs::remove_dir_all(&tmp);
		fs::create_dir_all(&tmp)?;

		for table in &self.files {
			let lease = table.head.read()?;
			let bytes = &lease.bytes()[..table.head.size()];
			let checksum = sha3_256(bytes);

			let mut snapshot = Vec::with_capacity(CHECKSUM_SIZE + bytes.len());
			snapshot.extend_from_slice(&checksum);
			snapshot.extend_from_slice(bytes);
			fs::write(tmp.join(format!("archive_{}.idx", table.name)), &snapshot)?;
		}

		let backup = self.dir.join(BACKUP_DIR);
		let _ = fs::remove_dir_all(&backup);
		fs::rename(&tmp, &backup)?;
		info!("snapshot of {} head files written to {:?}", self.files.len(), backup);
		Ok(())
	}

	/// Replace live head files from the snapshot and reopen the
	/// tables against the restored counts.
	pub fn restore(&self) -> Result<()> {
		self.check_open()?;
		let _exclusive = self.transactor.write();

		let backup = self.dir.join(BACKUP_DIR);
		if !backup.is_dir() {
			return Err(ErrorKind::MissingBackup.into());
		}

		for table in &self.files {
			let path = backup.join(format!("archive_{}.idx", table.name));
			let snapshot = fs::read(&path)?;
			if snapshot.len() < CHECKSUM_SIZE {
				return Err(ErrorKind::CorruptedBackup(path, "snapshot too short".into()).into());
			}

			let (checksum, bytes) = snapshot.split_at(CHECKSUM_SIZE);
			let computed = sha3_256(bytes);
			if checksum != computed {
				return Err(ErrorKind::CorruptedBackup(
					path,
					format!("Expected: {:02x}, got: {:02x}", computed.as_hex(), checksum.as_hex()),
				).into());
			}

			table.head.unload()?;
			fs::write(table.head.path(), bytes)?;
			table.head.load()?;
		}

		if !self.verify() {
			return Err(ErrorKind::Integrity(1).into());
		}
		all_tables!(self, open);
		info!("restored head files from {:?}", backup);
		Ok(())
	}
}

impl Drop for Store {
	fn drop(&mut self) {
		if !self.is_closed() {
			let _ = self.close();
		}
	}
}
