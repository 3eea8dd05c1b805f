extern crate ledgerdb;
#[macro_use]
extern crate matches;
extern crate tempdir;

mod common;

use ledgerdb::{Code, ErrorKind, Link, Options, Query, Store};
use tempdir::TempDir;

#[test]
fn create_open_close() {
	let temp = TempDir::new("create_open_close").unwrap();

	{
		let store = Store::create(temp.path(), Options::default()).unwrap();
		store.flush().unwrap();
		store.close().unwrap();
	}

	let store = Store::open(temp.path(), Options::default()).unwrap();
	store.close().unwrap();
}

#[test]
fn create_writes_expected_layout() {
	let temp = TempDir::new("layout").unwrap();
	let _store = Store::create(temp.path(), Options::default()).unwrap();

	assert!(temp.path().join("archive_header.dat").is_file());
	assert!(temp.path().join("index/archive_header.idx").is_file());
	assert!(temp.path().join("archive_spend.dat").is_file());
	assert!(temp.path().join("index/archive_spend.idx").is_file());
	assert!(temp.path().join("archive_txs.dat").is_file());
	assert!(temp.path().join("process.lock").is_file());
	assert!(temp.path().join("flush.lock").is_file());
}

#[test]
fn create_twice_fails() {
	let temp = TempDir::new("create_twice").unwrap();
	let store = Store::create(temp.path(), Options::default()).unwrap();
	store.close().unwrap();
	assert!(Store::create(temp.path(), Options::default()).is_err());
}

#[test]
fn should_validate_exclusive_access() {
	let temp = TempDir::new("exclusive_access").unwrap();

	{
		// Acquire lock.
		let _store = Store::create(temp.path(), Options::default()).unwrap();
		// Attempt to open again.
		assert!(matches!(
			Store::open(temp.path(), Options::default()).unwrap_err().kind(),
			&ErrorKind::DatabaseLocked(_)
		));
	}

	assert!(Store::open(temp.path(), Options::default()).is_ok());
}

#[test]
fn persists_across_reopen() {
	let temp = TempDir::new("persists").unwrap();
	let genesis = common::genesis();

	{
		let store = Store::create(temp.path(), Options::default()).unwrap();
		let query = Query::new(&store);
		query.initialize(&genesis).unwrap();
		store.close().unwrap();
	}

	let store = Store::open(temp.path(), Options::default()).unwrap();
	let query = Query::new(&store);

	let link = query.to_header(&genesis.hash()).unwrap();
	assert_eq!(link.value(), 0);
	assert_eq!(query.get_block_state(link), Code::BlockConfirmable);
	assert_eq!(query.get_block(link).unwrap(), genesis);
	assert_eq!(query.top_confirmed().unwrap(), 0);
}

#[test]
fn transactor_shared_then_exclusive() {
	let temp = TempDir::new("transactor").unwrap();
	let store = Store::create(temp.path(), Options::default()).unwrap();

	{
		let _first = store.get_transactor();
		let _second = store.get_transactor();
	}

	{
		let _exclusive = store.get_exclusive_transactor();
	}
}

#[test]
fn backup_then_restore_rolls_back_heads() {
	let temp = TempDir::new("backup_restore").unwrap();
	let store = Store::create(temp.path(), Options::default()).unwrap();
	let query = Query::new(&store);
	query.initialize(&common::genesis()).unwrap();

	let before = store.tx.inner().count();
	store.backup().unwrap();
	assert!(temp.path().join(".backup/archive_tx.idx").is_file());

	// New data past the snapshot disappears on restore.
	let ctx = ledgerdb::Context::new(0, 1, 0);
	query.set(&common::block1b(), &ctx).unwrap();
	assert!(store.tx.inner().count() > before);

	store.restore().unwrap();
	assert_eq!(store.tx.inner().count(), before);
	assert!(query.to_tx(&common::block1b().transactions[0].hash()).unwrap().is_terminal());
}

#[test]
fn candidate_chain_walks_to_genesis() {
	let temp = TempDir::new("candidate_chain").unwrap();
	let store = Store::create(temp.path(), Options::default()).unwrap();
	let query = Query::new(&store);
	query.initialize(&common::genesis()).unwrap();

	for height in 1..=3 {
		let block = common::mainnet_block(height);
		let ctx = ledgerdb::Context::new(0, height as u32, 0);
		let link = query.set(&block, &ctx).unwrap();
		query.push_candidate(link).unwrap();
	}

	// Walking parents from the top reaches every candidate slot.
	let top = query.top_candidate().unwrap();
	assert_eq!(top, 3);
	let mut link = query.to_candidate(top).unwrap();
	for height in (0..=3u64).rev() {
		assert_eq!(link, query.to_candidate(height).unwrap());
		link = store.header.get_parent(link).unwrap();
	}
	assert!(link.is_terminal());

	query.pop_candidate().unwrap();
	assert_eq!(query.top_candidate().unwrap(), 2);
}

#[test]
fn address_and_filter_indexes() {
	let temp = TempDir::new("address_filter").unwrap();
	let store = Store::create(temp.path(), Options::default()).unwrap();
	let query = Query::new(&store);
	query.initialize(&common::genesis()).unwrap();

	let script_hash = [0x3cu8; 20];
	let out_fk = ledgerdb::SlabLink::from_value(0);
	query.set_address_output(&script_hash, out_fk).unwrap();
	assert_eq!(query.to_address_outputs(&script_hash).unwrap(), vec![out_fk]);

	let genesis_link = query.to_header(&common::genesis().hash()).unwrap();
	query.set_filter_body(genesis_link, &[0x1du8; 32], &[1, 2, 3]).unwrap();
	assert_eq!(query.get_filter_head(genesis_link).unwrap(), Some([0x1du8; 32]));
	let record = query.get_filter_body(genesis_link).unwrap().unwrap();
	assert_eq!(record.filter, vec![1, 2, 3]);

	query.set_tx_filter(ledgerdb::TxLink::from_value(0), &[9, 9]).unwrap();
	assert_eq!(
		query.get_tx_filter(ledgerdb::TxLink::from_value(0)).unwrap(),
		Some(vec![9, 9])
	);
}

#[test]
fn restore_without_backup_fails() {
	let temp = TempDir::new("restore_missing").unwrap();
	let store = Store::create(temp.path(), Options::default()).unwrap();
	assert!(matches!(
		store.restore().unwrap_err().kind(),
		&ErrorKind::MissingBackup
	));
}

#[test]
fn restore_rejects_corrupt_snapshot() {
	let temp = TempDir::new("restore_corrupt").unwrap();
	let store = Store::create(temp.path(), Options::default()).unwrap();
	store.backup().unwrap();

	// Flip one byte past the checksum.
	let path = temp.path().join(".backup/archive_header.idx");
	let mut bytes = std::fs::read(&path).unwrap();
	let last = bytes.len() - 1;
	bytes[last] ^= 0xff;
	std::fs::write(&path, &bytes).unwrap();

	assert!(matches!(
		store.restore().unwrap_err().kind(),
		&ErrorKind::CorruptedBackup(_, _)
	));
}

#[test]
fn backup_after_close_fails() {
	let temp = TempDir::new("backup_closed").unwrap();
	let store = Store::create(temp.path(), Options::default()).unwrap();
	store.close().unwrap();
	assert!(matches!(
		store.backup().unwrap_err().kind(),
		&ErrorKind::UnloadedFile(_)
	));
}
