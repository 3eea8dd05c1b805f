extern crate ledgerdb;
extern crate tempdir;

mod common;

use ledgerdb::{Code, Context, HeaderLink, Link, Options, Query, Store, TxLink};
use tempdir::TempDir;

fn with_store<F: FnOnce(&Query)>(name: &str, f: F) {
	let temp = TempDir::new(name).unwrap();
	let store = Store::create(temp.path(), Options::default()).unwrap();
	let query = Query::new(&store);
	query.initialize(&common::genesis()).unwrap();
	f(&query);
}

fn header_link(value: u64) -> HeaderLink {
	HeaderLink::from_value(value)
}

#[test]
fn get_context_genesis_default() {
	with_store("ctx_genesis", |query| {
		assert_eq!(query.get_context(header_link(0)), Context::default());
	});
}

#[test]
fn get_context_invalid_default() {
	with_store("ctx_invalid", |query| {
		assert_eq!(query.get_context(HeaderLink::terminal()), Context::default());
		assert_eq!(query.get_context(header_link(1)), Context::default());
	});
}

#[test]
fn get_context_block1_expected() {
	with_store("ctx_block1", |query| {
		let expected = Context::new(12, 34, 56);
		query.set(&common::mainnet_block(1), &expected).unwrap();
		assert_eq!(query.get_context(header_link(1)), expected);
	});
}

#[test]
fn get_block_state_invalid_link_unassociated() {
	with_store("state_invalid", |query| {
		assert_eq!(query.get_block_state(header_link(1)), Code::Unassociated);
		let (code, fees) = query.get_block_state_fees(header_link(1));
		assert_eq!(code, Code::Unassociated);
		assert_eq!(fees, 0);
	});
}

#[test]
fn get_block_state_unassociated_link_unassociated() {
	with_store("state_unassociated", |query| {
		let block1 = common::mainnet_block(1);
		query.set_header(&block1.header, &Context::default()).unwrap();
		query.set_tx(&block1.transactions[0]).unwrap();

		assert_eq!(query.get_block_state(header_link(1)), Code::Unassociated);
	});
}

#[test]
fn get_block_state_unvalidated_link_unvalidated() {
	with_store("state_unvalidated", |query| {
		query.set(&common::mainnet_block(1), &Context::default()).unwrap();
		assert_eq!(query.get_block_state(header_link(1)), Code::Unvalidated);
	});
}

#[test]
fn get_block_state_confirmable() {
	with_store("state_confirmable", |query| {
		query.set(&common::mainnet_block(1), &Context::default()).unwrap();

		// Genesis is marked confirmable with zero fees at initialize.
		let (code, fees) = query.get_block_state_fees(header_link(0));
		assert_eq!(code, Code::BlockConfirmable);
		assert_eq!(fees, 0);

		query.set_block_confirmable(header_link(1), 42).unwrap();
		let (code, fees) = query.get_block_state_fees(header_link(1));
		assert_eq!(code, Code::BlockConfirmable);
		assert_eq!(fees, 42);
	});
}

#[test]
fn get_block_state_preconfirmable() {
	with_store("state_preconfirmable", |query| {
		query.set(&common::mainnet_block(1), &Context::default()).unwrap();
		query.set_block_preconfirmable(header_link(1)).unwrap();

		let (code, fees) = query.get_block_state_fees(header_link(1));
		assert_eq!(code, Code::BlockPreconfirmable);
		assert_eq!(fees, 0);
	});
}

#[test]
fn get_block_state_unconfirmable() {
	with_store("state_unconfirmable", |query| {
		query.set(&common::mainnet_block(1), &Context::default()).unwrap();
		query.set_block_unconfirmable(header_link(1)).unwrap();
		assert_eq!(query.get_block_state(header_link(1)), Code::BlockUnconfirmable);
	});
}

#[test]
fn get_tx_state_invalid_link_unvalidated() {
	with_store("tx_state_invalid", |query| {
		let (code, fee, sigops) =
			query.get_tx_state_fees(TxLink::from_value(1), &Context::default());
		assert_eq!(code, Code::Unvalidated);
		assert_eq!(fee, 0);
		assert_eq!(sigops, 0);
	});
}

#[test]
fn get_tx_state_connected_out_of_context_unvalidated() {
	let temp = TempDir::new("tx_state_out_of_context").unwrap();
	let mut options = Options::default();
	options.validated_tx.buckets = 1;
	let store = Store::create(temp.path(), options).unwrap();
	let query = Query::new(&store);
	query.initialize(&common::genesis()).unwrap();
	query.set(&common::mainnet_block(1), &Context::default()).unwrap();
	query.set(&common::mainnet_block(2), &Context::default()).unwrap();
	query.set(&common::mainnet_block(3), &Context::default()).unwrap();

	let ctx = Context::new(7, 8, 9);

	// Records under contexts that do not match ctx.
	query.set_tx_connected(TxLink::from_value(0), &Context::new(1, 5, 9), 0, 0).unwrap();
	query.set_tx_connected(TxLink::from_value(1), &Context::new(2, 6, 0), 0, 0).unwrap();
	query.set_tx_connected(TxLink::from_value(2), &Context::new(3, 7, 1), 0, 0).unwrap();
	query.set_tx_connected(TxLink::from_value(3), &Context::new(4, 8, 2), 0, 0).unwrap();

	assert_eq!(query.get_tx_state(TxLink::from_value(1), &ctx), Code::Unvalidated);
}

#[test]
fn get_tx_state_connected_in_context() {
	let temp = TempDir::new("tx_state_in_context").unwrap();
	let mut options = Options::default();
	options.validated_tx.buckets = 1;
	let store = Store::create(temp.path(), options).unwrap();
	let query = Query::new(&store);
	query.initialize(&common::genesis()).unwrap();
	query.set(&common::mainnet_block(1), &Context::default()).unwrap();
	query.set(&common::mainnet_block(2), &Context::default()).unwrap();
	query.set(&common::mainnet_block(3), &Context::default()).unwrap();

	let ctx = Context::new(7, 8, 9);
	let tx2 = TxLink::from_value(2);

	query.set_tx_connected(TxLink::from_value(0), &ctx, 11, 12).unwrap();
	query.set_tx_connected(TxLink::from_value(1), &ctx, 13, 14).unwrap();
	query.set_tx_connected(tx2, &ctx, 42, 24).unwrap();
	query.set_tx_connected(tx2, &Context::new(1, 5, 9), 15, 16).unwrap();
	query.set_tx_connected(tx2, &Context::new(2, 6, 0), 17, 18).unwrap();
	query.set_tx_connected(TxLink::from_value(3), &ctx, 19, 20).unwrap();

	let (code, fee, sigops) = query.get_tx_state_fees(tx2, &ctx);
	assert_eq!(code, Code::TxConnected);
	assert_eq!(fee, 42);
	assert_eq!(sigops, 24);
}

#[test]
fn get_tx_state_preconnected() {
	with_store("tx_state_preconnected", |query| {
		query.set(&common::mainnet_block(1), &Context::default()).unwrap();
		let ctx = Context::new(7, 8, 9);
		let tx = TxLink::from_value(1);

		query.set_tx_preconnected(tx, &ctx).unwrap();
		assert_eq!(query.get_tx_state(tx, &ctx), Code::TxPreconnected);
	});
}

#[test]
fn get_tx_state_disconnected() {
	with_store("tx_state_disconnected", |query| {
		query.set(&common::mainnet_block(1), &Context::default()).unwrap();
		let ctx = Context::new(7, 8, 9);
		let tx = TxLink::from_value(1);

		query.set_tx_disconnected(tx, &ctx).unwrap();
		assert_eq!(query.get_tx_state(tx, &ctx), Code::TxDisconnected);
	});
}
