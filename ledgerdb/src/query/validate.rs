//! Validation state over the validated_bk and validated_tx caches.

use error::{Code, Result};
use link::{HeaderLink, Link, TxLink};
use query::Query;
use schema::{Context, ValidatedBkRecord, ValidatedTxRecord};

impl<'a> Query<'a> {
	/// Block validation state: unassociated until its transactions
	/// are archived, unvalidated until a code is recorded.
	pub fn get_block_state(&self, link: HeaderLink) -> Code {
		self.get_block_state_fees(link).0
	}

	/// As `get_block_state`, also yielding recorded fees (zero unless
	/// confirmable).
	pub fn get_block_state_fees(&self, link: HeaderLink) -> (Code, u64) {
		if link.is_terminal() {
			return (Code::Unassociated, 0);
		}
		match self.is_associated(link) {
			Ok(true) => {},
			Ok(false) => return (Code::Unassociated, 0),
			Err(_) => return (Code::Integrity1, 0),
		}

		match self.store().validated_bk.get(link.value()) {
			Ok(Some(record)) => {
				let code = Code::from_u8(record.code).unwrap_or(Code::Unvalidated);
				(code, record.fees.unwrap_or(0))
			},
			Ok(None) => (Code::Unvalidated, 0),
			Err(_) => (Code::Integrity1, 0),
		}
	}

	pub fn set_block_confirmable(&self, link: HeaderLink, fees: u64) -> Result<()> {
		self.store().validated_bk.put(link.value(), &ValidatedBkRecord::confirmable(fees)).map(|_| ())
	}

	pub fn set_block_preconfirmable(&self, link: HeaderLink) -> Result<()> {
		self.store().validated_bk.put(link.value(), &ValidatedBkRecord::plain(Code::BlockPreconfirmable)).map(|_| ())
	}

	pub fn set_block_unconfirmable(&self, link: HeaderLink) -> Result<()> {
		self.store().validated_bk.put(link.value(), &ValidatedBkRecord::plain(Code::BlockUnconfirmable)).map(|_| ())
	}

	/// Transaction validation state under a specific context.
	pub fn get_tx_state(&self, tx_fk: TxLink, ctx: &Context) -> Code {
		self.get_tx_state_fees(tx_fk, ctx).0
	}

	/// As `get_tx_state`, also yielding (fee, sigops).
	pub fn get_tx_state_fees(&self, tx_fk: TxLink, ctx: &Context) -> (Code, u64, u64) {
		if tx_fk.is_terminal() {
			return (Code::Unvalidated, 0, 0);
		}

		match self.store().validated_tx.get_in_context(tx_fk, ctx) {
			Ok(Some(record)) => {
				let code = Code::from_u8(record.code).unwrap_or(Code::Unvalidated);
				(code, record.fee, record.sigops)
			},
			Ok(None) => (Code::Unvalidated, 0, 0),
			Err(_) => (Code::Integrity1, 0, 0),
		}
	}

	pub fn set_tx_connected(&self, tx_fk: TxLink, ctx: &Context, fee: u64, sigops: u64) -> Result<()> {
		self.put_tx_state(tx_fk, ctx, Code::TxConnected, fee, sigops)
	}

	pub fn set_tx_preconnected(&self, tx_fk: TxLink, ctx: &Context) -> Result<()> {
		self.put_tx_state(tx_fk, ctx, Code::TxPreconnected, 0, 0)
	}

	pub fn set_tx_disconnected(&self, tx_fk: TxLink, ctx: &Context) -> Result<()> {
		self.put_tx_state(tx_fk, ctx, Code::TxDisconnected, 0, 0)
	}

	fn put_tx_state(&self, tx_fk: TxLink, ctx: &Context, code: Code, fee: u64, sigops: u64) -> Result<()> {
		self.store().validated_tx.put(tx_fk, &ValidatedTxRecord {
			ctx: *ctx,
			code: code as u8,
			fee,
			sigops,
		}).map(|_| ())
	}
}
