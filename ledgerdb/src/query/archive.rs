//! Archive operations: storing and assembling headers, transactions
//! and blocks, and maintaining the candidate/confirmed indexes.

use chain::{self, Block, Hash, Transaction, NULL_HASH};
use error::{ErrorKind, Result};
use link::{HeaderLink, InsLink, Link, PutLink, TxLink};
use query::Query;
use schema::{Context, HeaderRecord, InsRecord, SpendRecord, SpendTable, TxRecord, TxsRecord, ValidatedBkRecord};

impl<'a> Query<'a> {
	/// Archive the genesis block and seed both chain indexes. The
	/// store must be empty.
	pub fn initialize(&self, genesis: &Block) -> Result<()> {
		if self.store().header.inner().count() != 0 {
			return Err(ErrorKind::InvalidArgument.into());
		}

		let link = self.set(genesis, &Context::default())?;
		self.push_candidate(link)?;
		self.push_confirmed(link, true)?;
		self.store().validated_bk.put(link.value(), &ValidatedBkRecord::confirmable(0))?;
		Ok(())
	}

	/// Archive a block: header, transactions, association and (when
	/// enabled) the prevout cache. Returns the header link; a block
	/// already fully archived is left untouched.
	pub fn set(&self, block: &Block, ctx: &Context) -> Result<HeaderLink> {
		let _exclusive = self.store().get_exclusive_transactor();

		let link = self.set_header_internal(&block.header, ctx, false)?;
		let header_fk = link.value();
		if self.store().txs.is_associated(header_fk)? {
			return Ok(link);
		}

		let mut tx_fks = Vec::with_capacity(block.transactions.len());
		for (index, tx) in block.transactions.iter().enumerate() {
			let (tx_fk, existed) = self.set_tx_internal(tx)?;
			// A repeated coinbase hash triggers the BIP30 scan later.
			if index == 0 && existed && tx.is_coinbase() {
				self.store().duplicate.put(&tx.hash())?;
			}
			tx_fks.push(tx_fk);
		}

		let interval = self.create_interval(link, ctx.height as u64)?;
		let record = TxsRecord {
			light: block.serialized_size(false) as u32,
			heavy: block.serialized_size(true) as u32,
			tx_fks,
			interval,
			depth: 0,
		};
		self.store().txs.put(header_fk, &record)?;

		if self.store().options().prevouts {
			self.set_prevouts(link, block)?;
		}

		Ok(link)
	}

	pub fn set_header(&self, header: &chain::Header, ctx: &Context) -> Result<HeaderLink> {
		let _exclusive = self.store().get_exclusive_transactor();
		self.set_header_internal(header, ctx, false)
	}

	fn set_header_internal(
		&self,
		header: &chain::Header,
		ctx: &Context,
		milestone: bool,
	) -> Result<HeaderLink> {
		let hash = header.hash();
		let existing = self.store().header.first(&hash)?;
		if !existing.is_terminal() {
			return Ok(existing);
		}

		let parent_fk = if header.previous == NULL_HASH {
			HeaderLink::terminal()
		} else {
			let parent = self.store().header.first(&header.previous)?;
			if parent.is_terminal() {
				return Err(ErrorKind::NotFound.into());
			}
			parent
		};

		let record = HeaderRecord {
			ctx: *ctx,
			milestone,
			parent_fk,
			version: header.version,
			timestamp: header.timestamp,
			bits: header.bits,
			nonce: header.nonce,
			merkle_root: header.merkle_root,
		};
		self.store().header.put(&hash, &record)
	}

	pub fn set_tx(&self, tx: &Transaction) -> Result<TxLink> {
		let _exclusive = self.store().get_exclusive_transactor();
		self.set_tx_internal(tx).map(|(link, _)| link)
	}

	// Returns (link, already-existed). Writes outputs, puts, inputs,
	// ins slots, points and spends before the tx record itself.
	fn set_tx_internal(&self, tx: &Transaction) -> Result<(TxLink, bool)> {
		let store = self.store();
		let hash = tx.hash();

		let existing = store.tx.first(&hash)?;
		if !existing.is_terminal() {
			return Ok((existing, true));
		}

		let outs_fk = store.puts.allocate(tx.outputs.len())?;
		for (index, output) in tx.outputs.iter().enumerate() {
			let out_fk = store.output.put(output.value, &output.script)?;
			store.puts.write_put(PutLink::from_value(outs_fk.value() + index as u64), out_fk)?;
		}

		// The tx link is its ordinal; writes are serialized by the
		// exclusive transactor taken by the callers.
		let tx_fk = TxLink::from_value(store.tx.inner().count());

		let point_fk = store.ins.allocate(tx.inputs.len())?;
		for (index, input) in tx.inputs.iter().enumerate() {
			let input_fk = store.input.put(&input.script, &input.witness)?;
			let point_link = store.point.put_if_absent(&input.point.hash)?;

			let key = SpendTable::compose(&input.point.hash, input.point.index, point_link);
			let spend_fk = store.spend.put(&key, &SpendRecord {
				tx_fk,
				point_fk: point_link,
				point_index: input.point.index & 0xff_ffff,
				sequence: input.sequence,
			})?;

			store.ins.write_slot(
				InsLink::from_value(point_fk.value() + index as u64),
				&InsRecord { input_fk, spend_fk, sequence: input.sequence },
			)?;
		}

		let record = TxRecord {
			coinbase: tx.is_coinbase(),
			light: tx.serialized_size(false) as u32,
			heavy: tx.serialized_size(true) as u32,
			locktime: tx.locktime,
			version: tx.version,
			ins_count: tx.inputs.len() as u32,
			outs_count: tx.outputs.len() as u32,
			point_fk,
			outs_fk,
		};
		let link = store.tx.put(&hash, &record)?;
		debug_assert_eq!(link, tx_fk);
		Ok((link, false))
	}

	pub fn to_header(&self, hash: &Hash) -> Result<HeaderLink> {
		self.store().header.first(hash)
	}

	pub fn to_tx(&self, hash: &Hash) -> Result<TxLink> {
		self.store().tx.first(hash)
	}

	pub fn to_point(&self, hash: &Hash) -> Result<::link::PointLink> {
		self.store().point.first(hash)
	}

	pub fn get_context(&self, link: HeaderLink) -> Context {
		if link.is_terminal() {
			return Context::default();
		}
		self.store().header.get_context(link).unwrap_or_default()
	}

	pub fn get_height(&self, link: HeaderLink) -> Result<u64> {
		self.store().header.get_height(link).map(|height| height as u64)
	}

	pub fn get_header_hash(&self, link: HeaderLink) -> Result<Hash> {
		self.store().header.get_key(link)
	}

	pub fn get_header(&self, link: HeaderLink) -> Result<chain::Header> {
		let record = self.store().header.get(link)?;
		let previous = if record.parent_fk.is_terminal() {
			NULL_HASH
		} else {
			self.store().header.get_key(record.parent_fk)?
		};
		Ok(record.to_header(previous))
	}

	pub fn get_tx(&self, link: TxLink) -> Result<Transaction> {
		let store = self.store();
		let record = store.tx.get(link)?;

		let mut inputs = Vec::with_capacity(record.ins_count as usize);
		for index in 0..record.ins_count as u64 {
			let slot = store.ins.get(InsLink::from_value(record.point_fk.value() + index))?;
			let (script, witness) = store.input.get(slot.input_fk)?;
			let spend = store.spend.get(slot.spend_fk)?;
			let hash = store.point.get_key(spend.point_fk)?;
			inputs.push(chain::Input {
				point: chain::Point {
					index: Self::full_index(spend.point_index, &hash),
					hash,
				},
				script,
				witness,
				sequence: slot.sequence,
			});
		}

		let mut outputs = Vec::with_capacity(record.outs_count as usize);
		let out_fks = store.puts.get_range(record.outs_fk, record.outs_count as usize)?;
		for out_fk in out_fks {
			let (value, script) = store.output.get(out_fk)?;
			outputs.push(chain::Output { value, script });
		}

		Ok(Transaction {
			version: record.version,
			inputs,
			outputs,
			locktime: record.locktime,
		})
	}

	pub fn get_block(&self, link: HeaderLink) -> Result<Block> {
		let header = self.get_header(link)?;
		let tx_fks = self.store().txs.get_tx_fks(link.value())?;
		let mut transactions = Vec::with_capacity(tx_fks.len());
		for tx_fk in tx_fks {
			transactions.push(self.get_tx(tx_fk)?);
		}
		Ok(Block { header, transactions })
	}

	pub fn is_associated(&self, link: HeaderLink) -> Result<bool> {
		self.store().txs.is_associated(link.value())
	}

	pub fn get_tx_count(&self, link: HeaderLink) -> Result<u64> {
		self.store().txs.get_tx_count(link.value())
	}

	/// Append the header to the top of the candidate index.
	pub fn push_candidate(&self, link: HeaderLink) -> Result<()> {
		let height = self.store().candidate.top().map(|top| top + 1).unwrap_or(0);
		self.store().candidate.push(height, link)
	}

	/// Append the header to the top of the confirmed index,
	/// optionally marking its transactions strong.
	pub fn push_confirmed(&self, link: HeaderLink, strong: bool) -> Result<()> {
		let height = self.store().confirmed.top().map(|top| top + 1).unwrap_or(0);
		self.store().confirmed.push(height, link)?;
		if strong {
			self.set_strong(link)?;
		}
		Ok(())
	}

	pub fn pop_candidate(&self) -> Result<()> {
		self.store().candidate.pop()
	}

	pub fn pop_confirmed(&self) -> Result<()> {
		self.store().confirmed.pop()
	}

	pub fn top_candidate(&self) -> Result<u64> {
		self.store().candidate.top()
	}

	pub fn top_confirmed(&self) -> Result<u64> {
		self.store().confirmed.top()
	}

	pub fn to_candidate(&self, height: u64) -> Result<HeaderLink> {
		self.store().candidate.at(height)
	}

	pub fn to_confirmed(&self, height: u64) -> Result<HeaderLink> {
		self.store().confirmed.at(height)
	}

	/// Index every output of the block's transactions by script hash.
	pub fn set_address_output(&self, hash: &[u8; 20], out_fk: ::link::SlabLink) -> Result<()> {
		self.store().address.put(hash, out_fk).map(|_| ())
	}

	pub fn to_address_outputs(&self, hash: &[u8; 20]) -> Result<Vec<::link::SlabLink>> {
		self.store().address.outputs(hash)
	}

	pub fn set_filter_body(&self, link: HeaderLink, head: &Hash, filter: &[u8]) -> Result<()> {
		self.store().filter_bk.put(link.value(), &::schema::FilterBkRecord {
			filter_head: *head,
			filter: filter.to_vec(),
		})
	}

	pub fn get_filter_body(&self, link: HeaderLink) -> Result<Option<::schema::FilterBkRecord>> {
		self.store().filter_bk.get(link.value())
	}

	pub fn get_filter_head(&self, link: HeaderLink) -> Result<Option<Hash>> {
		self.store().filter_bk.get_head(link.value())
	}

	pub fn set_tx_filter(&self, link: TxLink, filter: &[u8]) -> Result<()> {
		self.store().filter_tx.put(link.value(), filter)
	}

	pub fn get_tx_filter(&self, link: TxLink) -> Result<Option<Vec<u8>>> {
		self.store().filter_tx.get(link.value())
	}
}
