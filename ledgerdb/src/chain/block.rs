use chain::{Hash, Header, Transaction};
use error::Result;
use serial::{varint_size, ByteReader, ByteWriter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
	pub header: Header,
	pub transactions: Vec<Transaction>,
}

impl Block {
	pub fn hash(&self) -> Hash {
		self.header.hash()
	}

	pub fn coinbase(&self) -> Option<&Transaction> {
		self.transactions.first()
	}

	pub fn write(&self, writer: &mut ByteWriter, witness: bool) {
		self.header.write(writer);
		writer.write_varint(self.transactions.len() as u64);
		for tx in &self.transactions {
			tx.write(writer, witness);
		}
	}

	pub fn read(reader: &mut ByteReader) -> Result<Block> {
		let header = Header::read(reader)?;
		let count = reader.read_varint()?;
		let mut transactions = Vec::with_capacity(count as usize);
		for _ in 0..count {
			transactions.push(Transaction::read(reader)?);
		}
		Ok(Block { header, transactions })
	}

	/// Decode a raw network-serialized block.
	pub fn from_bytes(bytes: &[u8]) -> Result<Block> {
		Block::read(&mut ByteReader::new(bytes))
	}

	pub fn serialized_size(&self, witness: bool) -> usize {
		80 + varint_size(self.transactions.len() as u64)
			+ self.transactions.iter()
				.map(|tx| tx.serialized_size(witness))
				.sum::<usize>()
	}

	pub fn virtual_size(&self) -> usize {
		let base = self.serialized_size(false);
		let total = self.serialized_size(true);
		(3 * base + total + 3) / 4
	}
}
