use chain::{sha256d, Hash, NULL_HASH, NULL_INDEX};
use error::Result;
use serial::{varint_size, ByteReader, ByteWriter};

/// An outpoint: a transaction hash and an output index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Point {
	pub hash: Hash,
	pub index: u32,
}

impl Point {
	pub fn null() -> Point {
		Point { hash: NULL_HASH, index: NULL_INDEX }
	}

	pub fn is_null(&self) -> bool {
		self.index == NULL_INDEX && self.hash == NULL_HASH
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
	pub point: Point,
	pub script: Vec<u8>,
	pub witness: Vec<Vec<u8>>,
	pub sequence: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
	pub value: u64,
	pub script: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
	pub version: u32,
	pub inputs: Vec<Input>,
	pub outputs: Vec<Output>,
	pub locktime: u32,
}

impl Transaction {
	pub fn is_coinbase(&self) -> bool {
		self.inputs.len() == 1 && self.inputs[0].point.is_null()
	}

	pub fn has_witness(&self) -> bool {
		self.inputs.iter().any(|input| !input.witness.is_empty())
	}

	/// Sum of this transaction's own output values.
	pub fn value(&self) -> u64 {
		self.outputs.iter().map(|output| output.value).sum()
	}

	pub fn write(&self, writer: &mut ByteWriter, witness: bool) {
		let witness = witness && self.has_witness();

		writer.write_u32(self.version);
		if witness {
			writer.write_u8(0);
			writer.write_u8(1);
		}

		writer.write_varint(self.inputs.len() as u64);
		for input in &self.inputs {
			writer.write_bytes(&input.point.hash);
			writer.write_u32(input.point.index);
			writer.write_varint(input.script.len() as u64);
			writer.write_bytes(&input.script);
			writer.write_u32(input.sequence);
		}

		writer.write_varint(self.outputs.len() as u64);
		for output in &self.outputs {
			writer.write_u64(output.value);
			writer.write_varint(output.script.len() as u64);
			writer.write_bytes(&output.script);
		}

		if witness {
			for input in &self.inputs {
				writer.write_varint(input.witness.len() as u64);
				for item in &input.witness {
					writer.write_varint(item.len() as u64);
					writer.write_bytes(item);
				}
			}
		}

		writer.write_u32(self.locktime);
	}

	pub fn read(reader: &mut ByteReader) -> Result<Transaction> {
		let version = reader.read_u32()?;

		// Segwit marker: a zero input count followed by the flag byte.
		let mut witness_flag = false;
		let mut input_count = reader.read_varint()?;
		if input_count == 0 {
			let flag = reader.read_u8()?;
			witness_flag = flag != 0;
			input_count = reader.read_varint()?;
		}

		let mut inputs = Vec::with_capacity(input_count as usize);
		for _ in 0..input_count {
			let hash = reader.read_hash()?;
			let index = reader.read_u32()?;
			let script_len = reader.read_varint()? as usize;
			let script = reader.read_bytes(script_len)?.to_vec();
			let sequence = reader.read_u32()?;
			inputs.push(Input {
				point: Point { hash, index },
				script,
				witness: Vec::new(),
				sequence,
			});
		}

		let output_count = reader.read_varint()?;
		let mut outputs = Vec::with_capacity(output_count as usize);
		for _ in 0..output_count {
			let value = reader.read_u64()?;
			let script_len = reader.read_varint()? as usize;
			let script = reader.read_bytes(script_len)?.to_vec();
			outputs.push(Output { value, script });
		}

		if witness_flag {
			for input in &mut inputs {
				let items = reader.read_varint()?;
				for _ in 0..items {
					let len = reader.read_varint()? as usize;
					input.witness.push(reader.read_bytes(len)?.to_vec());
				}
			}
		}

		let locktime = reader.read_u32()?;
		Ok(Transaction { version, inputs, outputs, locktime })
	}

	pub fn to_bytes(&self, witness: bool) -> Vec<u8> {
		let mut writer = ByteWriter::with_capacity(self.serialized_size(witness));
		self.write(&mut writer, witness);
		writer.into_vec()
	}

	/// The witness-stripped hash identifying the transaction.
	pub fn hash(&self) -> Hash {
		sha256d(&self.to_bytes(false))
	}

	pub fn serialized_size(&self, witness: bool) -> usize {
		let witness = witness && self.has_witness();
		let mut size = 4 + 4 + varint_size(self.inputs.len() as u64)
			+ varint_size(self.outputs.len() as u64);

		if witness {
			size += 2;
		}

		for input in &self.inputs {
			size += 32 + 4 + varint_size(input.script.len() as u64) + input.script.len() + 4;
			if witness {
				size += varint_size(input.witness.len() as u64);
				size += input.witness.iter()
					.map(|item| varint_size(item.len() as u64) + item.len())
					.sum::<usize>();
			}
		}

		for output in &self.outputs {
			size += 8 + varint_size(output.script.len() as u64) + output.script.len();
		}

		size
	}

	/// `ceil(weight / 4)` with weight `3 * base + total`.
	pub fn virtual_size(&self) -> usize {
		let base = self.serialized_size(false);
		let total = self.serialized_size(true);
		(3 * base + total + 3) / 4
	}
}
