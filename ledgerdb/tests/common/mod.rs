#![allow(dead_code)]

use ledgerdb::chain::{Block, Hash, Header, Input, Output, Point, Transaction};
use ledgerdb::{Options, Store};

use std::path::Path;

pub fn hex(s: &str) -> Vec<u8> {
	assert!(s.len() % 2 == 0);
	(0..s.len() / 2)
		.map(|i| u8::from_str_radix(&s[2 * i..2 * i + 2], 16).unwrap())
		.collect()
}

/// Decode a display-order (reversed) hash string.
pub fn rhash(s: &str) -> Hash {
	let bytes = hex(s);
	assert_eq!(bytes.len(), 32);
	let mut hash = [0u8; 32];
	for (i, byte) in bytes.iter().rev().enumerate() {
		hash[i] = *byte;
	}
	hash
}

pub fn hash_n(n: u8) -> Hash {
	let mut hash = [0u8; 32];
	hash[0] = n;
	hash
}

pub fn create_store<P: AsRef<Path>>(dir: P, options: Options) -> Store {
	Store::create(dir, options).unwrap()
}

// Script opcodes used by the synthetic blocks.
pub const OP_RETURN: u8 = 0x6a;
pub const OP_PICK: u8 = 0x79;
pub const OP_ROLL: u8 = 0x7a;
pub const OP_SIZE: u8 = 0x82;
pub const OP_CHECKMULTISIG: u8 = 0xae;

// blockchain.info/rawblock/[block-hash]?format=hex
pub const GENESIS_DATA: &'static str = "0100000000000000000000000000000000000000000000000000000000000000000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a29ab5f49ffff001d1dac2b7c0101000000010000000000000000000000000000000000000000000000000000000000000000ffffffff4d04ffff001d0104455468652054696d65732030332f4a616e2f32303039204368616e63656c6c6f72206f6e206272696e6b206f66207365636f6e64206261696c6f757420666f722062616e6b73ffffffff0100f2052a01000000434104678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5fac00000000";
pub const BLOCK1_DATA: &'static str = "010000006fe28c0ab6f1b372c1a6a246ae63f74f931e8365e15a089c68d6190000000000982051fd1e4ba744bbbe680e1fee14677ba1a3c3540bf7b1cdb606e857233e0e61bc6649ffff001d01e362990101000000010000000000000000000000000000000000000000000000000000000000000000ffffffff0704ffff001d0104ffffffff0100f2052a0100000043410496b538e853519c726a2c91e61ec11600ae1390813a627c66fb8be7947be63c52da7589379515d4e0a604f8141781e62294721166bf621e73a82cbf2342c858eeac00000000";
pub const BLOCK2_DATA: &'static str = "010000004860eb18bf1b1620e37e9490fc8a427514416fd75159ab86688e9a8300000000d5fdcc541e25de1c7a5addedf24858b8bb665c9f36ef744ee42c316022c90f9bb0bc6649ffff001d08d2bd610101000000010000000000000000000000000000000000000000000000000000000000000000ffffffff0704ffff001d010bffffffff0100f2052a010000004341047211a824f55b505228e4c3d5194c1fcfaa15a456abdf37f9b9d97a4040afc073dee6c89064984f03385237d92167c13e236446b417ab79a0fcae412ae3316b77ac00000000";
pub const BLOCK3_DATA: &'static str = "01000000bddd99ccfda39da1b108ce1a5d70038d0a967bacb68b6b63065f626a0000000044f672226090d85db9a9f2fbfe5f0f9609b387af7be5b7fbb7a1767c831c9e995dbe6649ffff001d05e0ed6d0101000000010000000000000000000000000000000000000000000000000000000000000000ffffffff0704ffff001d010effffffff0100f2052a0100000043410494b9d3e76c5b1629ecf97fff95d7a4bbdac87cc26099ada28066c6ff1eb9191223cd897194a08d0c2726c5747f1db49e8cf90e75dc3e3550ae9b30086f3cd5aaac00000000";
pub const BLOCK4_DATA: &'static str = "010000004944469562ae1c2c74d9a535e00b6f3e40ffbad4f2fda3895501b582000000007a06ea98cd40ba2e3288262b28638cec5337c1456aaf5eedc8e9e5a20f062bdf8cc16649ffff001d2bfee0a90101000000010000000000000000000000000000000000000000000000000000000000000000ffffffff0704ffff001d011affffffff0100f2052a01000000434104184f32b212815c6e522e66686324030ff7e5bf08efb21f8b00614fb7690e19131dd31304c54f37baa40db231c918106bb9fd43373e37ae31a0befc6ecaefb867ac00000000";
pub const BLOCK5_DATA: &'static str = "0100000085144a84488ea88d221c8bd6c059da090e88f8a2c99690ee55dbba4e00000000e11c48fecdd9e72510ca84f023370c9a38bf91ac5cae88019bee94d24528526344c36649ffff001d1d03e4770101000000010000000000000000000000000000000000000000000000000000000000000000ffffffff0704ffff001d0120ffffffff0100f2052a0100000043410456579536d150fbce94ee62b47db2ca43af0a730a0467ba55c79e2a7ec9ce4ad297e35cdbb8e42a4643a60eef7c9abee2f5822f86b1da242d9c2301c431facfd8ac00000000";
pub const BLOCK6_DATA: &'static str = "01000000fc33f596f822a0a1951ffdbf2a897b095636ad871707bf5d3162729b00000000379dfb96a5ea8c81700ea4ac6b97ae9a9312b2d4301a29580e924ee6761a2520adc46649ffff001d189c4c970101000000010000000000000000000000000000000000000000000000000000000000000000ffffffff0704ffff001d0123ffffffff0100f2052a0100000043410408ce279174b34c077c7b2043e3f3d45a588b85ef4ca466740f848ead7fb498f0a795c982552fdfa41616a7c0333a269d62108588e260fd5a48ac8e4dbf49e2bcac00000000";
pub const BLOCK7_DATA: &'static str = "010000008d778fdc15a2d3fb76b7122a3b5582bea4f21f5a0c693537e7a03130000000003f674005103b42f984169c7d008370967e91920a6a5d64fd51282f75bc73a68af1c66649ffff001d39a59c860101000000010000000000000000000000000000000000000000000000000000000000000000ffffffff0704ffff001d012bffffffff0100f2052a01000000434104a59e64c774923d003fae7491b2a7f75d6b7aa3f35606a8ff1cf06cd3317d16a41aa16928b1df1f631f31f28c7da35d4edad3603adb2338c4d4dd268f31530555ac00000000";
pub const BLOCK8_DATA: &'static str = "010000004494c8cf4154bdcc0720cd4a59d9c9b285e4b146d45f061d2b6c967100000000e3855ed886605b6d4a99d5fa2ef2e9b0b164e63df3c4136bebf2d0dac0f1f7a667c86649ffff001d1c4b56660101000000010000000000000000000000000000000000000000000000000000000000000000ffffffff0704ffff001d012cffffffff0100f2052a01000000434104cc8d85f5e7933cb18f13b97d165e1189c1fb3e9c98b0dd5446b2a1989883ff9e740a8a75da99cc59a21016caf7a7afd3e4e9e7952983e18d1ff70529d62e0ba1ac00000000";

pub const BLOCK0_HASH: &'static str =
	"000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f";
pub const BLOCK1_HASH: &'static str =
	"00000000839a8e6886ab5951d76f411475428afc90947ee320161bbf18eb6048";
pub const BLOCK2_HASH: &'static str =
	"000000006a625f06636b8bb6ac7b960a8d03705d1ace08b1a19da3fdcc99ddbd";
pub const BLOCK3_HASH: &'static str =
	"0000000082b5015589a3fdf2d4baff403e6f0be035a5d9742c1cae6295464449";
pub const BLOCK4_HASH: &'static str =
	"000000004ebadb55ee9096c9a2f8880e09da59c0d68b1c228da88e48844a1485";
pub const BLOCK5_HASH: &'static str =
	"000000009b7262315dbf071787ad3656097b892abffd1f95a1a022f896f533fc";
pub const BLOCK6_HASH: &'static str =
	"000000003031a0e73735690c5a1ff2a4be82553b2a12b776fbd3a215dc8f778d";
pub const BLOCK7_HASH: &'static str =
	"0000000071966c2b1d065fd446b1e485b2c9d9594acd2007ccbd5441cfc89444";
pub const BLOCK8_HASH: &'static str =
	"00000000408c48f847aa786c2268fc3e6ec2af68e8468a34a28c61b7f1de0dc6";

pub fn decode_block(data: &str) -> Block {
	Block::from_bytes(&hex(data)).unwrap()
}

pub fn genesis() -> Block {
	decode_block(GENESIS_DATA)
}

pub fn mainnet_block(height: usize) -> Block {
	let data = [
		GENESIS_DATA, BLOCK1_DATA, BLOCK2_DATA, BLOCK3_DATA, BLOCK4_DATA,
		BLOCK5_DATA, BLOCK6_DATA, BLOCK7_DATA, BLOCK8_DATA,
	];
	decode_block(data[height])
}

pub fn mainnet_hash(height: usize) -> Hash {
	let display = [
		BLOCK0_HASH, BLOCK1_HASH, BLOCK2_HASH, BLOCK3_HASH, BLOCK4_HASH,
		BLOCK5_HASH, BLOCK6_HASH, BLOCK7_HASH, BLOCK8_HASH,
	];
	rhash(display[height])
}

fn test_header(previous: Hash, merkle_root: Hash) -> Header {
	Header {
		version: 0x3132_3334,
		previous,
		merkle_root,
		timestamp: 0x4142_4344,
		bits: 0x5152_5354,
		nonce: 0x6162_6364,
	}
}

fn input(hash: Hash, index: u32, script: Vec<u8>, witness: Vec<Vec<u8>>, sequence: u32) -> Input {
	Input { point: Point { hash, index }, script, witness, sequence }
}

fn output(value: u64, script: Vec<u8>) -> Output {
	Output { value, script }
}

/// Coinbase paying two 0xb1 outputs.
pub fn block1b() -> Block {
	Block {
		header: test_header(genesis().hash(), [0u8; 32]),
		transactions: vec![Transaction {
			version: 0xb1,
			inputs: vec![input(
				[0u8; 32], 0xffff_ffff,
				vec![OP_CHECKMULTISIG, OP_SIZE], Vec::new(), 0xb1,
			)],
			outputs: vec![output(0xb1, vec![OP_PICK]), output(0xb1, vec![OP_PICK])],
			locktime: 0xb1,
		}],
	}
}

/// Spends block1b's coinbase output zero.
pub fn tx2b() -> Transaction {
	Transaction {
		version: 0xb1,
		inputs: vec![input(
			block1b().transactions[0].hash(), 0,
			vec![OP_CHECKMULTISIG, OP_SIZE], Vec::new(), 0xb1,
		)],
		outputs: vec![output(0xb1, vec![OP_PICK])],
		locktime: 0xb1,
	}
}

/// tx2b, an internal spend of tx2b:0, and a spend of both coinbase
/// outputs; total fees 0xb1.
pub fn block_valid_spend_internal_2b() -> Block {
	let coinbase_hash = block1b().transactions[0].hash();
	Block {
		header: test_header(block1b().hash(), hash_n(1)),
		transactions: vec![
			tx2b(),
			Transaction {
				version: 0xb2,
				inputs: vec![input(
					tx2b().hash(), 0,
					vec![OP_CHECKMULTISIG, OP_SIZE], Vec::new(), 0xb2,
				)],
				// fee will be 0x01
				outputs: vec![output(0xb0, vec![OP_PICK])],
				locktime: 0xb2,
			},
			Transaction {
				version: 0xb2,
				inputs: vec![
					input(coinbase_hash, 0, vec![OP_CHECKMULTISIG, OP_SIZE], Vec::new(), 0xb2),
					input(coinbase_hash, 1, vec![OP_CHECKMULTISIG], Vec::new(), 0xb2),
				],
				// fee will be 0xb1 + 0xb1 - 0xb2 = 0xb0
				outputs: vec![output(0xb2, vec![OP_PICK, OP_ROLL, OP_PICK])],
				locktime: 0xb2,
			},
		],
	}
}

/// tx2b plus a spend of the missing prevout index tx2b:1.
pub fn block_missing_prevout_2b() -> Block {
	Block {
		header: test_header(block1b().hash(), hash_n(1)),
		transactions: vec![
			tx2b(),
			Transaction {
				version: 0xb2,
				inputs: vec![input(
					tx2b().hash(), 1,
					vec![OP_CHECKMULTISIG, OP_SIZE], Vec::new(), 0xb2,
				)],
				outputs: vec![output(0xb0, vec![OP_PICK])],
				locktime: 0xb2,
			},
		],
	}
}

/// A competing branch block spending block1b's coinbase output zero.
pub fn block_spend_1b() -> Block {
	Block {
		header: test_header(block1b().hash(), hash_n(2)),
		transactions: vec![Transaction {
			version: 0xa5,
			inputs: vec![input(
				block1b().transactions[0].hash(), 0,
				vec![OP_CHECKMULTISIG, OP_PICK], Vec::new(), 0xa5,
			)],
			outputs: vec![output(0x85, vec![OP_PICK])],
			locktime: 0x85,
		}],
	}
}

/// A sibling of block1b carrying an identical coinbase.
pub fn block1b_duplicate() -> Block {
	Block {
		header: test_header(genesis().hash(), hash_n(2)),
		transactions: block1b().transactions,
	}
}

/// Non-coinbase transaction with witnesses and missing prevouts.
pub fn block1a() -> Block {
	Block {
		header: test_header(genesis().hash(), [0u8; 32]),
		transactions: vec![Transaction {
			version: 0x2a,
			inputs: vec![
				input(hash_n(1), 0x18, vec![OP_RETURN, OP_PICK], vec![vec![0x24, 0x24, 0x24]], 0x2a),
				input(hash_n(1), 0x2a, vec![OP_RETURN, OP_ROLL], vec![vec![0x31, 0x31, 0x31]], 0x18),
				input(hash_n(2), 0x2b, vec![OP_RETURN, OP_ROLL], vec![vec![0x42, 0x42, 0x42]], 0x19),
			],
			outputs: vec![output(0x18, vec![OP_PICK]), output(0x2a, vec![OP_ROLL])],
			locktime: 0x18,
		}],
	}
}

/// Spends block1a's outputs plus two missing prevouts.
pub fn block2a() -> Block {
	let tx1a_hash = block1a().transactions[0].hash();
	Block {
		header: test_header(block1a().hash(), hash_n(1)),
		transactions: vec![
			Transaction {
				version: 0xa2,
				inputs: vec![
					input(tx1a_hash, 0, vec![OP_CHECKMULTISIG, OP_PICK], vec![vec![0x24, 0x24, 0x24]], 0xa2),
					input(tx1a_hash, 1, vec![OP_CHECKMULTISIG, OP_ROLL], vec![vec![0x31, 0x31, 0x31]], 0x81),
				],
				outputs: vec![output(0x81, vec![OP_PICK])],
				locktime: 0x81,
			},
			Transaction {
				version: 0xa2,
				inputs: vec![
					input(hash_n(1), 0x20, vec![OP_CHECKMULTISIG, OP_PICK], vec![vec![0x24, 0x24, 0x24]], 0xa2),
					input(hash_n(1), 0x21, vec![OP_CHECKMULTISIG, OP_ROLL], vec![vec![0x31, 0x31, 0x31]], 0x81),
				],
				outputs: vec![output(0x81, vec![OP_PICK])],
				locktime: 0x81,
			},
		],
	}
}
