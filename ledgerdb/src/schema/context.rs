use error::Result;
use serial::{ByteReader, ByteWriter};

/// Rule flag: BIP30 duplicate-coinbase checking applies.
pub const BIP30_RULE: u8 = 0x02;

/// Rule flag: BIP68 relative timelocks apply.
pub const BIP68_RULE: u8 = 0x04;

/// Per-block validation context: rule flags, height and median time
/// past, as computed by the consensus layer when the block is stored.
/// Eight bytes on disk: flags(1), height(3), mtp(4).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Context {
	pub flags: u8,
	pub height: u32,
	pub mtp: u32,
}

impl Context {
	pub const SIZE: usize = 8;

	pub fn new(flags: u8, height: u32, mtp: u32) -> Context {
		Context { flags, height, mtp }
	}

	pub fn is_enabled(&self, rule: u8) -> bool {
		self.flags & rule != 0
	}

	pub fn write(&self, writer: &mut ByteWriter) {
		writer.write_u8(self.flags);
		writer.write_le(self.height as u64, 3);
		writer.write_u32(self.mtp);
	}

	pub fn read(reader: &mut ByteReader) -> Result<Context> {
		Ok(Context {
			flags: reader.read_u8()?,
			height: reader.read_le(3)? as u32,
			mtp: reader.read_u32()?,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::{Context, BIP68_RULE};
	use serial::{ByteReader, ByteWriter};

	#[test]
	fn test_round_trip() {
		let ctx = Context::new(12, 34, 56);
		let mut writer = ByteWriter::new();
		ctx.write(&mut writer);
		let bytes = writer.into_vec();
		assert_eq!(bytes, [12, 34, 0, 0, 56, 0, 0, 0]);
		assert_eq!(bytes.len(), Context::SIZE);

		let decoded = Context::read(&mut ByteReader::new(&bytes)).unwrap();
		assert_eq!(decoded, ctx);
	}

	#[test]
	fn test_rules() {
		let ctx = Context::new(BIP68_RULE, 0, 0);
		assert!(ctx.is_enabled(BIP68_RULE));
		assert!(!ctx.is_enabled(super::BIP30_RULE));
	}
}
