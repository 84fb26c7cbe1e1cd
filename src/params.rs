use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Width of the leaked window forced into every faulty mask.
pub const LEAK_WINDOW_BITS: u32 = 2;
/// Width of one key chunk.
pub const SYMBOL_BITS: u32 = 2;

pub const REFERENCE_BIT_WIDTH: u32 = 256;
pub const REFERENCE_ORDER: usize = 4;
pub const REFERENCE_EXPONENT_STEP: usize = 2;
pub const REFERENCE_LEAK_BITS: u32 = 8;

pub const REFERENCE_MODULUS: &str = "65358582236399098140383852530576291366163143046961680710706395821174671515157";
pub const REFERENCE_GENERATOR: &str = "18897172015605387895108229785692294238197575884158182212205468678506383277799";

/// Which 2-bit symbol of a packed value chunk `k` carries.
///
/// The faulty scheme splits its secret low bits first while the chunk loop
/// walks forward, so with `LowFirst` chunk `k` holds bits `[2k, 2k+2)`.
/// For the packed value `0b01_00_11_10` that means the chunks consume the
/// symbols `2, 3, 0, 1`. Reconstructed keys are assembled with the same
/// order, so a key recovered from a known sample equals the sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolOrder {
	#[default]
	LowFirst,
	HighFirst,
}

impl SymbolOrder {
	/// Bit position of the symbol carried by `chunk` out of `count` chunks.
	pub fn shift(self, chunk: usize, count: usize) -> u64 {
		let slot = match self {
			SymbolOrder::LowFirst => chunk,
			SymbolOrder::HighFirst => count - 1 - chunk,
		};
		slot as u64 * SYMBOL_BITS as u64
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupParameters {
	pub modulus: BigUint,
	pub generator: BigUint,
	/// The `N` of the scheme; the window sits at `(W - 1) - (N + 1)`.
	pub leak_bits: u32,
	pub leak_window_offset: u32,
	pub total_bit_width: u32,
	pub expected_order: usize,
	pub symbol_order: SymbolOrder,
	/// Exponent advance per chunk; chunk `k` is shifted by `step * (k + 1)`.
	pub exponent_step: usize,
}

impl GroupParameters {
	pub fn new(modulus: BigUint, generator: BigUint, leak_bits: u32) -> Result<Self> {
		Self::with_bit_width(modulus, generator, leak_bits, REFERENCE_BIT_WIDTH)
	}

	pub fn with_bit_width(modulus: BigUint, generator: BigUint, leak_bits: u32, total_bit_width: u32) -> Result<Self> {
		if modulus < BigUint::from(2u8) {
			return Err(Error::InvalidParameters(format!("modulus {} is smaller than 2", modulus)));
		}
		if generator.is_zero() || generator >= modulus {
			return Err(Error::InvalidParameters("generator must lie in [1, modulus)".to_owned()));
		}
		if modulus.bits() > total_bit_width as u64 {
			return Err(Error::InvalidParameters(format!(
				"modulus needs {} bits, more than the {} bit representation", modulus.bits(), total_bit_width
			)));
		}
		let leak_window_offset = total_bit_width.checked_sub(1)
			.and_then(|top| top.checked_sub(leak_bits + 1))
			.ok_or_else(|| Error::InvalidParameters(format!(
				"leak width {} does not fit in {} bits", leak_bits, total_bit_width
			)))?;

		Ok(Self {
			modulus,
			generator,
			leak_bits,
			leak_window_offset,
			total_bit_width,
			expected_order: REFERENCE_ORDER,
			symbol_order: SymbolOrder::LowFirst,
			exponent_step: REFERENCE_EXPONENT_STEP,
		})
	}

	/// The parameters of the published weakened exchange.
	pub fn reference() -> Result<Self> {
		let modulus = crate::config::parse_integer(REFERENCE_MODULUS)?;
		let generator = crate::config::parse_integer(REFERENCE_GENERATOR)?;
		Self::new(modulus, generator, REFERENCE_LEAK_BITS)
	}

	pub fn with_expected_order(mut self, order: usize) -> Result<Self> {
		if !(2..=1 << SYMBOL_BITS).contains(&order) {
			return Err(Error::InvalidParameters(format!("order {} does not fit a {} bit symbol", order, SYMBOL_BITS)));
		}
		self.expected_order = order;
		Ok(self)
	}

	pub fn with_symbol_order(mut self, order: SymbolOrder) -> Self {
		self.symbol_order = order;
		self
	}

	pub fn with_exponent_step(mut self, step: usize) -> Self {
		self.exponent_step = step;
		self
	}

	pub fn identity(&self) -> BigUint {
		BigUint::one() % &self.modulus
	}
}
