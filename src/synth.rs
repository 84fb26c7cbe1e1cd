//! Produces ciphertext chunks the way the faulty key exchange does, for a
//! chosen exponent residue and leaked window.

use num_bigint::{BigUint, RandBigInt};
use rand::Rng;

use crate::bits;
use crate::error::Result;
use crate::params::{GroupParameters, LEAK_WINDOW_BITS};
use crate::subgroup::SubgroupTable;

pub struct FaultyEncoder<'a> {
	params: &'a GroupParameters,
	table: &'a SubgroupTable,
	pub exponent_residue: usize,
	pub fixed_bits: u8,
}

impl<'a> FaultyEncoder<'a> {
	pub fn new(params: &'a GroupParameters, table: &'a SubgroupTable, exponent_residue: usize, fixed_bits: u8) -> Self {
		Self {
			params,
			table,
			exponent_residue: exponent_residue % table.order(),
			fixed_bits: fixed_bits & ((1 << LEAK_WINDOW_BITS) - 1),
		}
	}

	/// A uniformly random mask with the leak window forced.
	pub fn mask<R: Rng + ?Sized>(&self, rng: &mut R) -> BigUint {
		let mut mask = rng.gen_biguint(self.params.total_bit_width as u64);
		for bit in 0..LEAK_WINDOW_BITS {
			let position = (self.params.leak_window_offset + bit) as u64;
			mask.set_bit(position, (self.fixed_bits >> bit) & 1 == 1);
		}
		mask
	}

	pub fn encode<R: Rng + ?Sized>(&self, symbols: &[u8], rng: &mut R) -> Vec<BigUint> {
		symbols.iter().enumerate()
			.map(|(chunk, &symbol)| {
				let index = self.table.chunk_index(self.exponent_residue, symbol, chunk, self.params.exponent_step);
				self.mask(rng) ^ self.table.get(index)
			})
			.collect()
	}

	pub fn encode_value<R: Rng + ?Sized>(&self, value: &BigUint, count: usize, rng: &mut R) -> Result<Vec<BigUint>> {
		let symbols = bits::symbols(value, count, self.params.symbol_order)?;
		Ok(self.encode(&symbols, rng))
	}
}

/// A 256-bit prime group of order 4 whose table windows are `[0, 1, 2, 1]`.
/// No residue shift maps its windows onto each other, so a full calibration
/// sample pins down a single solution.
#[cfg(test)]
pub(crate) fn twin_free_parameters() -> GroupParameters {
	let modulus = BigUint::parse_bytes(b"106120685253266813644376167414603136550518703637353323082256951950028664619221", 10).unwrap();
	let generator = BigUint::parse_bytes(b"104620779410972792430552619168109938974319044207165306434355059160788514990917", 10).unwrap();
	GroupParameters::new(modulus, generator, 8).unwrap()
}
