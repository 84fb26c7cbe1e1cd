use num_bigint::BigUint;
use num_traits::Zero;

use crate::error::{Error, Result};
use crate::params::{SymbolOrder, LEAK_WINDOW_BITS, SYMBOL_BITS};

/// The leaked window of `value`: `(value >> offset) & 0b11`.
pub fn fixed_bits(value: &BigUint, offset: u32) -> u8 {
	read_bits(value, offset as u64, LEAK_WINDOW_BITS)
}

fn read_bits(value: &BigUint, from: u64, width: u32) -> u8 {
	(0..width).fold(0u8, |acc, bit| acc | (value.bit(from + bit as u64) as u8) << bit)
}

/// Splits `value` into `count` symbols in chunk order.
pub fn symbols(value: &BigUint, count: usize, order: SymbolOrder) -> Result<Vec<u8>> {
	if value.bits() > count as u64 * SYMBOL_BITS as u64 {
		return Err(Error::InvalidSample(format!(
			"{} does not fit in {} symbols of {} bits", value, count, SYMBOL_BITS
		)));
	}
	Ok((0..count).map(|chunk| read_bits(value, order.shift(chunk, count), SYMBOL_BITS)).collect())
}

/// Inverse of [`symbols`].
pub fn assemble(chunks: &[u8], order: SymbolOrder) -> BigUint {
	let count = chunks.len();
	chunks.iter().enumerate().fold(BigUint::zero(), |acc, (chunk, &symbol)| {
		acc | BigUint::from(symbol) << order.shift(chunk, count)
	})
}
