use log::debug;
use num_bigint::BigUint;
use num_traits::One;

use crate::error::{Error, Result};
use crate::params::GroupParameters;

/// `[g^0, g^1, ..., g^(order-1)] mod p`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubgroupTable {
	powers: Vec<BigUint>,
}

impl SubgroupTable {
	/// Walks the powers of the generator until they return to 1.
	///
	/// The walk is cut off at the expected order: a generator that has not
	/// cycled by then does not belong to the weakened scheme.
	pub fn enumerate(params: &GroupParameters) -> Result<Self> {
		let mut powers = vec![params.identity()];
		let mut current = &params.generator % &params.modulus;
		while !current.is_one() {
			if powers.len() >= params.expected_order {
				return Err(Error::UnexpectedOrder { expected: params.expected_order, found: None });
			}
			let next = (&current * &params.generator) % &params.modulus;
			powers.push(current);
			current = next;
		}

		if powers.len() != params.expected_order {
			return Err(Error::UnexpectedOrder { expected: params.expected_order, found: Some(powers.len()) });
		}
		debug!("generator cycles with order {}", powers.len());
		Ok(Self { powers })
	}

	pub fn order(&self) -> usize {
		self.powers.len()
	}

	pub fn powers(&self) -> &[BigUint] {
		&self.powers
	}

	pub fn get(&self, index: usize) -> &BigUint {
		&self.powers[index % self.order()]
	}

	/// Table index whose power masks chunk `chunk` carrying `symbol` when the
	/// secret exponent is `residue` modulo the order.
	pub fn chunk_index(&self, residue: usize, symbol: u8, chunk: usize, step: usize) -> usize {
		let order = self.order();
		(residue + symbol as usize + advance(step, chunk, order)) % order
	}

	/// Inverse of [`chunk_index`](Self::chunk_index): the symbol a chunk
	/// carries given the table index that cancelled its mask.
	pub fn chunk_symbol(&self, index: usize, residue: usize, chunk: usize, step: usize) -> u8 {
		let order = self.order();
		let offset = (residue + advance(step, chunk, order)) % order;
		((index % order + order - offset) % order) as u8
	}
}

fn advance(step: usize, chunk: usize, order: usize) -> usize {
	(step % order) * ((chunk + 1) % order) % order
}
