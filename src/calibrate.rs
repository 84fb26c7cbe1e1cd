use log::{debug, warn};
use num_bigint::BigUint;

use crate::bits;
use crate::error::{Error, Result};
use crate::params::GroupParameters;
use crate::subgroup::SubgroupTable;

/// A known plaintext with the ciphertext chunks it was encrypted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationSample {
	pub known_plaintext: BigUint,
	pub known_ciphertexts: Vec<BigUint>,
}

/// The secret exponent modulo the subgroup order, with the window value
/// left behind once the generator power is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OracleSolution {
	pub exponent_residue: usize,
	pub fixed_bits: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calibration {
	pub solutions: Vec<OracleSolution>,
	/// Fewer known chunks than the subgroup order: spurious survivors are likely.
	pub weak: bool,
}

/// Tries every exponent residue and keeps those for which all known chunks
/// agree on the leaked window.
///
/// For residue `i`, known chunk `j` carrying symbol `s_j` was masked with
/// `g^(i + s_j + step*(j+1))`. XOR-ing that power back out leaves the faulty
/// mask, whose window is the same for every chunk. With the reference sample
/// `0b01_00_11_10` the index reduces to `(i - j) mod 4`.
///
/// Every consistent residue is returned; choosing between them is left to the
/// caller.
pub fn calibrate(params: &GroupParameters, table: &SubgroupTable, sample: &CalibrationSample) -> Result<Calibration> {
	let known = &sample.known_ciphertexts;
	if known.is_empty() {
		return Err(Error::EmptyCalibration);
	}
	let symbols = bits::symbols(&sample.known_plaintext, known.len(), params.symbol_order)?;

	let weak = known.len() < table.order();
	if weak {
		warn!(
			"only {} known chunks for a subgroup of order {}, calibration may keep spurious residues",
			known.len(), table.order()
		);
	}

	let solutions: Vec<_> = (0..table.order())
		.filter_map(|residue| {
			consistent_window(params, table, residue, &symbols, known)
				.map(|fixed_bits| OracleSolution { exponent_residue: residue, fixed_bits })
		})
		.collect();

	debug!("calibration solutions: {:?}", solutions);
	if solutions.is_empty() {
		warn!("no exponent residue is consistent with the known plaintext");
	} else if solutions.len() > 1 {
		warn!("{} exponent residues are consistent with the known plaintext", solutions.len());
	}

	Ok(Calibration { solutions, weak })
}

fn consistent_window(
	params: &GroupParameters,
	table: &SubgroupTable,
	residue: usize,
	symbols: &[u8],
	known: &[BigUint],
) -> Option<u8> {
	let mut found = None;
	for (chunk, (ciphertext, &symbol)) in known.iter().zip(symbols).enumerate() {
		let index = table.chunk_index(residue, symbol, chunk, params.exponent_step);
		let window = bits::fixed_bits(&(ciphertext ^ table.get(index)), params.leak_window_offset);
		match found {
			None => found = Some(window),
			Some(fixed) if fixed != window => return None,
			Some(_) => {}
		}
	}
	found
}

#[cfg(test)]
mod tests {
	use rand::rngs::StdRng;
	use rand::SeedableRng;

	use super::*;
	use crate::synth::{twin_free_parameters, FaultyEncoder};

	const KNOWN: u8 = 0b01_00_11_10;

	fn sample(params: &GroupParameters, table: &SubgroupTable, residue: usize, fixed: u8, rng: &mut StdRng) -> CalibrationSample {
		let encoder = FaultyEncoder::new(params, table, residue, fixed);
		let known_plaintext = BigUint::from(KNOWN);
		let known_ciphertexts = encoder.encode_value(&known_plaintext, 4, rng).unwrap();
		CalibrationSample { known_plaintext, known_ciphertexts }
	}

	#[test]
	fn reference_sample_uses_plain_rotation() {
		let params = GroupParameters::reference().unwrap();
		let table = SubgroupTable::enumerate(&params).unwrap();
		let symbols = bits::symbols(&BigUint::from(KNOWN), 4, params.symbol_order).unwrap();
		for residue in 0..4 {
			for (chunk, &symbol) in symbols.iter().enumerate() {
				assert_eq!((residue + 4 - chunk) % 4, table.chunk_index(residue, symbol, chunk, 2));
			}
		}
	}

	#[test]
	fn recovers_sole_solution() {
		let params = twin_free_parameters();
		let table = SubgroupTable::enumerate(&params).unwrap();
		let mut rng = StdRng::seed_from_u64(3);
		for residue in 0..4 {
			for fixed in 0..4 {
				let calibration = calibrate(&params, &table, &sample(&params, &table, residue, fixed, &mut rng)).unwrap();
				assert!(!calibration.weak);
				assert_eq!(vec![OracleSolution { exponent_residue: residue, fixed_bits: fixed }], calibration.solutions);
			}
		}
	}

	#[test]
	fn reference_group_has_twin() {
		// The four windows of the reference table are pairwise distinct, so
		// shifting the residue by two flips the window by a constant.
		let params = GroupParameters::reference().unwrap();
		let table = SubgroupTable::enumerate(&params).unwrap();
		let mut rng = StdRng::seed_from_u64(4);
		for residue in 0..4 {
			for fixed in 0..4 {
				let calibration = calibrate(&params, &table, &sample(&params, &table, residue, fixed, &mut rng)).unwrap();
				let twin = OracleSolution { exponent_residue: (residue + 2) % 4, fixed_bits: fixed ^ 1 };
				assert_eq!(2, calibration.solutions.len());
				assert!(calibration.solutions.contains(&OracleSolution { exponent_residue: residue, fixed_bits: fixed }));
				assert!(calibration.solutions.contains(&twin));
			}
		}
	}

	#[test]
	fn single_chunk_keeps_every_residue() {
		let params = twin_free_parameters();
		let table = SubgroupTable::enumerate(&params).unwrap();
		let mut rng = StdRng::seed_from_u64(5);
		let mut sample = sample(&params, &table, 1, 2, &mut rng);
		sample.known_ciphertexts.truncate(1);
		sample.known_plaintext = BigUint::from(KNOWN & 0b11);

		let calibration = calibrate(&params, &table, &sample).unwrap();
		assert!(calibration.weak);
		assert_eq!(4, calibration.solutions.len());
		assert!(calibration.solutions.contains(&OracleSolution { exponent_residue: 1, fixed_bits: 2 }));
	}

	#[test]
	fn swapped_chunks_lose_true_residue() {
		let params = twin_free_parameters();
		let table = SubgroupTable::enumerate(&params).unwrap();
		let mut rng = StdRng::seed_from_u64(6);
		let mut sample = sample(&params, &table, 0, 0, &mut rng);
		sample.known_ciphertexts.swap(0, 1);
		let calibration = calibrate(&params, &table, &sample).unwrap();
		assert!(!calibration.solutions.contains(&OracleSolution { exponent_residue: 0, fixed_bits: 0 }));
	}

	#[test]
	fn rejects_malformed_samples() {
		let params = GroupParameters::reference().unwrap();
		let table = SubgroupTable::enumerate(&params).unwrap();
		let empty = CalibrationSample { known_plaintext: BigUint::from(KNOWN), known_ciphertexts: vec![] };
		assert!(matches!(calibrate(&params, &table, &empty), Err(Error::EmptyCalibration)));

		let too_wide = CalibrationSample { known_plaintext: BigUint::from(KNOWN), known_ciphertexts: vec![BigUint::from(1u8)] };
		assert!(matches!(calibrate(&params, &table, &too_wide), Err(Error::InvalidSample(_))));
	}
}
