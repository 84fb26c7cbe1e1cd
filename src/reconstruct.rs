use log::warn;
use num_bigint::BigUint;
use rayon::prelude::*;

use crate::bits;
use crate::calibrate::OracleSolution;
use crate::error::{Error, Result};
use crate::params::{GroupParameters, SymbolOrder};
use crate::subgroup::SubgroupTable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkOutcome {
	Recovered(u8),
	/// Several table entries cancelled the mask; every symbol they imply.
	Ambiguous(Vec<u8>),
	Missing,
}

/// The chunks of one key hypothesis, in chunk order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconstruction {
	pub solution: OracleSolution,
	pub symbol_order: SymbolOrder,
	pub chunks: Vec<ChunkOutcome>,
}

impl Reconstruction {
	pub fn is_complete(&self) -> bool {
		self.chunks.iter().all(|chunk| matches!(chunk, ChunkOutcome::Recovered(_)))
	}

	/// Chunks that were not recovered, with their position.
	pub fn problems(&self) -> impl Iterator<Item = (usize, &ChunkOutcome)> + '_ {
		self.chunks.iter().enumerate().filter(|(_, chunk)| !matches!(chunk, ChunkOutcome::Recovered(_)))
	}

	/// Folds the chunks into a key, if every chunk was recovered.
	pub fn key_candidate(&self) -> Option<BigUint> {
		let symbols = self.chunks.iter()
			.map(|chunk| match chunk {
				ChunkOutcome::Recovered(symbol) => Some(*symbol),
				_ => None,
			})
			.collect::<Option<Vec<u8>>>()?;
		Some(bits::assemble(&symbols, self.symbol_order))
	}
}

/// Recovers every target chunk under one calibrated solution.
pub fn reconstruct(
	params: &GroupParameters,
	table: &SubgroupTable,
	solution: OracleSolution,
	targets: &[BigUint],
) -> Result<Reconstruction> {
	if targets.is_empty() {
		return Err(Error::EmptyTargets);
	}

	let chunks: Vec<ChunkOutcome> = targets.par_iter()
		.enumerate()
		.map(|(chunk, ciphertext)| recover_chunk(params, table, solution, chunk, ciphertext))
		.collect();

	let reconstruction = Reconstruction { solution, symbol_order: params.symbol_order, chunks };
	for (chunk, outcome) in reconstruction.problems() {
		match outcome {
			ChunkOutcome::Ambiguous(symbols) => warn!("{:?}: chunk {} is ambiguous between {:?}", solution, chunk, symbols),
			_ => warn!("{:?}: chunk {} has no matching power", solution, chunk),
		}
	}
	Ok(reconstruction)
}

pub fn reconstruct_all(
	params: &GroupParameters,
	table: &SubgroupTable,
	solutions: &[OracleSolution],
	targets: &[BigUint],
) -> Result<Vec<Reconstruction>> {
	solutions.iter()
		.map(|&solution| reconstruct(params, table, solution, targets))
		.collect()
}

fn recover_chunk(
	params: &GroupParameters,
	table: &SubgroupTable,
	solution: OracleSolution,
	chunk: usize,
	ciphertext: &BigUint,
) -> ChunkOutcome {
	let mut symbols: Vec<u8> = table.powers().iter()
		.enumerate()
		.filter(|(_, power)| bits::fixed_bits(&(ciphertext ^ *power), params.leak_window_offset) == solution.fixed_bits)
		.map(|(index, _)| table.chunk_symbol(index, solution.exponent_residue, chunk, params.exponent_step))
		.collect();
	symbols.sort_unstable();
	symbols.dedup();

	match symbols.len() {
		0 => ChunkOutcome::Missing,
		1 => ChunkOutcome::Recovered(symbols[0]),
		_ => ChunkOutcome::Ambiguous(symbols),
	}
}
