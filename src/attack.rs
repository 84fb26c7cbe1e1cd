use indexmap::IndexMap;
use log::{debug, info, warn};
use num_bigint::BigUint;

use crate::calibrate::{self, Calibration, CalibrationSample, OracleSolution};
use crate::envelope::{key_bytes, Envelope, EnvelopeOpener};
use crate::error::Result;
use crate::params::GroupParameters;
use crate::reconstruct::{self, Reconstruction};
use crate::score::english_score;
use crate::subgroup::SubgroupTable;

/// Whether a solution maps the calibration ciphertexts back onto the known
/// plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfCheck {
	pub solution: OracleSolution,
	pub reconstructed: Option<BigUint>,
	pub consistent: bool,
}

#[derive(Debug)]
pub struct CandidateOutcome {
	pub key: BigUint,
	/// Every solution that reconstructed this key.
	pub solutions: Vec<OracleSolution>,
	pub result: Result<Vec<u8>>,
	/// English score of the plaintext, when it decrypted to UTF-8.
	pub score: Option<f64>,
}

impl CandidateOutcome {
	pub fn plaintext(&self) -> Option<&[u8]> {
		self.result.as_deref().ok()
	}
}

#[derive(Debug)]
pub struct AttackReport {
	pub calibration: Calibration,
	pub self_checks: Vec<SelfCheck>,
	pub reconstructions: Vec<Reconstruction>,
	/// Decryptable candidates first, best English score first.
	pub candidates: Vec<CandidateOutcome>,
}

impl AttackReport {
	/// Keys that opened the envelope, with their plaintexts.
	pub fn recovered(&self) -> impl Iterator<Item = (&BigUint, &[u8])> + '_ {
		self.candidates.iter().filter_map(|candidate| candidate.plaintext().map(|pt| (&candidate.key, pt)))
	}

	pub fn is_success(&self) -> bool {
		self.recovered().next().is_some()
	}
}

pub struct Attack {
	params: GroupParameters,
	table: SubgroupTable,
}

impl Attack {
	pub fn new(params: GroupParameters) -> Result<Self> {
		let table = SubgroupTable::enumerate(&params)?;
		debug!("subgroup table: {:?}", table.powers());
		Ok(Self { params, table })
	}

	pub fn params(&self) -> &GroupParameters {
		&self.params
	}

	pub fn table(&self) -> &SubgroupTable {
		&self.table
	}

	pub fn calibrate(&self, sample: &CalibrationSample) -> Result<Calibration> {
		calibrate::calibrate(&self.params, &self.table, sample)
	}

	pub fn reconstruct(&self, solutions: &[OracleSolution], targets: &[BigUint]) -> Result<Vec<Reconstruction>> {
		reconstruct::reconstruct_all(&self.params, &self.table, solutions, targets)
	}

	/// Feeds the known ciphertexts back through reconstruction.
	pub fn self_check(&self, sample: &CalibrationSample, solutions: &[OracleSolution]) -> Result<Vec<SelfCheck>> {
		let checks = self.reconstruct(solutions, &sample.known_ciphertexts)?
			.into_iter()
			.map(|reconstruction| {
				let reconstructed = reconstruction.key_candidate();
				let consistent = reconstructed.as_ref() == Some(&sample.known_plaintext);
				if !consistent {
					warn!(
						"{:?} reconstructs the known plaintext as {:?}, expected {}",
						reconstruction.solution, reconstructed, sample.known_plaintext
					);
				}
				SelfCheck { solution: reconstruction.solution, reconstructed, consistent }
			})
			.collect();
		Ok(checks)
	}

	/// Distinct complete keys, in first-seen order, with the solutions behind them.
	pub fn candidates(reconstructions: &[Reconstruction]) -> IndexMap<BigUint, Vec<OracleSolution>> {
		let mut candidates: IndexMap<BigUint, Vec<OracleSolution>> = IndexMap::new();
		for reconstruction in reconstructions {
			match reconstruction.key_candidate() {
				Some(key) => candidates.entry(key).or_default().push(reconstruction.solution),
				None => warn!("{:?} left {} chunks unresolved", reconstruction.solution, reconstruction.problems().count()),
			}
		}
		candidates
	}

	pub fn run<O: EnvelopeOpener + ?Sized>(
		&self,
		sample: &CalibrationSample,
		targets: &[BigUint],
		envelope: &Envelope,
		opener: &O,
	) -> Result<AttackReport> {
		let calibration = self.calibrate(sample)?;
		info!("calibration kept {} solutions", calibration.solutions.len());

		let self_checks = self.self_check(sample, &calibration.solutions)?;
		let reconstructions = self.reconstruct(&calibration.solutions, targets)?;

		let mut candidates: Vec<CandidateOutcome> = Self::candidates(&reconstructions)
			.into_iter()
			.map(|(key, solutions)| {
				let result = key_bytes(&key).and_then(|bytes| opener.open(&bytes, envelope));
				let score = result.as_ref().ok()
					.and_then(|pt| std::str::from_utf8(pt).ok())
					.map(english_score);
				match &result {
					Ok(_) => info!("key {:x} opens the envelope", key),
					Err(err) => info!("key {:x} rejected: {}", key, err),
				}
				CandidateOutcome { key, solutions, result, score }
			})
			.collect();
		candidates.sort_by(|c1, c2| {
			let s1 = c1.plaintext().map(|_| c1.score.unwrap_or(f64::MIN));
			let s2 = c2.plaintext().map(|_| c2.score.unwrap_or(f64::MIN));
			match (s1, s2) {
				(Some(s1), Some(s2)) => s1.total_cmp(&s2).reverse(),
				_ => s2.is_some().cmp(&s1.is_some()),
			}
		});

		if candidates.iter().all(|c| c.result.is_err()) {
			warn!("key recovery failed: no candidate opened the envelope");
		}

		Ok(AttackReport { calibration, self_checks, reconstructions, candidates })
	}
}

#[cfg(test)]
mod tests {
	use rand::rngs::StdRng;
	use rand::SeedableRng;
	use num_bigint::RandBigInt;

	use super::*;
	use crate::envelope::AesGcmOpener;
	use crate::error::Error;
	use crate::synth::FaultyEncoder;

	struct RejectAll;

	impl EnvelopeOpener for RejectAll {
		fn open(&self, _key: &[u8; 16], _envelope: &Envelope) -> Result<Vec<u8>> {
			Err(Error::Authentication)
		}
	}

	fn synthetic(seed: u64) -> (Attack, CalibrationSample, Vec<BigUint>, BigUint, Envelope) {
		let attack = Attack::new(GroupParameters::reference().unwrap()).unwrap();
		let mut rng = StdRng::seed_from_u64(seed);
		let key = rng.gen_biguint(128);
		let encoder = FaultyEncoder::new(attack.params(), attack.table(), 3, 1);
		let known_plaintext = BigUint::from(0b01_00_11_10u8);
		let sample = CalibrationSample {
			known_ciphertexts: encoder.encode_value(&known_plaintext, 4, &mut rng).unwrap(),
			known_plaintext,
		};
		let targets = encoder.encode_value(&key, 64, &mut rng).unwrap();
		let envelope = AesGcmOpener.seal(&key_bytes(&key).unwrap(), &[5u8; 16], b"meet me by the old oak tree").unwrap();
		(attack, sample, targets, key, envelope)
	}

	#[test]
	fn recovers_synthetic_key() {
		let (attack, sample, targets, key, envelope) = synthetic(20);
		let report = attack.run(&sample, &targets, &envelope, &AesGcmOpener).unwrap();

		assert_eq!(2, report.calibration.solutions.len());
		assert!(report.self_checks.iter().all(|check| check.consistent));
		assert_eq!(1, report.candidates.len());
		assert_eq!(2, report.candidates[0].solutions.len());

		let recovered: Vec<_> = report.recovered().collect();
		assert_eq!(vec![(&key, &b"meet me by the old oak tree"[..])], recovered);
		assert!(report.candidates[0].score.unwrap() > 0.0);
	}

	#[test]
	fn failed_recovery_is_reported() {
		let (attack, sample, targets, _key, envelope) = synthetic(21);
		let report = attack.run(&sample, &targets, &envelope, &RejectAll).unwrap();
		assert!(!report.is_success());
		assert_eq!(1, report.candidates.len());
		assert!(matches!(report.candidates[0].result, Err(Error::Authentication)));
	}

	#[test]
	fn inconsistent_self_check_is_flagged() {
		let (attack, sample, _targets, _key, _envelope) = synthetic(22);
		let solutions = attack.calibrate(&sample).unwrap().solutions;

		let mut wrong = sample.clone();
		wrong.known_plaintext = BigUint::from(0b01_00_11_11u8);
		let checks = attack.self_check(&wrong, &solutions).unwrap();
		assert_eq!(2, checks.len());
		for check in checks {
			assert!(!check.consistent);
			assert_eq!(Some(sample.known_plaintext.clone()), check.reconstructed);
		}
	}

	#[test]
	fn wrong_plaintext_leaves_no_candidates() {
		// one flipped symbol breaks every residue on the reference table
		let (attack, mut sample, targets, _key, envelope) = synthetic(24);
		sample.known_plaintext = BigUint::from(0b01_00_11_11u8);
		let report = attack.run(&sample, &targets, &envelope, &AesGcmOpener).unwrap();
		assert!(report.calibration.solutions.is_empty());
		assert!(report.candidates.is_empty());
		assert!(!report.is_success());
	}

	#[test]
	fn candidates_deduplicate_in_order() {
		let solution = |residue| OracleSolution { exponent_residue: residue, fixed_bits: 0 };
		let recovered = |residue, chunks: &[u8]| Reconstruction {
			solution: solution(residue),
			symbol_order: Default::default(),
			chunks: chunks.iter().map(|&c| reconstruct::ChunkOutcome::Recovered(c)).collect(),
		};
		let reconstructions = vec![
			recovered(0, &[1, 2]),
			Reconstruction { solution: solution(1), symbol_order: Default::default(), chunks: vec![reconstruct::ChunkOutcome::Missing] },
			recovered(2, &[3]),
			recovered(3, &[1, 2]),
		];
		let candidates = Attack::candidates(&reconstructions);
		let keys: Vec<_> = candidates.keys().cloned().collect();
		assert_eq!(vec![BigUint::from(0b10_01u8), BigUint::from(3u8)], keys);
		assert_eq!(vec![solution(0), solution(3)], candidates[0]);
	}

	#[test]
	fn precondition_violations_abort() {
		let (attack, sample, _targets, _key, envelope) = synthetic(23);
		assert!(matches!(attack.run(&sample, &[], &envelope, &AesGcmOpener), Err(Error::EmptyTargets)));

		let empty = CalibrationSample { known_plaintext: BigUint::from(0u8), known_ciphertexts: vec![] };
		assert!(matches!(attack.run(&empty, &[BigUint::from(1u8)], &envelope, &AesGcmOpener), Err(Error::EmptyCalibration)));
	}
}
