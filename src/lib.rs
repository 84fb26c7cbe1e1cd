mod attack;
mod bits;
mod calibrate;
mod envelope;
mod error;
mod params;
mod reconstruct;
mod subgroup;

pub mod config;
pub mod playfair;
pub mod score;
pub mod synth;

pub use self::attack::{Attack, AttackReport, CandidateOutcome, SelfCheck};
pub use self::bits::{assemble, fixed_bits, symbols};
pub use self::calibrate::{calibrate, Calibration, CalibrationSample, OracleSolution};
pub use self::config::Scenario;
pub use self::envelope::{key_bytes, AesGcmOpener, Envelope, EnvelopeOpener, KEY_LEN, TAG_LEN};
pub use self::error::{Error, Result};
pub use self::params::{GroupParameters, SymbolOrder};
pub use self::reconstruct::{reconstruct, reconstruct_all, ChunkOutcome, Reconstruction};
pub use self::subgroup::SubgroupTable;

#[cfg(test)]
mod tests {
	use num_bigint::BigUint;

	use super::*;

	const REFERENCE: &str = include_str!("../scenarios/reference.json");

	#[test]
	fn crack() {
		let scenario = Scenario::from_slice(REFERENCE.as_bytes()).unwrap();
		let attack = Attack::new(scenario.parameters().unwrap()).unwrap();
		let sample = scenario.sample().unwrap();
		let envelope = scenario.envelope().unwrap();

		let report = attack.run(&sample, &scenario.targets().unwrap(), &envelope, &AesGcmOpener).unwrap();

		assert_eq!(
			vec![
				OracleSolution { exponent_residue: 0, fixed_bits: 0 },
				OracleSolution { exponent_residue: 2, fixed_bits: 1 },
			],
			report.calibration.solutions
		);
		for check in &report.self_checks {
			assert!(check.consistent);
			assert_eq!(Some(BigUint::from(78u8)), check.reconstructed);
		}
		assert!(report.reconstructions.iter().all(|r| r.is_complete()));

		let key = BigUint::parse_bytes(b"58660eb668b7721e5335e31566b85db0", 16).unwrap();
		let recovered: Vec<_> = report.recovered().collect();
		assert_eq!(vec![(&key, &b"Lukas Schuler, Ursula Steiner"[..])], recovered);

		let mut wrong = key_bytes(&key).unwrap();
		wrong[0] ^= 0x01;
		assert!(matches!(AesGcmOpener.open(&wrong, &envelope), Err(Error::Authentication)));
	}
}
