//! JSON scenario files: group parameters, calibration sample, targets and the
//! sealed envelope. Big integers are decimal strings, bytes are hex.

use std::path::Path;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::calibrate::CalibrationSample;
use crate::envelope::{Envelope, TAG_LEN};
use crate::error::{Error, Result};
use crate::params::{GroupParameters, SymbolOrder, REFERENCE_BIT_WIDTH, REFERENCE_EXPONENT_STEP, REFERENCE_ORDER};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
	pub group: GroupConfig,
	pub calibration: CalibrationConfig,
	pub targets: Vec<String>,
	pub envelope: EnvelopeConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
	pub modulus: String,
	pub generator: String,
	pub leak_bits: u32,
	#[serde(default = "default_bit_width")]
	pub total_bit_width: u32,
	#[serde(default = "default_order")]
	pub expected_order: usize,
	#[serde(default)]
	pub symbol_order: SymbolOrder,
	#[serde(default = "default_step")]
	pub exponent_step: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationConfig {
	pub known_plaintext: String,
	pub ciphertexts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeConfig {
	pub ciphertext: String,
	pub tag: String,
	pub nonce: String,
}

fn default_bit_width() -> u32 { REFERENCE_BIT_WIDTH }
fn default_order() -> usize { REFERENCE_ORDER }
fn default_step() -> usize { REFERENCE_EXPONENT_STEP }

pub fn parse_integer(s: &str) -> Result<BigUint> {
	s.trim().parse().map_err(|_| Error::InvalidInteger(s.to_owned()))
}

fn parse_integers(values: &[String]) -> Result<Vec<BigUint>> {
	values.iter().map(|v| parse_integer(v)).collect()
}

fn integer_strings(values: &[BigUint]) -> Vec<String> {
	values.iter().map(|v| v.to_string()).collect()
}

impl Scenario {
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let data = std::fs::read(path)?;
		Self::from_slice(&data)
	}

	pub fn from_slice(data: &[u8]) -> Result<Self> {
		Ok(serde_json::from_slice(data)?)
	}

	pub fn to_json(&self) -> Result<String> {
		Ok(serde_json::to_string_pretty(self)?)
	}

	pub fn from_parts(params: &GroupParameters, sample: &CalibrationSample, targets: &[BigUint], envelope: &Envelope) -> Self {
		Self {
			group: GroupConfig {
				modulus: params.modulus.to_string(),
				generator: params.generator.to_string(),
				leak_bits: params.leak_bits,
				total_bit_width: params.total_bit_width,
				expected_order: params.expected_order,
				symbol_order: params.symbol_order,
				exponent_step: params.exponent_step,
			},
			calibration: CalibrationConfig {
				known_plaintext: sample.known_plaintext.to_string(),
				ciphertexts: integer_strings(&sample.known_ciphertexts),
			},
			targets: integer_strings(targets),
			envelope: EnvelopeConfig {
				ciphertext: hex::encode(&envelope.ciphertext),
				tag: hex::encode(envelope.tag),
				nonce: hex::encode(&envelope.nonce),
			},
		}
	}

	pub fn parameters(&self) -> Result<GroupParameters> {
		let group = &self.group;
		let params = GroupParameters::with_bit_width(
			parse_integer(&group.modulus)?,
			parse_integer(&group.generator)?,
			group.leak_bits,
			group.total_bit_width,
		)?;
		Ok(params
			.with_expected_order(group.expected_order)?
			.with_symbol_order(group.symbol_order)
			.with_exponent_step(group.exponent_step))
	}

	pub fn sample(&self) -> Result<CalibrationSample> {
		Ok(CalibrationSample {
			known_plaintext: parse_integer(&self.calibration.known_plaintext)?,
			known_ciphertexts: parse_integers(&self.calibration.ciphertexts)?,
		})
	}

	pub fn targets(&self) -> Result<Vec<BigUint>> {
		parse_integers(&self.targets)
	}

	pub fn envelope(&self) -> Result<Envelope> {
		let tag = hex::decode(self.envelope.tag.trim())?;
		let tag: [u8; TAG_LEN] = tag.as_slice().try_into().map_err(|_| Error::InvalidTag(tag.len()))?;
		Ok(Envelope {
			ciphertext: hex::decode(self.envelope.ciphertext.trim())?,
			tag,
			nonce: hex::decode(self.envelope.nonce.trim())?,
		})
	}
}
