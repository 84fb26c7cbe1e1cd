use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use fault_oracle::playfair::PlayfairKey;
use fault_oracle::synth::FaultyEncoder;
use fault_oracle::{
	key_bytes, AesGcmOpener, Attack, CalibrationSample, ChunkOutcome, Error, GroupParameters, Reconstruction, Result,
	Scenario, KEY_LEN,
};
use num_bigint::{BigUint, RandBigInt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Parser)]
#[command(name = "fault-oracle")]
#[command(about = "Key recovery against a key exchange with faulty masks and a small-order generator", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Recover the key of a scenario file and open its envelope
	Attack {
		/// Scenario JSON file
		scenario: PathBuf,
	},

	/// Print a synthetic scenario over the reference group
	Simulate {
		#[arg(long, default_value_t = 0)]
		seed: u64,

		/// Key to hide, hex; random when absent
		#[arg(long)]
		key_hex: Option<String>,

		/// Number of 2-bit key chunks
		#[arg(long, default_value_t = MAX_KEY_CHUNKS)]
		chunks: usize,

		/// Message sealed under the key
		#[arg(long, default_value = "attack at dawn")]
		message: String,
	},

	/// Playfair with a 25 letter row-major key square
	Playfair {
		#[command(subcommand)]
		mode: PlayfairMode,
	},
}

#[derive(Subcommand)]
enum PlayfairMode {
	Encrypt {
		#[arg(long)]
		key: String,
		text: String,
	},
	Decrypt {
		#[arg(long)]
		key: String,
		text: String,
	},
}

const KNOWN_PLAINTEXT: u8 = 0b01_00_11_10;
const MAX_KEY_CHUNKS: usize = KEY_LEN * 4;

fn main() -> ExitCode {
	env_logger::init();

	let cli = Cli::parse();
	match run(cli.command) {
		Ok(code) => code,
		Err(err) => {
			eprintln!("error: {}", err);
			ExitCode::FAILURE
		}
	}
}

fn run(command: Command) -> Result<ExitCode> {
	match command {
		Command::Attack { scenario } => attack(Scenario::load(scenario)?),
		Command::Simulate { seed, key_hex, chunks, message } => {
			println!("{}", simulate(seed, key_hex.as_deref(), chunks, &message)?.to_json()?);
			Ok(ExitCode::SUCCESS)
		}
		Command::Playfair { mode } => {
			let text = match mode {
				PlayfairMode::Encrypt { key, text } => PlayfairKey::from_letters(&key)?.encrypt(&text)?,
				PlayfairMode::Decrypt { key, text } => PlayfairKey::from_letters(&key)?.decrypt(&text)?,
			};
			println!("{}", text);
			Ok(ExitCode::SUCCESS)
		}
	}
}

fn attack(scenario: Scenario) -> Result<ExitCode> {
	let attack = Attack::new(scenario.parameters()?)?;
	let report = attack.run(&scenario.sample()?, &scenario.targets()?, &scenario.envelope()?, &AesGcmOpener)?;

	if report.calibration.weak {
		println!("Calibration sample is shorter than the subgroup order");
	}
	for check in &report.self_checks {
		let verdict = if check.consistent { "ok" } else { "MISMATCH" };
		println!(
			"Solution: exponent = {} mod {}, fixed bits = {:02b} (known plaintext {})",
			check.solution.exponent_residue, attack.table().order(), check.solution.fixed_bits, verdict
		);
	}
	for reconstruction in &report.reconstructions {
		for line in chunk_problems(reconstruction) {
			println!("{}", line);
		}
	}

	for candidate in &report.candidates {
		match &candidate.result {
			Ok(plaintext) => println!("Possible answer (key {:032x}): {}", candidate.key, String::from_utf8_lossy(plaintext)),
			Err(err) => println!("Rejected key {:032x}: {}", candidate.key, err),
		}
	}

	if report.is_success() {
		Ok(ExitCode::SUCCESS)
	} else {
		println!("Key recovery failed");
		Ok(ExitCode::FAILURE)
	}
}

/// Unresolved chunks of one solution, headed by the solution itself.
fn chunk_problems(reconstruction: &Reconstruction) -> Vec<String> {
	let solution = reconstruction.solution;
	let mut lines: Vec<String> = reconstruction.problems()
		.map(|(chunk, outcome)| match outcome {
			ChunkOutcome::Ambiguous(symbols) => format!("  chunk {}: ambiguous {:?}", chunk, symbols),
			_ => format!("  chunk {}: no match", chunk),
		})
		.collect();
	if !lines.is_empty() {
		lines.insert(0, format!(
			"Solution: exponent = {}, fixed bits = {:02b} left {} chunks unresolved",
			solution.exponent_residue, solution.fixed_bits, lines.len()
		));
	}
	lines
}

fn simulate(seed: u64, key_hex: Option<&str>, chunks: usize, message: &str) -> Result<Scenario> {
	if !(1..=MAX_KEY_CHUNKS).contains(&chunks) {
		return Err(Error::InvalidParameters(format!(
			"{} chunks do not fit a {} byte key", chunks, KEY_LEN
		)));
	}
	let mut rng = StdRng::seed_from_u64(seed);
	let params = GroupParameters::reference()?;
	let attack = Attack::new(params)?;

	let key = match key_hex {
		Some(encoded) => BigUint::from_bytes_be(&hex::decode(encoded)?),
		None => rng.gen_biguint(chunks as u64 * 2),
	};
	let key_material = key_bytes(&key)?;

	let encoder = FaultyEncoder::new(attack.params(), attack.table(), rng.gen_range(0..4), rng.gen_range(0..4));
	let known_plaintext = BigUint::from(KNOWN_PLAINTEXT);
	let sample = CalibrationSample {
		known_ciphertexts: encoder.encode_value(&known_plaintext, 4, &mut rng)?,
		known_plaintext,
	};
	let targets = encoder.encode_value(&key, chunks, &mut rng)?;

	let nonce: [u8; 16] = rng.gen();
	let envelope = AesGcmOpener.seal(&key_material, &nonce, message.as_bytes())?;

	Ok(Scenario::from_parts(attack.params(), &sample, &targets, &envelope))
}
