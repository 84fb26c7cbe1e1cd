use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
	#[error("invalid group parameters: {0}")]
	InvalidParameters(String),
	#[error("generator does not cycle with order {expected} (cycle length {found:?})")]
	UnexpectedOrder { expected: usize, found: Option<usize> },
	#[error("calibration sample has no known ciphertexts")]
	EmptyCalibration,
	#[error("invalid calibration sample: {0}")]
	InvalidSample(String),
	#[error("no target ciphertexts to reconstruct")]
	EmptyTargets,

	#[error("key candidate is wider than {0} bytes")]
	KeyTooWide(usize),
	#[error("unsupported nonce length {0}")]
	InvalidNonce(usize),
	#[error("tag must be 16 bytes, got {0}")]
	InvalidTag(usize),
	#[error("authentication failed")]
	Authentication,

	#[error("invalid integer {0:?}")]
	InvalidInteger(String),
	#[error("invalid hex: {0}")]
	Hex(#[from] hex::FromHexError),
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	#[error("json: {0}")]
	Json(#[from] serde_json::Error),

	#[error("invalid playfair key: {0}")]
	PlayfairKey(&'static str),
	#[error("unsupported message: {0}")]
	UnsupportedMessage(&'static str),
	#[error("invalid ciphertext: {0}")]
	InvalidCiphertext(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
