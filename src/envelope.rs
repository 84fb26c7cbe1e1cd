use aes::Aes128;
use aes_gcm::aead::consts::{U12, U16};
use aes_gcm::aead::generic_array::{ArrayLength, GenericArray};
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{AesGcm, Nonce, Tag};
use num_bigint::BigUint;

use crate::error::{Error, Result};

pub const KEY_LEN: usize = 16;
pub const TAG_LEN: usize = 16;

/// An AES-GCM sealed message: ciphertext, detached tag and nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
	pub ciphertext: Vec<u8>,
	pub tag: [u8; TAG_LEN],
	pub nonce: Vec<u8>,
}

pub trait EnvelopeOpener {
	/// Returns the plaintext, or [`Error::Authentication`] when the tag does
	/// not verify under `key`.
	fn open(&self, key: &[u8; KEY_LEN], envelope: &Envelope) -> Result<Vec<u8>>;
}

/// AES-128-GCM with 12 or 16 byte nonces and no associated data.
#[derive(Debug, Default, Clone, Copy)]
pub struct AesGcmOpener;

impl AesGcmOpener {
	pub fn seal(&self, key: &[u8; KEY_LEN], nonce: &[u8], plaintext: &[u8]) -> Result<Envelope> {
		match nonce.len() {
			12 => seal_with::<U12>(key, nonce, plaintext),
			16 => seal_with::<U16>(key, nonce, plaintext),
			len => Err(Error::InvalidNonce(len)),
		}
	}
}

impl EnvelopeOpener for AesGcmOpener {
	fn open(&self, key: &[u8; KEY_LEN], envelope: &Envelope) -> Result<Vec<u8>> {
		match envelope.nonce.len() {
			12 => open_with::<U12>(key, envelope),
			16 => open_with::<U16>(key, envelope),
			len => Err(Error::InvalidNonce(len)),
		}
	}
}

fn open_with<N: ArrayLength<u8>>(key: &[u8; KEY_LEN], envelope: &Envelope) -> Result<Vec<u8>> {
	let cipher = AesGcm::<Aes128, N>::new(GenericArray::from_slice(key));
	let mut buffer = envelope.ciphertext.clone();
	cipher
		.decrypt_in_place_detached(Nonce::<N>::from_slice(&envelope.nonce), b"", &mut buffer, Tag::from_slice(&envelope.tag))
		.map_err(|_| Error::Authentication)?;
	Ok(buffer)
}

fn seal_with<N: ArrayLength<u8>>(key: &[u8; KEY_LEN], nonce: &[u8], plaintext: &[u8]) -> Result<Envelope> {
	let cipher = AesGcm::<Aes128, N>::new(GenericArray::from_slice(key));
	let mut ciphertext = plaintext.to_vec();
	let tag = cipher
		.encrypt_in_place_detached(Nonce::<N>::from_slice(nonce), b"", &mut ciphertext)
		.map_err(|_| Error::Authentication)?;
	let mut detached = [0u8; TAG_LEN];
	detached.copy_from_slice(&tag);
	Ok(Envelope { ciphertext, tag: detached, nonce: nonce.to_vec() })
}

/// Big-endian, left-padded bytes of a key candidate.
pub fn key_bytes(key: &BigUint) -> Result<[u8; KEY_LEN]> {
	let bytes = key.to_bytes_be();
	if bytes.len() > KEY_LEN {
		return Err(Error::KeyTooWide(KEY_LEN));
	}
	let mut out = [0u8; KEY_LEN];
	out[KEY_LEN - bytes.len()..].copy_from_slice(&bytes);
	Ok(out)
}
