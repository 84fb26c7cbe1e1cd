//! Playfair over a 5x5 square, `j` folded into `i`.

use std::collections::HashMap;

use crate::error::{Error, Result};

const SIDE: usize = 5;
const ALPHABET: &str = "abcdefghiklmnopqrstuvwxyz";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayfairKey {
	square: [[char; SIDE]; SIDE],
	positions: HashMap<char, (usize, usize)>,
}

impl PlayfairKey {
	/// Validates and normalises a square given as rows of single-letter cells.
	pub fn from_rows(rows: &[&[&str]]) -> Result<Self> {
		if rows.len() != SIDE {
			return Err(Error::PlayfairKey("key does not have exactly 5 rows"));
		}
		if rows.iter().any(|row| row.len() != SIDE) {
			return Err(Error::PlayfairKey("key does not have exactly 5 columns"));
		}

		let mut square = [[' '; SIDE]; SIDE];
		for (r, row) in rows.iter().enumerate() {
			for (c, cell) in row.iter().enumerate() {
				let mut chars = cell.chars();
				square[r][c] = match (chars.next(), chars.next()) {
					(Some(letter), None) => normalise(letter),
					_ => return Err(Error::PlayfairKey("key cell does not hold a single character")),
				};
			}
		}
		Self::from_square(square)
	}

	/// Builds a square from 25 letters in row-major order; whitespace is ignored.
	pub fn from_letters(letters: &str) -> Result<Self> {
		let letters: Vec<char> = letters.chars().filter(|c| !c.is_whitespace()).collect();
		if letters.len() != SIDE * SIDE {
			return Err(Error::PlayfairKey("key does not have exactly 25 letters"));
		}
		let mut square = [[' '; SIDE]; SIDE];
		for (i, &letter) in letters.iter().enumerate() {
			square[i / SIDE][i % SIDE] = normalise(letter);
		}
		Self::from_square(square)
	}

	fn from_square(square: [[char; SIDE]; SIDE]) -> Result<Self> {
		let mut positions = HashMap::new();
		for (r, row) in square.iter().enumerate() {
			for (c, &letter) in row.iter().enumerate() {
				positions.insert(letter, (r, c));
			}
		}
		if positions.len() != ALPHABET.len() || !ALPHABET.chars().all(|c| positions.contains_key(&c)) {
			return Err(Error::PlayfairKey("key does not have the full alphabet"));
		}
		Ok(Self { square, positions })
	}

	pub fn rows(&self) -> &[[char; SIDE]; SIDE] {
		&self.square
	}

	pub fn encrypt(&self, message: &str) -> Result<String> {
		Ok(self.substitute(&prepare_message(message)?, 1))
	}

	pub fn decrypt(&self, ciphertext: &str) -> Result<String> {
		let letters: Vec<char> = ciphertext.chars().map(normalise).collect();
		if letters.len() % 2 != 0 {
			return Err(Error::InvalidCiphertext("odd number of letters"));
		}
		if letters.iter().any(|c| !self.positions.contains_key(c)) {
			return Err(Error::InvalidCiphertext("ciphertext holds a character outside the key"));
		}
		let pairs: Vec<(char, char)> = letters.chunks(2).map(|pair| (pair[0], pair[1])).collect();
		Ok(self.substitute(&pairs, SIDE - 1))
	}

	/// Moves each digram `shift` cells right (same row) or down (same
	/// column), or swaps the columns of a rectangle.
	fn substitute(&self, pairs: &[(char, char)], shift: usize) -> String {
		let mut out = String::with_capacity(pairs.len() * 2);
		for (a, b) in pairs {
			let (r1, c1) = self.positions[a];
			let (r2, c2) = self.positions[b];
			let (x, y) = if r1 == r2 {
				(self.square[r1][(c1 + shift) % SIDE], self.square[r2][(c2 + shift) % SIDE])
			} else if c1 == c2 {
				(self.square[(r1 + shift) % SIDE][c1], self.square[(r2 + shift) % SIDE][c2])
			} else {
				(self.square[r1][c2], self.square[r2][c1])
			};
			out.push(x);
			out.push(y);
		}
		out
	}
}

fn normalise(letter: char) -> char {
	let lower = letter.to_ascii_lowercase();
	if lower == 'j' { 'i' } else { lower }
}

/// Lowercases, folds `j`, drops non-letters, splits doubled letters with `x`
/// and pads to an even length.
pub fn prepare_message(message: &str) -> Result<Vec<(char, char)>> {
	let letters: Vec<char> = message.chars()
		.filter(|c| c.is_ascii_alphabetic())
		.map(normalise)
		.collect();

	let mut prepared = Vec::with_capacity(letters.len() + letters.len() / 2 + 1);
	for (i, &letter) in letters.iter().enumerate() {
		prepared.push(letter);
		if letters.get(i + 1) == Some(&letter) {
			if letter == 'x' {
				return Err(Error::UnsupportedMessage("doubled x cannot be split"));
			}
			prepared.push('x');
		}
	}
	if prepared.len() % 2 == 1 {
		if prepared.last() == Some(&'x') {
			return Err(Error::UnsupportedMessage("odd message ends in x"));
		}
		prepared.push('x');
	}

	Ok(prepared.chunks(2).map(|pair| (pair[0], pair[1])).collect())
}
