use std::collections::HashMap;

// From https://en.wikipedia.org/wiki/Letter_frequency
const ENGLISH_FREQUENCIES: [(char, f64); 26] = [
	('a', 0.08200),
	('b', 0.01500),
	('c', 0.02800),
	('d', 0.04300),
	('e', 0.12700),
	('f', 0.02200),
	('g', 0.02000),
	('h', 0.06100),
	('i', 0.07000),
	('j', 0.00150),
	('k', 0.00770),
	('l', 0.04000),
	('m', 0.02400),
	('n', 0.06700),
	('o', 0.07500),
	('p', 0.01900),
	('q', 0.00095),
	('r', 0.06000),
	('s', 0.06300),
	('t', 0.09100),
	('u', 0.02800),
	('v', 0.00980),
	('w', 0.02400),
	('x', 0.00150),
	('y', 0.02000),
	('z', 0.00074),
];

/// Share of each character in `text`, spaces excluded.
fn letter_frequencies(text: &str) -> HashMap<char, f64> {
	let mut tally: HashMap<char, usize> = HashMap::new();
	for c in text.chars().filter(|&c| c != ' ') {
		*tally.entry(c).or_default() += 1;
	}
	let total = tally.values().sum::<usize>() as f64;
	tally.into_iter()
		.map(|(c, n)| (c, n as f64 / total))
		.collect()
}

/// How English a recovered plaintext looks. Higher is better; letters far
/// from their expected frequency and any non-letter drag the score down.
pub fn english_score(text: &str) -> f64 {
	let english: HashMap<char, f64> = ENGLISH_FREQUENCIES.into_iter().collect();
	let text_lower = text.to_lowercase();

	letter_frequencies(&text_lower)
		.into_iter()
		.map(|(c, f)| english.get(&c)
			.map(|ef| ef * f * (1.0 - (ef - f).abs().sqrt()))
			.unwrap_or(f * f * -1.0))
		.sum()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn frequencies_skip_spaces() {
		let shares = letter_frequencies("ab a");
		assert_eq!(Some(&(2.0 / 3.0)), shares.get(&'a'));
		assert_eq!(None, shares.get(&' '));
		let total: f64 = letter_frequencies("hello world").values().sum();
		assert!((total - 1.0).abs() < 1e-9);
	}

	#[test]
	fn english_beats_noise() {
		let english = english_score("Lukas Schuler, Ursula Steiner");
		let noise = english_score("\u{1}\u{7f}#~]|\u{3}@@!%");
		assert!(english > noise);
		assert!(noise < 0.0);
		assert_eq!(0.0, english_score(""));
	}
}
