// Break fixed-nonce CTR mode using substitutions
//
// Every ciphertext was made with the same keystream, so guessing one byte of
// plaintext in one ciphertext reveals that keystream byte for all of them.
// We guess the longest ciphertext a byte at a time and keep the guess that
// makes the whole column look most like English.
use std::ops::RangeInclusive;

use log::debug;

const PRINTABLE: RangeInclusive<u8> = 32..=126;
const GOOD_BYTES: &[u8] = b"AEIOURSTLMNaeiourstlmn,.; ";

/// Guess the shared keystream of ciphertexts encrypted under one key and
/// nonce. The result is as long as the longest ciphertext.
///
/// This is a heuristic: once only a few ciphertexts are long enough to
/// reach a position, there is little left to score and the guesses get
/// worse.
pub fn guess_fixed_nonce_ctr_keystream<T: AsRef<[u8]>>(ciphertexts: &[T]) -> Vec<u8> {
    let Some(anchor) = longest(ciphertexts) else {
        return Vec::new();
    };
    debug!(
        "guessing {} keystream bytes from {} ciphertexts",
        anchor.len(),
        ciphertexts.len()
    );

    (0..anchor.len())
        .map(|pos| {
            let column: Vec<u8> = ciphertexts
                .iter()
                .filter_map(|c| c.as_ref().get(pos).copied())
                .collect();
            guess_keystream_byte(&column, anchor[pos])
        })
        .collect()
}

/// XOR `ciphertext` with `keystream`, stopping at the shorter of the two.
pub fn apply_keystream(ciphertext: &[u8], keystream: &[u8]) -> Vec<u8> {
    ciphertext
        .iter()
        .zip(keystream)
        .map(|(c, k)| c ^ k)
        .collect()
}

// Ties go to the first, i.e. the longest ciphertext with the lowest index.
fn longest<T: AsRef<[u8]>>(ciphertexts: &[T]) -> Option<&[u8]> {
    ciphertexts.iter().map(|c| c.as_ref()).fold(None, |best, c| match best {
        Some(b) if b.len() >= c.len() => Some(b),
        _ => Some(c),
    })
}

/// `column` holds the byte at one position from every ciphertext long
/// enough to have it; `anchor_byte` is the longest ciphertext's byte.
fn guess_keystream_byte(column: &[u8], anchor_byte: u8) -> u8 {
    let mut best: Option<((bool, usize, usize), u8)> = None;
    for guess in PRINTABLE {
        let key = anchor_byte ^ guess;
        let rank = rank_column(column, key);
        if best.map_or(true, |(best_rank, _)| rank > best_rank) {
            best = Some((rank, key));
        }
    }
    best.map_or(anchor_byte ^ b' ', |(_, key)| key)
}

/// A candidate that turns any byte of the column unprintable is out. Among
/// the rest, count the bytes that are common English letters or
/// punctuation. If every candidate is out, the most printable one wins.
fn rank_column(column: &[u8], key: u8) -> (bool, usize, usize) {
    let n_printable = column
        .iter()
        .filter(|&&c| PRINTABLE.contains(&(c ^ key)))
        .count();
    let n_good = column
        .iter()
        .filter(|&&c| GOOD_BYTES.contains(&(c ^ key)))
        .count();
    (n_printable == column.len(), n_printable, n_good)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{aes_128_ctr, random_bytes_with_seed};

    use rstest::rstest;

    fn read_plaintexts() -> Vec<Vec<u8>> {
        std::fs::read_to_string("./data/set03/c19.txt")
            .unwrap()
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.as_bytes().to_vec())
            .collect()
    }

    fn matching_ratio(recovered: &[u8], expected: &[u8]) -> f64 {
        let n_matching = recovered
            .iter()
            .zip(expected)
            .filter(|(r, e)| r.eq_ignore_ascii_case(e))
            .count();
        n_matching as f64 / expected.len() as f64
    }

    #[rstest]
    #[case(101)]
    #[case(102)]
    #[case(103)]
    fn guess_fixed_nonce_ctr_keystream_recovers_mostly_english(#[case] seed: u64) {
        let plaintexts = read_plaintexts();
        let key = random_bytes_with_seed::<16>(seed);
        let ciphertexts: Vec<Vec<u8>> = plaintexts
            .iter()
            .map(|plaintext| aes_128_ctr(plaintext, &key, 0))
            .collect();

        let keystream = guess_fixed_nonce_ctr_keystream(&ciphertexts);

        assert_eq!(keystream.len(), 38);
        let recovered: Vec<u8> = ciphertexts
            .iter()
            .flat_map(|c| apply_keystream(c, &keystream))
            .collect();
        let expected = plaintexts.concat();
        assert!(recovered.iter().all(|b| PRINTABLE.contains(b)));
        assert!(matching_ratio(&recovered, &expected) > 0.9);
    }

    #[test]
    fn guess_fixed_nonce_ctr_keystream_returns_nothing_for_no_ciphertexts() {
        let ciphertexts: [&[u8]; 0] = [];

        assert!(guess_fixed_nonce_ctr_keystream(&ciphertexts).is_empty());
    }

    #[test]
    fn longest_prefers_first_of_equal_length() {
        let ciphertexts: [&[u8]; 5] = [b"foo", b"zomg", b"", b"fail", b"1"];

        assert_eq!(longest(&ciphertexts), Some(b"zomg".as_slice()));
    }

    #[test]
    fn apply_keystream_truncates_to_shorter_input() {
        assert_eq!(apply_keystream(b"abcd", &[0, 0]), b"ab");
        assert_eq!(apply_keystream(b"ab", &[1, 1, 1]), b"`c");
    }
}
