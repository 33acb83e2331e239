// Single-byte XOR cipher
//
// Every byte of the message was XOR'd against one key byte. Try all 256 keys
// and keep the candidate that looks most like English.
//
// The score is a weighted character count: common letters and spaces earn
// more than rare letters, punctuation earns a little, and anything outside
// printable ASCII costs a lot. Upper and lower case score the same.

use rayon::prelude::*;

const COMMON_LETTERS: &[u8] = b"etaoinshrdlu";
const PUNCTUATION: &[u8] = b",.!?'\":;-";

pub struct XorCrackResult {
    pub key: u8,
    pub message: Vec<u8>,
    pub score: f64,
}

pub fn brute_force_byte_xor_cipher(bytes: &[u8]) -> XorCrackResult {
    let candidates: Vec<(f64, u8)> = (0..=255u8)
        .into_par_iter()
        .map(|key| (score_english(bytes.iter().map(|b| b ^ key)), key))
        .collect();

    // Candidates are in key order, so ties go to the lowest key.
    let (score, key) = candidates
        .into_iter()
        .fold((f64::NEG_INFINITY, 0u8), |best, candidate| {
            if candidate.0 > best.0 {
                candidate
            } else {
                best
            }
        });
    XorCrackResult {
        key,
        message: bytes.iter().map(|b| b ^ key).collect(),
        score,
    }
}

pub fn score_english<I>(bytes: I) -> f64
where
    I: IntoIterator<Item = u8>,
{
    bytes.into_iter().map(score_char).sum()
}

fn score_char(byte: u8) -> f64 {
    let lower = byte.to_ascii_lowercase();
    if byte == b' ' {
        3.0
    } else if COMMON_LETTERS.contains(&lower) {
        2.0
    } else if lower.is_ascii_lowercase() {
        1.0
    } else if byte.is_ascii_digit() || PUNCTUATION.contains(&byte) {
        0.5
    } else if byte == b'\n' || (0x20..0x7f).contains(&byte) {
        0.0
    } else {
        -10.0
    }
}
