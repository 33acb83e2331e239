// The CBC padding oracle
//
// CBC decryption computes
//
//                 P_i = D(C_i) ⊕ C_{i-1}.
//
// Call I = D(C_i) the intermediate block. If we send the two blocks X || C_i
// to something that decrypts them and tells us whether the padding was
// valid, the last plaintext block it sees is I ⊕ X, and we control X.
//
// Vary the last byte of X until the padding is valid. The last byte of I ⊕ X
// is then almost certainly \x01, which gives us
//
//                 I[15] = X[15] ⊕ \x01,    P_i[15] = I[15] ⊕ C_{i-1}[15].
//
// Now set X[15] = I[15] ⊕ \x02 and vary X[14] until the padding reads
// \x02\x02, and so on down to the first byte. No key needed, one block at a
// time, with the IV standing in for C_0.
//
// "Almost certainly": if I ⊕ X already ends in \x02 before the last byte,
// a last byte of \x02 is valid padding too. Changing X[14] and asking again
// tells the two apart; only a genuine \x01 survives.
use std::iter;

use log::{debug, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::aes::{Block, BLOCK_SIZE};
use crate::{
    base64_decode, decrypt_aes_128_cbc_no_unpad, encrypt_aes_128_cbc, is_pkcs7_padded,
    random_bytes, xor_in_place, AttackError,
};

const PLAINTEXTS: [&str; 10] = [
    "MDAwMDAwTm93IHRoYXQgdGhlIHBhcnR5IGlzIGp1bXBpbmc=",
    "MDAwMDAxV2l0aCB0aGUgYmFzcyBraWNrZWQgaW4gYW5kIHRoZSBWZWdhJ3MgYXJlIHB1bXBpbic=",
    "MDAwMDAyUXVpY2sgdG8gdGhlIHBvaW50LCB0byB0aGUgcG9pbnQsIG5vIGZha2luZw==",
    "MDAwMDAzQ29va2luZyBNQydzIGxpa2UgYSBwb3VuZCBvZiBiYWNvbg==",
    "MDAwMDA0QnVybmluZyAnZW0sIGlmIHlvdSBhaW4ndCBxdWljayBhbmQgbmltYmxl",
    "MDAwMDA1SSBnbyBjcmF6eSB3aGVuIEkgaGVhciBhIGN5bWJhbA==",
    "MDAwMDA2QW5kIGEgaGlnaCBoYXQgd2l0aCBhIHNvdXBlZCB1cCB0ZW1wbw==",
    "MDAwMDA3SSdtIG9uIGEgcm9sbCwgaXQncyB0aW1lIHRvIGdvIHNvbG8=",
    "MDAwMDA4b2xsaW4nIGluIG15IGZpdmUgcG9pbnQgb2g=",
    "MDAwMDA5aXRoIG15IHJhZy10b3AgZG93biBzbyBteSBoYWlyIGNhbiBibG93",
];

/// Anything that tells us whether a CBC ciphertext decrypts to valid
/// padding.
pub trait PaddingOracle: Sync {
    fn padding_valid(&self, ciphertext: &[u8]) -> bool;
}

impl<F> PaddingOracle for F
where
    F: Fn(&[u8]) -> bool + Sync,
{
    fn padding_valid(&self, ciphertext: &[u8]) -> bool {
        self(ciphertext)
    }
}

/// Encrypts one of ten fixed strings under a fixed key and IV, and answers
/// padding queries for ciphertexts under that key and IV.
pub struct CbcPaddingOracle {
    key: [u8; 16],
    iv: [u8; 16],
    rng: StdRng,
}

impl CbcPaddingOracle {
    pub fn new(key: [u8; 16], iv: [u8; 16], seed: u64) -> Self {
        Self {
            key,
            iv,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Encrypt the string at `index`, returning the IV and ciphertext.
    ///
    /// # Panics
    ///
    /// If `index` is not below 10.
    pub fn encrypt_string(&self, index: usize) -> ([u8; 16], Vec<u8>) {
        let plaintext = base64_decode(PLAINTEXTS[index]).expect("PLAINTEXTS are valid base64");
        (self.iv, encrypt_aes_128_cbc(&plaintext, &self.key, &self.iv))
    }

    pub fn encrypt_random_string(&mut self) -> ([u8; 16], Vec<u8>) {
        let index = self.rng.gen_range(0..PLAINTEXTS.len());
        self.encrypt_string(index)
    }
}

impl PaddingOracle for CbcPaddingOracle {
    fn padding_valid(&self, ciphertext: &[u8]) -> bool {
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
            return false;
        }
        is_pkcs7_padded(&decrypt_aes_128_cbc_no_unpad(ciphertext, &self.key, &self.iv))
    }
}

/// Decrypt `ciphertext` using nothing but a padding oracle. The result still
/// carries its padding.
///
/// # Panics
///
/// If `ciphertext` is not a whole number of blocks.
pub fn cbc_padding_oracle_attack<O>(
    ciphertext: &[u8],
    iv: &[u8; BLOCK_SIZE],
    oracle: &O,
) -> Result<Vec<u8>, AttackError>
where
    O: PaddingOracle + ?Sized,
{
    assert!(
        ciphertext.len() % BLOCK_SIZE == 0,
        "ciphertext is not a whole number of blocks"
    );
    let blocks: Vec<Block> = iter::once(*iv)
        .chain(
            ciphertext
                .chunks_exact(BLOCK_SIZE)
                .map(|block| block.try_into().expect("chunk is one block")),
        )
        .collect();

    let mut plaintext = Vec::with_capacity(ciphertext.len());
    for (i, pair) in blocks.windows(2).enumerate() {
        debug!("busting block {} of {}", i + 1, blocks.len() - 1);
        plaintext.extend_from_slice(&brute_force_block(&pair[0], &pair[1], oracle, i + 1)?);
    }
    Ok(plaintext)
}

fn brute_force_block<O>(
    previous: &Block,
    target: &Block,
    oracle: &O,
    block_index: usize,
) -> Result<Block, AttackError>
where
    O: PaddingOracle + ?Sized,
{
    let mut intermediate = [0u8; BLOCK_SIZE];
    let mut inject: Block = random_bytes::<BLOCK_SIZE>();
    for i in (0..BLOCK_SIZE).rev() {
        let pad_len = (BLOCK_SIZE - i) as u8;
        let hit = (0..=255u8)
            .into_par_iter()
            .find_first(|&candidate| {
                let mut probe = inject;
                probe[i] = candidate;
                query(oracle, &probe, target)
                    && (pad_len > 1 || last_byte_is_genuine(oracle, &probe, target))
            })
            .ok_or(AttackError::NoValidPadding {
                block: block_index,
                byte: i,
            })?;
        intermediate[i] = hit ^ pad_len;
        trace!("block {block_index} byte {i}: {:#04x}", intermediate[i] ^ previous[i]);
        if i > 0 {
            inject = injection_pad(&intermediate, pad_len + 1);
        }
    }

    let mut plaintext = intermediate;
    xor_in_place(&mut plaintext, previous);
    Ok(plaintext)
}

/// Inject block that makes the last `pad_len - 1` bytes of a decryption
/// read `pad_len`, given the intermediate bytes found so far. The byte in
/// front of them is left for the next guess.
///
/// # Panics
///
/// If `pad_len` is not in `1..=16`.
pub fn injection_pad(intermediate: &Block, pad_len: u8) -> Block {
    assert!(
        (1..=BLOCK_SIZE as u8).contains(&pad_len),
        "bad pad length: {pad_len}"
    );
    let mut inject = [0u8; BLOCK_SIZE];
    let solved = BLOCK_SIZE - (pad_len as usize - 1);
    for pos in solved..BLOCK_SIZE {
        inject[pos] = intermediate[pos] ^ pad_len;
    }
    inject
}

fn query<O>(oracle: &O, inject: &Block, target: &Block) -> bool
where
    O: PaddingOracle + ?Sized,
{
    oracle.padding_valid(&[inject.as_slice(), target.as_slice()].concat())
}

fn last_byte_is_genuine<O>(oracle: &O, inject: &Block, target: &Block) -> bool
where
    O: PaddingOracle + ?Sized,
{
    let mut altered = *inject;
    altered[BLOCK_SIZE - 2] ^= 0xff;
    let genuine = query(oracle, &altered, target);
    if !genuine {
        warn!("discarding false positive on last byte");
    }
    genuine
}
