/// An ECB/CBC detection oracle
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::aes::BLOCK_SIZE;
use crate::{encrypt_aes_128_cbc, encrypt_aes_128_ecb, find_matching_block};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AesMode {
    Ecb,
    Cbc,
}

pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

pub fn random_bytes_with_seed<const N: usize>(seed: u64) -> [u8; N] {
    let mut bytes = [0u8; N];
    StdRng::seed_from_u64(seed).fill_bytes(&mut bytes);
    bytes
}

/// Encrypts under a fresh key each call, with ECB or CBC picked by a coin
/// flip. The mode is returned alongside the ciphertext so tests can check a
/// detector; the detector itself only ever sees the ciphertext.
pub struct EcbCbcOracle {
    rng: StdRng,
}

impl EcbCbcOracle {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn encrypt(&mut self, input: &[u8]) -> (Vec<u8>, AesMode) {
        let mut key = [0u8; BLOCK_SIZE];
        self.rng.fill_bytes(&mut key);

        let plaintext = [
            self.random_bookend().as_slice(),
            input,
            self.random_bookend().as_slice(),
        ]
        .concat();

        if self.rng.gen_bool(0.5) {
            let mut iv = [0u8; BLOCK_SIZE];
            self.rng.fill_bytes(&mut iv);
            (encrypt_aes_128_cbc(&plaintext, &key, &iv), AesMode::Cbc)
        } else {
            (encrypt_aes_128_ecb(&plaintext, &key), AesMode::Ecb)
        }
    }

    fn random_bookend(&mut self) -> Vec<u8> {
        let mut bookend = vec![0u8; self.rng.gen_range(5..=10)];
        self.rng.fill_bytes(&mut bookend);
        bookend
    }
}

/// Decide which mode produced `ciphertext`.
///
/// Only meaningful if the plaintext held at least two identical aligned
/// blocks; with 5-10 bytes of junk in front, three blocks of the same byte
/// is enough.
pub fn detect_aes_mode(ciphertext: &[u8]) -> AesMode {
    match find_matching_block(ciphertext, BLOCK_SIZE) {
        Some(_) => AesMode::Ecb,
        None => AesMode::Cbc,
    }
}
