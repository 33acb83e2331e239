/// Byte-at-a-time ECB decryption (Simple)
use std::collections::HashMap;

use log::{debug, trace};
use rayon::prelude::*;

use crate::{encrypt_aes_128_ecb, find_matching_block, maybe_pkcs7_unpad, AttackError};

const FILLER: u8 = b'A';
const MAX_BLOCK_SIZE: usize = 256;

/// A black box that encrypts attacker input together with secret material.
pub trait EncryptionOracle: Sync {
    fn encrypt(&self, input: &[u8]) -> Vec<u8>;
}

impl<F> EncryptionOracle for F
where
    F: Fn(&[u8]) -> Vec<u8> + Sync,
{
    fn encrypt(&self, input: &[u8]) -> Vec<u8> {
        self(input)
    }
}

/// AES-128-ECB(input || unknown-bytes, key).
pub struct EcbSuffixOracle {
    key: [u8; 16],
    unknown_bytes: Vec<u8>,
}

impl EcbSuffixOracle {
    pub fn new(key: [u8; 16], unknown_bytes: Vec<u8>) -> Self {
        Self { key, unknown_bytes }
    }
}

impl EncryptionOracle for EcbSuffixOracle {
    fn encrypt(&self, input: &[u8]) -> Vec<u8> {
        let message = [input, &self.unknown_bytes].concat();
        encrypt_aes_128_ecb(&message, &self.key)
    }
}

pub fn byte_at_a_time_aes_ecb_decrypt<O>(oracle: &O) -> Result<Vec<u8>, AttackError>
where
    O: EncryptionOracle + ?Sized,
{
    let block_size = detect_block_size(oracle)?;
    debug!("detected block size {block_size}");

    if !oracle_uses_ecb(oracle, block_size) {
        return Err(AttackError::NotEcb);
    }

    crack_unknown_suffix(oracle, block_size, 0, 0)
}

/// Feed the oracle ever longer runs of one byte. The ciphertext grows in
/// whole blocks, so the distance between two consecutive jumps in length is
/// the block size.
pub fn detect_block_size<O>(oracle: &O) -> Result<usize, AttackError>
where
    O: EncryptionOracle + ?Sized,
{
    let mut last_len = oracle.encrypt(&[]).len();
    let mut first_jump: Option<usize> = None;
    for n in 1..=(2 * MAX_BLOCK_SIZE) {
        let len = oracle.encrypt(&vec![FILLER; n]).len();
        if len == last_len {
            continue;
        }
        if first_jump.is_some() {
            return Ok(len - last_len);
        }
        first_jump = Some(n);
        last_len = len;
    }
    Err(AttackError::BlockSizeNotFound)
}

/// Three blocks of identical input always contain two aligned identical
/// blocks, whatever sits in front of them. Under ECB those encrypt to the
/// same ciphertext block.
pub fn oracle_uses_ecb<O>(oracle: &O, block_size: usize) -> bool
where
    O: EncryptionOracle + ?Sized,
{
    let ciphertext = oracle.encrypt(&vec![FILLER; 3 * block_size]);
    find_matching_block(&ciphertext, block_size).is_some()
}

/// Recover whatever the oracle appends after attacker input.
///
/// `prefix_len` is the number of bytes the oracle puts before attacker
/// input and `alignment` the filler needed to push attacker input onto a
/// block boundary (both zero for a plain suffix oracle).
///
/// For each unknown byte we send just enough filler that the byte lands in
/// the last position of a block:
///
/// ```text
/// A A A A A A A X | ...          X is the first unknown byte
/// A A A A A A s X | ...          then the second, and so on
/// ```
///
/// A lookup table of that block for all 256 values of X, built from
/// `filler || known || X`, identifies the byte. Once we run into the
/// padding the table stops matching, right after recovering an 0x01.
pub(crate) fn crack_unknown_suffix<O>(
    oracle: &O,
    block_size: usize,
    prefix_len: usize,
    alignment: usize,
) -> Result<Vec<u8>, AttackError>
where
    O: EncryptionOracle + ?Sized,
{
    let secret_len = oracle.encrypt(&[]).len().saturating_sub(prefix_len);
    let mut decrypted: Vec<u8> = Vec::with_capacity(secret_len);
    while decrypted.len() < secret_len {
        match crack_next_byte(oracle, block_size, prefix_len + alignment, alignment, &decrypted) {
            Some(byte) => {
                trace!("recovered byte {}: {byte:#04x}", decrypted.len());
                decrypted.push(byte);
            }
            None if decrypted.last() == Some(&1) => break,
            None => {
                return Err(AttackError::NoLookupMatch {
                    position: decrypted.len(),
                })
            }
        }
    }
    debug!("recovered {} bytes including padding", decrypted.len());
    Ok(maybe_pkcs7_unpad(&decrypted).to_vec())
}

fn crack_next_byte<O>(
    oracle: &O,
    block_size: usize,
    input_start: usize,
    alignment: usize,
    known: &[u8],
) -> Option<u8>
where
    O: EncryptionOracle + ?Sized,
{
    let filler = vec![FILLER; alignment + block_size - 1 - (known.len() % block_size)];
    let block_start = input_start + (known.len() / block_size) * block_size;
    let window = block_start..(block_start + block_size);

    let probe = [filler.as_slice(), known].concat();
    let lookup = build_lookup_table(oracle, &probe, window.clone());

    let real_ciphertext = oracle.encrypt(&filler);
    let real_block = real_ciphertext.get(window)?;
    lookup.get(real_block).copied()
}

/// Map the ciphertext block at `window` of `oracle(probe || b)` to `b`.
fn build_lookup_table<O>(
    oracle: &O,
    probe: &[u8],
    window: std::ops::Range<usize>,
) -> HashMap<Vec<u8>, u8>
where
    O: EncryptionOracle + ?Sized,
{
    (0..=255u8)
        .into_par_iter()
        .filter_map(|candidate| {
            let mut input = Vec::with_capacity(probe.len() + 1);
            input.extend_from_slice(probe);
            input.push(candidate);
            let ciphertext = oracle.encrypt(&input);
            ciphertext
                .get(window.clone())
                .map(|block| (block.to_vec(), candidate))
        })
        .collect()
}
