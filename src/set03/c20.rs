// Break fixed-nonce CTR statistically
//
// Cut every ciphertext down to the shortest one and line them up. Each
// column was then XOR'd against a single keystream byte, which is just the
// single-byte XOR cipher again.
use log::debug;

use crate::brute_force_byte_xor_cipher;

/// Recover the keystream shared by `ciphertexts`, as far as the shortest of
/// them reaches.
pub fn break_fixed_nonce_ctr_statistically<T: AsRef<[u8]>>(ciphertexts: &[T]) -> Vec<u8> {
    let min_len = ciphertexts
        .iter()
        .map(|c| c.as_ref().len())
        .min()
        .unwrap_or(0);
    debug!("truncating {} ciphertexts to {min_len} bytes", ciphertexts.len());

    transpose(ciphertexts, min_len)
        .iter()
        .map(|column| brute_force_byte_xor_cipher(column).key)
        .collect()
}

fn transpose<T: AsRef<[u8]>>(ciphertexts: &[T], len: usize) -> Vec<Vec<u8>> {
    let mut columns = vec![Vec::with_capacity(ciphertexts.len()); len];
    for ciphertext in ciphertexts {
        for (column, &byte) in columns.iter_mut().zip(ciphertext.as_ref()) {
            column.push(byte);
        }
    }
    columns
}
