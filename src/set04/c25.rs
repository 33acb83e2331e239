// Break "random access read/write" AES CTR
//
// AES-CTR mode works as follows:
//
//         nonce|counter0                nonce|counter1
//              ↓                             ↓
//     key → < AES >                 key → < AES >
//              ↓                             ↓                 ...
// plaintext →  ⊕               plaintext  →  ⊕
//              ↓                             ↓
//          ciphertext                    ciphertext
//
// Since each keystream block is independent, you can seek into a ciphertext
// and re-encrypt part of it without touching the rest. Handing that ability
// to someone who can also read the ciphertext gives the plaintext away.
use log::debug;

use crate::aes::AesCipher;
use crate::{aes_128_ctr, keystream_range};

/// Return a copy of `ciphertext` in which the bytes from `offset` on
/// decrypt to `new_text`. Only keystream for the edited range is computed.
/// The copy grows if the edit runs past the end.
///
/// # Panics
///
/// If `offset` is beyond the end of `ciphertext`.
pub fn edit_aes_ctr_ciphertext(
    ciphertext: &[u8],
    key: &[u8; 16],
    nonce: u64,
    offset: usize,
    new_text: &[u8],
) -> Vec<u8> {
    assert!(
        offset <= ciphertext.len(),
        "edit offset {offset} beyond ciphertext of length {}",
        ciphertext.len()
    );
    let keystream = keystream_range(&AesCipher::new(key), nonce, offset, new_text.len());

    let mut edited = ciphertext.to_vec();
    let end = offset + new_text.len();
    if end > edited.len() {
        edited.resize(end, 0);
    }
    edited[offset..end]
        .iter_mut()
        .zip(new_text.iter().zip(keystream))
        .for_each(|(c, (p, k))| *c = p ^ k);
    edited
}

/// Holds a CTR ciphertext and lets anyone read it or re-encrypt parts of
/// it, without giving out the key.
pub struct CtrEditOracle {
    key: [u8; 16],
    nonce: u64,
    ciphertext: Vec<u8>,
}

impl CtrEditOracle {
    pub fn new(key: [u8; 16], nonce: u64, plaintext: &[u8]) -> Self {
        Self {
            key,
            nonce,
            ciphertext: aes_128_ctr(plaintext, &key, nonce),
        }
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn edit(&self, offset: usize, new_text: &[u8]) -> Vec<u8> {
        edit_aes_ctr_ciphertext(&self.ciphertext, &self.key, self.nonce, offset, new_text)
    }
}

/// Recover the plaintext from an AES CTR edit oracle.
///
/// Rewriting the whole plaintext with zeros makes the oracle hand back the
/// bare keystream, which decrypts the original ciphertext.
pub fn recover_ctr_edit_oracle_plaintext(oracle: &CtrEditOracle) -> Vec<u8> {
    let ciphertext = oracle.ciphertext();
    debug!("recovering {} bytes through edits", ciphertext.len());
    let keystream = oracle.edit(0, &vec![0u8; ciphertext.len()]);
    ciphertext
        .iter()
        .zip(keystream)
        .map(|(c, k)| c ^ k)
        .collect()
}
