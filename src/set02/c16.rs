// CBC bitflipping attacks
//
// Decryption computes P_i = D(C_i) ⊕ C_{i-1}. Flipping a bit of C_{i-1}
// flips the same bit of P_i, and turns P_{i-1} into garbage. Knowing P_i we
// can therefore make it read anything we like by setting
//
//                  C_{i-1}' = C_{i-1} ⊕ P_i ⊕ P_i'.
use crate::aes::BLOCK_SIZE;
use crate::{decrypt_aes_128_cbc, encrypt_aes_128_cbc, xor_in_place, InvalidPadding};

pub(crate) const COMMENT_PREFIX: &[u8] = b"comment1=cooking%20MCs;userdata=";
pub(crate) const COMMENT_SUFFIX: &[u8] = b";comment2=%20like%20a%20pound%20of%20bacon";
pub(crate) const ADMIN_TOKEN: &[u8] = b";admin=true;";

/// Edit a CBC ciphertext so the plaintext at `offset` reads `desired`
/// where it used to read `known`. The block before it is scrambled.
///
/// # Panics
///
/// If `known` and `desired` differ in length, if `offset` is in the first
/// block (that would need the IV), or if the span crosses a block boundary.
pub fn flip_cbc_block(ciphertext: &[u8], offset: usize, known: &[u8], desired: &[u8]) -> Vec<u8> {
    assert_eq!(known.len(), desired.len(), "known and desired differ in length");
    assert!(offset >= BLOCK_SIZE, "cannot flip bytes of the first block");
    assert!(
        known.is_empty() || offset / BLOCK_SIZE == (offset + known.len() - 1) / BLOCK_SIZE,
        "flip spans more than one block"
    );
    assert!(offset + known.len() <= ciphertext.len(), "flip runs past the ciphertext");

    let mut flipped = ciphertext.to_vec();
    let target = (offset - BLOCK_SIZE)..(offset - BLOCK_SIZE + known.len());
    xor_in_place(&mut flipped[target.clone()], known);
    xor_in_place(&mut flipped[target], desired);
    flipped
}

/// Rewrite the second block of an encrypted comment, which we know reads
/// `%20MCs;userdata=`, into `;admin=true;lol=`.
pub fn bitflip_inject_admin(ciphertext: &[u8]) -> Vec<u8> {
    flip_cbc_block(
        ciphertext,
        BLOCK_SIZE,
        &COMMENT_PREFIX[BLOCK_SIZE..(2 * BLOCK_SIZE)],
        b";admin=true;lol=",
    )
}

pub struct CommentOracle {
    key: [u8; 16],
    iv: [u8; 16],
}

impl CommentOracle {
    pub fn new(key: [u8; 16], iv: [u8; 16]) -> Self {
        Self { key, iv }
    }

    pub fn encrypted_comment(&self, input: &[u8]) -> Vec<u8> {
        let plaintext = [COMMENT_PREFIX, &quote_metachars(input), COMMENT_SUFFIX].concat();
        encrypt_aes_128_cbc(&plaintext, &self.key, &self.iv)
    }

    pub fn is_admin(&self, ciphertext: &[u8]) -> Result<bool, InvalidPadding> {
        let plaintext = decrypt_aes_128_cbc(ciphertext, &self.key, &self.iv)?;
        Ok(plaintext
            .windows(ADMIN_TOKEN.len())
            .any(|window| window == ADMIN_TOKEN))
    }
}

/// Wrap `;` and `=` in double quotes.
pub(crate) fn quote_metachars(input: &[u8]) -> Vec<u8> {
    let mut quoted = Vec::with_capacity(input.len());
    for &byte in input {
        if byte == b';' || byte == b'=' {
            quoted.extend_from_slice(&[b'"', byte, b'"']);
        } else {
            quoted.push(byte);
        }
    }
    quoted
}
