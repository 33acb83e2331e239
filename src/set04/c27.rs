// Recover the key from CBC with IV=Key
//
// Send C_1 || 0 || C_1. The receiver decrypts
//
//     P'_1 = D(C_1) ⊕ IV,    P'_3 = D(C_1) ⊕ 0,
//
// so P'_1 ⊕ P'_3 = IV, which is the key. All we need is for the receiver to
// show us the plaintext, e.g. in an error about it not being ASCII.
use log::debug;

use crate::aes::BLOCK_SIZE;
use crate::{decrypt_aes_128_cbc_no_unpad, encrypt_aes_128_cbc, maybe_pkcs7_unpad, AttackError};

/// Plaintext with bytes outside 7-bit ASCII. Carries the offending plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidAscii {
    pub plaintext: Vec<u8>,
}

impl std::fmt::Display for InvalidAscii {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "plaintext contains invalid ASCII characters: {}",
            String::from_utf8_lossy(&self.plaintext)
        )
    }
}

impl std::error::Error for InvalidAscii {}

/// CBC under a key that doubles as the IV.
pub struct CbcIvEqKeyOracle {
    key: [u8; 16],
}

impl CbcIvEqKeyOracle {
    pub fn new(key: [u8; 16]) -> Self {
        Self { key }
    }

    pub fn encrypt_ascii(&self, plaintext: &[u8]) -> Result<Vec<u8>, InvalidAscii> {
        if !plaintext.is_ascii() {
            return Err(InvalidAscii {
                plaintext: plaintext.to_vec(),
            });
        }
        Ok(encrypt_aes_128_cbc(plaintext, &self.key, &self.key))
    }

    pub fn decrypt_ascii(&self, ciphertext: &[u8]) -> Result<Vec<u8>, InvalidAscii> {
        let plaintext = decrypt_aes_128_cbc_no_unpad(ciphertext, &self.key, &self.key);
        if !plaintext.is_ascii() {
            return Err(InvalidAscii { plaintext });
        }
        Ok(maybe_pkcs7_unpad(&plaintext).to_vec())
    }
}

/// Extract the key from an oracle using it as the IV, given any ciphertext
/// of at least three blocks it produced.
///
/// # Panics
///
/// If `ciphertext` is shorter than three blocks.
pub fn recover_key_from_iv_eq_key(
    ciphertext: &[u8],
    oracle: &CbcIvEqKeyOracle,
) -> Result<[u8; 16], AttackError> {
    assert!(
        ciphertext.len() >= 3 * BLOCK_SIZE,
        "ciphertext must be at least three blocks long"
    );
    let first_block = &ciphertext[..BLOCK_SIZE];
    let attack_ciphertext = [first_block, &[0u8; BLOCK_SIZE], first_block].concat();

    let plaintext = match oracle.decrypt_ascii(&attack_ciphertext) {
        Err(InvalidAscii { plaintext }) => plaintext,
        Ok(_) => {
            return Err(AttackError::KeyNotRecovered(
                "decrypted message was ASCII compliant".to_string(),
            ))
        }
    };
    debug!("receiver leaked {} bytes of plaintext", plaintext.len());

    let mut key = [0u8; 16];
    key.iter_mut()
        .zip(plaintext[..BLOCK_SIZE].iter().zip(&plaintext[2 * BLOCK_SIZE..]))
        .for_each(|(k, (p1, p3))| *k = p1 ^ p3);
    Ok(key)
}
