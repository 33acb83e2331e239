// CTR bitflipping
//
// C = K ⊕ P for keystream K, so C ⊕ P ⊕ F decrypts to F. Unlike CBC, nothing
// else in the message is disturbed.
use log::debug;

use crate::set02::c16::{quote_metachars, ADMIN_TOKEN, COMMENT_PREFIX, COMMENT_SUFFIX};
use crate::{aes_128_ctr, AttackError};

/// Edit a CTR ciphertext so the plaintext at `offset` reads `desired` where
/// it used to read `known`.
///
/// # Panics
///
/// If `known` and `desired` differ in length or run past the ciphertext.
pub fn flip_ctr_bytes(ciphertext: &[u8], offset: usize, known: &[u8], desired: &[u8]) -> Vec<u8> {
    assert_eq!(known.len(), desired.len(), "known and desired differ in length");
    assert!(offset + known.len() <= ciphertext.len(), "flip runs past the ciphertext");

    let mut flipped = ciphertext.to_vec();
    flipped[offset..(offset + known.len())]
        .iter_mut()
        .zip(known.iter().zip(desired))
        .for_each(|(c, (k, d))| *c ^= k ^ d);
    flipped
}

pub struct CtrCommentOracle {
    key: [u8; 16],
    nonce: u64,
}

impl CtrCommentOracle {
    pub fn new(key: [u8; 16], nonce: u64) -> Self {
        Self { key, nonce }
    }

    pub fn encrypted_comment(&self, input: &[u8]) -> Vec<u8> {
        let plaintext = [COMMENT_PREFIX, &quote_metachars(input), COMMENT_SUFFIX].concat();
        aes_128_ctr(&plaintext, &self.key, self.nonce)
    }

    pub fn is_admin(&self, ciphertext: &[u8]) -> bool {
        let plaintext = aes_128_ctr(ciphertext, &self.key, self.nonce);
        plaintext
            .windows(ADMIN_TOKEN.len())
            .any(|window| window == ADMIN_TOKEN)
    }
}

/// Forge a comment ciphertext containing `;admin=true;`.
///
/// The attacker doesn't need to know the prefix: two queries that differ in
/// their first byte first differ where the user data starts.
pub fn ctr_bitflip_inject_admin(oracle: &CtrCommentOracle) -> Result<Vec<u8>, AttackError> {
    let c_0 = oracle.encrypted_comment(b"0");
    let c_1 = oracle.encrypted_comment(b"1");
    let user_data_start = c_0
        .iter()
        .zip(c_1.iter())
        .position(|(a, b)| a != b)
        .ok_or(AttackError::UserDataNotFound)?;
    debug!("user data starts at byte {user_data_start}");

    let placeholder = b"A".repeat(ADMIN_TOKEN.len());
    let ciphertext = oracle.encrypted_comment(&placeholder);
    Ok(flip_ctr_bytes(
        &ciphertext,
        user_data_start,
        &placeholder,
        ADMIN_TOKEN,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::random_bytes_with_seed;

    fn oracle() -> CtrCommentOracle {
        CtrCommentOracle::new(random_bytes_with_seed::<16>(101), 102)
    }

    #[test]
    fn ctr_bitflip_inject_admin_forges_admin_comment() {
        let oracle = oracle();

        let admin_forgery = ctr_bitflip_inject_admin(&oracle).unwrap();

        assert!(oracle.is_admin(&admin_forgery));
    }

    #[test]
    fn encrypted_comment_cannot_carry_admin_token() {
        let oracle = oracle();

        let ciphertext = oracle.encrypted_comment(b";admin=true;");

        assert!(!oracle.is_admin(&ciphertext));
        assert_eq!(
            ciphertext.len(),
            COMMENT_PREFIX.len() + 18 + COMMENT_SUFFIX.len()
        );
    }

    #[test]
    fn flip_ctr_bytes_leaves_other_bytes_alone() {
        let key = random_bytes_with_seed::<16>(101);
        let plaintext = b"the quick brown fox jumps over the lazy dog";
        let ciphertext = aes_128_ctr(plaintext, &key, 5);

        let flipped = flip_ctr_bytes(&ciphertext, 16, b"fox", b"cat");

        assert_eq!(
            aes_128_ctr(&flipped, &key, 5),
            b"the quick brown cat jumps over the lazy dog"
        );
    }
}
