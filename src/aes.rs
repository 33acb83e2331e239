// The AES-128 block primitive and the block-mode contract built on top of it.
//
// The cipher itself comes from the `aes` crate and is treated as an opaque
// `Block -> Block` permutation. Everything interesting (chaining, counters,
// padding) happens in the mode engines that sit on top of `BlockCipher`.
use aes::cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes128;

pub const BLOCK_SIZE: usize = 16;

pub type Block = [u8; BLOCK_SIZE];

/// A fixed-size block permutation.
pub trait BlockCipher {
    fn encrypt_block(&self, block: &mut Block);

    fn decrypt_block(&self, block: &mut Block);
}

/// A block mode that transforms `src` into `dst`.
///
/// Implementations panic if `dst` is shorter than `src`. Modes that only
/// work on whole blocks (ECB, CBC) also panic if `src` is not a multiple of
/// [`BLOCK_SIZE`]. Both are programming errors, not runtime conditions.
pub trait BlockMode {
    fn crypt_blocks(&mut self, dst: &mut [u8], src: &[u8]);
}

pub struct AesCipher {
    cipher: Aes128,
}

impl AesCipher {
    pub fn new(key: &[u8; BLOCK_SIZE]) -> Self {
        Self {
            cipher: Aes128::new(GenericArray::from_slice(key)),
        }
    }
}

impl BlockCipher for AesCipher {
    fn encrypt_block(&self, block: &mut Block) {
        self.cipher
            .encrypt_block(GenericArray::from_mut_slice(block.as_mut_slice()));
    }

    fn decrypt_block(&self, block: &mut Block) {
        self.cipher
            .decrypt_block(GenericArray::from_mut_slice(block.as_mut_slice()));
    }
}

pub(crate) fn assert_full_blocks(dst: &[u8], src: &[u8]) {
    assert!(
        src.len() % BLOCK_SIZE == 0,
        "crypto/cipher: input not full blocks"
    );
    assert_output_fits(dst, src);
}

pub(crate) fn assert_output_fits(dst: &[u8], src: &[u8]) {
    assert!(
        dst.len() >= src.len(),
        "crypto/cipher: output smaller than input"
    );
}
