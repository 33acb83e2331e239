// Implement CTR, the stream cipher mode
//
// The keystream is E(nonce || counter) for counter = 0, 1, 2, ..., both
// 64-bit little endian. Block `n` of keystream depends only on `n`, so any
// range of it can be produced without touching the rest.
use crate::aes::{assert_output_fits, AesCipher, Block, BlockCipher, BlockMode, BLOCK_SIZE};

pub struct Ctr<C> {
    cipher: C,
    nonce: u64,
    position: usize,
}

impl<C: BlockCipher> Ctr<C> {
    pub fn new(cipher: C, nonce: u64) -> Self {
        Self {
            cipher,
            nonce,
            position: 0,
        }
    }

    /// Keystream for `offset..offset + length`. Does not move the stream.
    pub fn keystream_bytes(&self, offset: usize, length: usize) -> Vec<u8> {
        keystream_range(&self.cipher, self.nonce, offset, length)
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

impl<C: BlockCipher> BlockMode for Ctr<C> {
    fn crypt_blocks(&mut self, dst: &mut [u8], src: &[u8]) {
        assert_output_fits(dst, src);
        let keystream = keystream_range(&self.cipher, self.nonce, self.position, src.len());
        dst.iter_mut()
            .zip(src.iter().zip(keystream))
            .for_each(|(out, (s, k))| *out = s ^ k);
        self.position += src.len();
    }
}

/// Keystream bytes `offset..offset + length` for `nonce`.
pub fn keystream_range<C>(cipher: &C, nonce: u64, offset: usize, length: usize) -> Vec<u8>
where
    C: BlockCipher + ?Sized,
{
    let first_block = offset / BLOCK_SIZE;
    let skip = offset % BLOCK_SIZE;
    let n_blocks = (skip + length).div_ceil(BLOCK_SIZE);

    let mut keystream = Vec::with_capacity(n_blocks * BLOCK_SIZE);
    for counter in first_block..(first_block + n_blocks) {
        let mut block = counter_block(nonce, counter as u64);
        cipher.encrypt_block(&mut block);
        keystream.extend_from_slice(&block);
    }
    keystream.drain(..skip);
    keystream.truncate(length);
    keystream
}

fn counter_block(nonce: u64, counter: u64) -> Block {
    let mut block = [0u8; BLOCK_SIZE];
    block[..8].copy_from_slice(&nonce.to_le_bytes());
    block[8..].copy_from_slice(&counter.to_le_bytes());
    block
}

/// Encrypt or decrypt `message` with AES-128-CTR; the two are the same
/// operation.
pub fn aes_128_ctr(message: &[u8], key: &[u8; 16], nonce: u64) -> Vec<u8> {
    let mut output = vec![0u8; message.len()];
    Ctr::new(AesCipher::new(key), nonce).crypt_blocks(&mut output, message);
    output
}
