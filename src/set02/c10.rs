/// Implement CBC mode
///
/// Encryption: C_i = E(P_i ⊕ C_{i-1}), decryption: P_i = D(C_i) ⊕ C_{i-1},
/// with C_0 the IV. Both directions carry the last ciphertext block along as
/// the running IV, so a stream fed in pieces gives the same result as one
/// big call.
use crate::aes::{assert_full_blocks, AesCipher, Block, BlockCipher, BlockMode, BLOCK_SIZE};
use crate::{pkcs7_pad, pkcs7_unpad, xor_in_place, InvalidPadding};

pub struct CbcEncrypter<C> {
    cipher: C,
    iv: Block,
}

pub struct CbcDecrypter<C> {
    cipher: C,
    iv: Block,
}

impl<C: BlockCipher> CbcEncrypter<C> {
    pub fn new(cipher: C, iv: &Block) -> Self {
        Self { cipher, iv: *iv }
    }
}

impl<C: BlockCipher> CbcDecrypter<C> {
    pub fn new(cipher: C, iv: &Block) -> Self {
        Self { cipher, iv: *iv }
    }
}

impl<C: BlockCipher> BlockMode for CbcEncrypter<C> {
    fn crypt_blocks(&mut self, dst: &mut [u8], src: &[u8]) {
        assert_full_blocks(dst, src);
        for (out, block) in dst.chunks_exact_mut(BLOCK_SIZE).zip(src.chunks_exact(BLOCK_SIZE)) {
            let mut buf: Block = block.try_into().expect("chunk is one block");
            xor_in_place(&mut buf, &self.iv);
            self.cipher.encrypt_block(&mut buf);
            out.copy_from_slice(&buf);
            self.iv = buf;
        }
    }
}

impl<C: BlockCipher> BlockMode for CbcDecrypter<C> {
    fn crypt_blocks(&mut self, dst: &mut [u8], src: &[u8]) {
        assert_full_blocks(dst, src);
        for (out, block) in dst.chunks_exact_mut(BLOCK_SIZE).zip(src.chunks_exact(BLOCK_SIZE)) {
            let ciphertext_block: Block = block.try_into().expect("chunk is one block");
            let mut buf = ciphertext_block;
            self.cipher.decrypt_block(&mut buf);
            xor_in_place(&mut buf, &self.iv);
            out.copy_from_slice(&buf);
            // The original ciphertext block, not the decrypted one.
            self.iv = ciphertext_block;
        }
    }
}

/// Pad then encrypt with AES-128-CBC.
pub fn encrypt_aes_128_cbc(plaintext: &[u8], key: &[u8; 16], iv: &[u8; 16]) -> Vec<u8> {
    let padded = pkcs7_pad(plaintext, BLOCK_SIZE);
    let mut ciphertext = vec![0u8; padded.len()];
    CbcEncrypter::new(AesCipher::new(key), iv).crypt_blocks(&mut ciphertext, &padded);
    ciphertext
}

/// Decrypt AES-128-CBC and strip the padding.
pub fn decrypt_aes_128_cbc(
    ciphertext: &[u8],
    key: &[u8; 16],
    iv: &[u8; 16],
) -> Result<Vec<u8>, InvalidPadding> {
    let plaintext = decrypt_aes_128_cbc_no_unpad(ciphertext, key, iv);
    Ok(pkcs7_unpad(&plaintext)?.to_vec())
}

/// Decrypt AES-128-CBC and leave whatever padding there is in place.
pub fn decrypt_aes_128_cbc_no_unpad(ciphertext: &[u8], key: &[u8; 16], iv: &[u8; 16]) -> Vec<u8> {
    let mut plaintext = vec![0u8; ciphertext.len()];
    CbcDecrypter::new(AesCipher::new(key), iv).crypt_blocks(&mut plaintext, ciphertext);
    plaintext
}
