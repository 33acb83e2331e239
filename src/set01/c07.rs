// AES in ECB mode
//
// Each block is encrypted on its own, so equal plaintext blocks always give
// equal ciphertext blocks. Nothing is carried from one block to the next.
use crate::aes::{assert_full_blocks, AesCipher, Block, BlockCipher, BlockMode, BLOCK_SIZE};
use crate::{pkcs7_pad, pkcs7_unpad, InvalidPadding};

pub struct EcbEncrypter<C> {
    cipher: C,
}

pub struct EcbDecrypter<C> {
    cipher: C,
}

impl<C: BlockCipher> EcbEncrypter<C> {
    pub fn new(cipher: C) -> Self {
        Self { cipher }
    }
}

impl<C: BlockCipher> EcbDecrypter<C> {
    pub fn new(cipher: C) -> Self {
        Self { cipher }
    }
}

impl<C: BlockCipher> BlockMode for EcbEncrypter<C> {
    fn crypt_blocks(&mut self, dst: &mut [u8], src: &[u8]) {
        assert_full_blocks(dst, src);
        for (out, block) in dst.chunks_exact_mut(BLOCK_SIZE).zip(src.chunks_exact(BLOCK_SIZE)) {
            let mut buf: Block = block.try_into().expect("chunk is one block");
            self.cipher.encrypt_block(&mut buf);
            out.copy_from_slice(&buf);
        }
    }
}

impl<C: BlockCipher> BlockMode for EcbDecrypter<C> {
    fn crypt_blocks(&mut self, dst: &mut [u8], src: &[u8]) {
        assert_full_blocks(dst, src);
        for (out, block) in dst.chunks_exact_mut(BLOCK_SIZE).zip(src.chunks_exact(BLOCK_SIZE)) {
            let mut buf: Block = block.try_into().expect("chunk is one block");
            self.cipher.decrypt_block(&mut buf);
            out.copy_from_slice(&buf);
        }
    }
}

/// Pad then encrypt with AES-128-ECB.
pub fn encrypt_aes_128_ecb(plaintext: &[u8], key: &[u8; 16]) -> Vec<u8> {
    let padded = pkcs7_pad(plaintext, BLOCK_SIZE);
    let mut ciphertext = vec![0u8; padded.len()];
    EcbEncrypter::new(AesCipher::new(key)).crypt_blocks(&mut ciphertext, &padded);
    ciphertext
}

/// Decrypt AES-128-ECB and strip the padding.
pub fn decrypt_aes_128_ecb(ciphertext: &[u8], key: &[u8; 16]) -> Result<Vec<u8>, InvalidPadding> {
    let mut plaintext = vec![0u8; ciphertext.len()];
    EcbDecrypter::new(AesCipher::new(key)).crypt_blocks(&mut plaintext, ciphertext);
    Ok(pkcs7_unpad(&plaintext)?.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    const NIST_KEY: &str = "2b7e151628aed2a6abf7158809cf4f3c";

    fn nist_key() -> [u8; 16] {
        hex::decode(NIST_KEY).unwrap().try_into().unwrap()
    }

    #[test]
    fn ecb_encrypter_matches_sp_800_38a_vector() {
        let plaintext =
            hex::decode("6bc1bee22e409f96e93d7e117393172aae2d8a571e03ac9c9eb76fac45af8e51")
                .unwrap();
        let mut ciphertext = vec![0u8; plaintext.len()];

        EcbEncrypter::new(AesCipher::new(&nist_key())).crypt_blocks(&mut ciphertext, &plaintext);

        assert_eq!(
            hex::encode(ciphertext),
            "3ad77bb40d7a3660a89ecaf32466ef97f5d3d58503b9699de785895a96fdbaaf"
        );
    }

    #[test]
    fn ecb_decrypter_inverts_encrypter() {
        let plaintext = b"YELLOW SUBMARINEYELLOW SUBMARINE";
        let mut ciphertext = [0u8; 32];
        let mut decrypted = [0u8; 32];

        EcbEncrypter::new(AesCipher::new(&nist_key())).crypt_blocks(&mut ciphertext, plaintext);
        EcbDecrypter::new(AesCipher::new(&nist_key())).crypt_blocks(&mut decrypted, &ciphertext);

        assert_eq!(&decrypted, plaintext);
        // Same plaintext block, same ciphertext block.
        assert_eq!(ciphertext[..16], ciphertext[16..]);
    }

    #[rstest]
    #[case(b"")]
    #[case(b"a")]
    #[case(b"YELLOW SUBMARINE")]
    #[case(b"I'm back and I'm ringin' the bell")]
    fn ecb_round_trip_returns_plaintext(#[case] plaintext: &[u8]) {
        let key = *b"YELLOW SUBMARINE";

        let ciphertext = encrypt_aes_128_ecb(plaintext, &key);
        let decrypted = decrypt_aes_128_ecb(&ciphertext, &key).unwrap();

        assert_eq!(ciphertext.len() % BLOCK_SIZE, 0);
        assert!(ciphertext.len() > plaintext.len());
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    #[should_panic(expected = "input not full blocks")]
    fn ecb_panics_on_partial_block() {
        let mut dst = [0u8; 32];
        EcbEncrypter::new(AesCipher::new(&nist_key())).crypt_blocks(&mut dst, &[0u8; 17]);
    }

    #[test]
    #[should_panic(expected = "output smaller than input")]
    fn ecb_panics_on_short_output() {
        let mut dst = [0u8; 16];
        EcbDecrypter::new(AesCipher::new(&nist_key())).crypt_blocks(&mut dst, &[0u8; 32]);
    }
}
