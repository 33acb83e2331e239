mod aes;
mod base64;
mod error;
mod set01;
mod set02;
mod set03;
mod set04;

pub use crate::aes::{AesCipher, Block, BlockCipher, BlockMode, BLOCK_SIZE};
pub use crate::base64::{base64_decode, base64_encode};
pub use error::{AttackError, InvalidPadding};

pub use set01::c02::{xor_bytes, xor_in_place};
pub use set01::c03::{brute_force_byte_xor_cipher, score_english, XorCrackResult};
pub use set01::c07::{decrypt_aes_128_ecb, encrypt_aes_128_ecb, EcbDecrypter, EcbEncrypter};
pub use set01::c08::{find_adjacent_matching_blocks, find_matching_block, score_aes_ecb_likelihood};

pub use set02::c09::pkcs7_pad;
pub use set02::c10::{
    decrypt_aes_128_cbc, decrypt_aes_128_cbc_no_unpad, encrypt_aes_128_cbc, CbcDecrypter,
    CbcEncrypter,
};
pub use set02::c11::{detect_aes_mode, random_bytes, random_bytes_with_seed, AesMode, EcbCbcOracle};
pub use set02::c12::{
    byte_at_a_time_aes_ecb_decrypt, detect_block_size, oracle_uses_ecb, EcbSuffixOracle,
    EncryptionOracle,
};
pub use set02::c13::{forge_admin_profile, ProfileOracle, UserProfile};
pub use set02::c14::{
    find_prefix_length, per_call_prefix_byte_at_a_time_aes_ecb_decrypt,
    random_prefix_byte_at_a_time_aes_ecb_decrypt, EcbPerCallPrefixOracle, EcbRandomPrefixOracle,
};
pub use set02::c15::{is_pkcs7_padded, maybe_pkcs7_unpad, pkcs7_unpad, pkcs7_unpad_in_place};
pub use set02::c16::{bitflip_inject_admin, flip_cbc_block, CommentOracle};

pub use set03::c17::{cbc_padding_oracle_attack, injection_pad, CbcPaddingOracle, PaddingOracle};
pub use set03::c18::{aes_128_ctr, keystream_range, Ctr};
pub use set03::c19::{apply_keystream, guess_fixed_nonce_ctr_keystream};
pub use set03::c20::break_fixed_nonce_ctr_statistically;

pub use set04::c25::{edit_aes_ctr_ciphertext, recover_ctr_edit_oracle_plaintext, CtrEditOracle};
pub use set04::c26::{ctr_bitflip_inject_admin, flip_ctr_bytes, CtrCommentOracle};
pub use set04::c27::{recover_key_from_iv_eq_key, CbcIvEqKeyOracle, InvalidAscii};
