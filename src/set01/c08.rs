// Detect AES in ECB mode

use std::collections::HashMap;

/// Return a score for how likely some bytes were encrypted using ECB.
///
/// The score is the ratio of repeated blocks to blocks. Identical plaintext
/// blocks encrypt to identical ciphertext blocks under ECB, so structured
/// plaintext leaves repeats behind. A chained mode almost never does.
pub fn score_aes_ecb_likelihood(bytes: &[u8], block_size: usize) -> f64 {
    let n_blocks = bytes.len() / block_size;
    if n_blocks == 0 {
        return 0.;
    }
    let mut seen: HashMap<&[u8], usize> = HashMap::new();
    let n_repetitions = bytes
        .chunks_exact(block_size)
        .filter(|block| {
            let count = seen.entry(*block).or_insert(0);
            *count += 1;
            *count > 1
        })
        .count();
    n_repetitions as f64 / n_blocks as f64
}

/// Byte offset of the first block that appears again elsewhere in `bytes`.
pub fn find_matching_block(bytes: &[u8], block_size: usize) -> Option<usize> {
    let blocks: Vec<&[u8]> = bytes.chunks_exact(block_size).collect();
    blocks
        .iter()
        .enumerate()
        .find(|(i, block)| {
            blocks
                .iter()
                .enumerate()
                .any(|(j, other)| *i != j && block == &other)
        })
        .map(|(i, _)| i * block_size)
}

/// Byte offset of the first block that is immediately followed by a copy of
/// itself, searching from block index `start_block`.
pub fn find_adjacent_matching_blocks(
    bytes: &[u8],
    block_size: usize,
    start_block: usize,
) -> Option<usize> {
    let blocks: Vec<&[u8]> = bytes.chunks_exact(block_size).collect();
    blocks
        .windows(2)
        .enumerate()
        .skip(start_block)
        .find(|(_, pair)| pair[0] == pair[1])
        .map(|(i, _)| i * block_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{encrypt_aes_128_cbc, encrypt_aes_128_ecb};

    const KEY: &[u8; 16] = b"YELLOW SUBMARINE";

    #[test]
    fn score_aes_ecb_likelihood_separates_ecb_from_cbc() {
        let plaintext = b"SIXTEEN BYTE MSGSIXTEEN BYTE MSGSIXTEEN BYTE MSG".repeat(3);

        let ecb = encrypt_aes_128_ecb(&plaintext, KEY);
        let cbc = encrypt_aes_128_cbc(&plaintext, KEY, &[7u8; 16]);

        assert!(score_aes_ecb_likelihood(&ecb, 16) > 0.5);
        assert_eq!(score_aes_ecb_likelihood(&cbc, 16), 0.);
    }

    #[test]
    fn score_aes_ecb_likelihood_is_zero_for_empty_input() {
        assert_eq!(score_aes_ecb_likelihood(&[], 16), 0.);
    }

    #[test]
    fn find_matching_block_returns_first_repeated_block() {
        let bytes = [b"aaaa".as_slice(), b"bbbb", b"cccc", b"bbbb"].concat();

        assert_eq!(find_matching_block(&bytes, 4), Some(4));
        assert_eq!(find_matching_block(b"aaaabbbbcccc", 4), None);
    }

    #[test]
    fn find_adjacent_matching_blocks_ignores_distant_repeats() {
        let bytes = [b"bbbb".as_slice(), b"aaaa", b"bbbb", b"cccc", b"cccc"].concat();

        assert_eq!(find_adjacent_matching_blocks(&bytes, 4, 0), Some(12));
        assert_eq!(find_adjacent_matching_blocks(&bytes, 4, 4), None);
    }
}
