// Byte-at-a-time ECB decryption (Harder)
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::aes::BLOCK_SIZE;
use crate::set02::c12::{crack_unknown_suffix, detect_block_size, oracle_uses_ecb};
use crate::{encrypt_aes_128_ecb, find_adjacent_matching_blocks, AttackError, EncryptionOracle};

const MAX_PREFIX_LEN: usize = 4 * BLOCK_SIZE;
const MAX_MARKER_ATTEMPTS: usize = 512;
const MARKER_HEAD: u8 = 0x00;
const MARKER_TAIL: u8 = 0xff;
const PREFIX_FILLERS: [u8; 4] = [0x00, 0xff, b'A', 0x80];

/// AES-128-ECB(random-prefix || input || unknown-bytes, key), where the
/// prefix is drawn once from `seed` and reused for every call.
pub struct EcbRandomPrefixOracle {
    key: [u8; 16],
    prefix: Vec<u8>,
    unknown_bytes: Vec<u8>,
}

impl EcbRandomPrefixOracle {
    pub fn new(key: [u8; 16], seed: u64, unknown_bytes: Vec<u8>) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self {
            key,
            prefix: random_prefix(&mut rng),
            unknown_bytes,
        }
    }
}

impl EncryptionOracle for EcbRandomPrefixOracle {
    fn encrypt(&self, input: &[u8]) -> Vec<u8> {
        let plaintext = [self.prefix.as_slice(), input, &self.unknown_bytes].concat();
        encrypt_aes_128_ecb(&plaintext, &self.key)
    }
}

/// Like [`EcbRandomPrefixOracle`] but the prefix, length included, is
/// regenerated on every call.
pub struct EcbPerCallPrefixOracle {
    key: [u8; 16],
    unknown_bytes: Vec<u8>,
    rng: Mutex<StdRng>,
}

impl EcbPerCallPrefixOracle {
    pub fn new(key: [u8; 16], seed: u64, unknown_bytes: Vec<u8>) -> Self {
        Self {
            key,
            unknown_bytes,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl EncryptionOracle for EcbPerCallPrefixOracle {
    fn encrypt(&self, input: &[u8]) -> Vec<u8> {
        let prefix = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            random_prefix(&mut *rng)
        };
        let plaintext = [prefix.as_slice(), input, &self.unknown_bytes].concat();
        encrypt_aes_128_ecb(&plaintext, &self.key)
    }
}

fn random_prefix<R: RngCore>(rng: &mut R) -> Vec<u8> {
    let mut prefix = vec![0u8; rng.gen_range(0..=MAX_PREFIX_LEN)];
    rng.fill_bytes(&mut prefix);
    prefix
}

pub fn random_prefix_byte_at_a_time_aes_ecb_decrypt<O>(oracle: &O) -> Result<Vec<u8>, AttackError>
where
    O: EncryptionOracle + ?Sized,
{
    let block_size = detect_block_size(oracle)?;
    if !oracle_uses_ecb(oracle, block_size) {
        return Err(AttackError::NotEcb);
    }

    let prefix_len = find_prefix_length(oracle, block_size)?;
    let alignment = (block_size - prefix_len % block_size) % block_size;
    debug!("prefix is {prefix_len} bytes, aligning with {alignment} filler bytes");

    crack_unknown_suffix(oracle, block_size, prefix_len, alignment)
}

/// Number of bytes the oracle puts in front of attacker input.
///
/// Two queries that differ only in their first byte first differ in the
/// block holding that byte. From there, grow a run of filler until two
/// adjacent ciphertext blocks are equal: the `e` extra filler bytes it took
/// are the bytes that topped up the last prefix block.
///
/// Filler-valued bytes at the end of the prefix or the start of the suffix
/// extend the run and shift the answer down or up. At most one filler byte
/// is fooled each way, so we try four and take the length at least two
/// agree on.
pub fn find_prefix_length<O>(oracle: &O, block_size: usize) -> Result<usize, AttackError>
where
    O: EncryptionOracle + ?Sized,
{
    let c1 = oracle.encrypt(b"0");
    let c2 = oracle.encrypt(b"1");
    let first_input_block = c1
        .chunks(block_size)
        .zip(c2.chunks(block_size))
        .position(|(x, y)| x != y)
        .ok_or(AttackError::PrefixNotFound)?;

    let candidates: Vec<usize> = PREFIX_FILLERS
        .iter()
        .filter_map(|&filler| {
            prefix_length_with_filler(oracle, block_size, first_input_block, filler)
        })
        .collect();
    candidates
        .iter()
        .copied()
        .find(|len| candidates.iter().filter(|&c| c == len).count() >= 2)
        .ok_or_else(|| {
            debug!("no agreement between prefix length candidates {candidates:?}");
            AttackError::PrefixNotFound
        })
}

fn prefix_length_with_filler<O>(
    oracle: &O,
    block_size: usize,
    first_input_block: usize,
    filler: u8,
) -> Option<usize>
where
    O: EncryptionOracle + ?Sized,
{
    // The first full block of input starts in, or right after, the block
    // where the input starts.
    let earliest = first_input_block * block_size;
    let latest = earliest + block_size;
    (0..block_size).find_map(|extra| {
        let ciphertext = oracle.encrypt(&vec![filler; 2 * block_size + extra]);
        find_adjacent_matching_blocks(&ciphertext, block_size, first_input_block)
            .filter(|offset| (earliest..=latest).contains(offset))
            .and_then(|offset| offset.checked_sub(extra))
    })
}

/// Recover the secret behind an oracle that draws a new prefix for every
/// query.
///
/// Each query is sent behind two marker blocks, `MARKER_HEAD` repeated then
/// `MARKER_TAIL` repeated, and resent until the marker lands on a block
/// boundary. Everything after the marker is then what a prefix-free oracle
/// would have returned, so the simple attack applies. Assumes AES's block
/// size, since the ciphertext length is no longer a function of the input.
pub fn per_call_prefix_byte_at_a_time_aes_ecb_decrypt<O>(
    oracle: &O,
) -> Result<Vec<u8>, AttackError>
where
    O: EncryptionOracle + ?Sized,
{
    let aligned = AlignedMarkerOracle::new(oracle, BLOCK_SIZE)?;
    let result = crack_unknown_suffix(&aligned, BLOCK_SIZE, 0, 0);
    if aligned.failures.load(Ordering::Relaxed) > 0 {
        return Err(AttackError::MarkerNotAligned {
            attempts: MAX_MARKER_ATTEMPTS,
        });
    }
    result
}

struct AlignedMarkerOracle<'a, O: ?Sized> {
    inner: &'a O,
    block_size: usize,
    head: Vec<u8>,
    tail: Vec<u8>,
    failures: AtomicUsize,
}

impl<'a, O> AlignedMarkerOracle<'a, O>
where
    O: EncryptionOracle + ?Sized,
{
    fn new(inner: &'a O, block_size: usize) -> Result<Self, AttackError> {
        Ok(Self {
            inner,
            block_size,
            head: marker_ciphertext(inner, block_size, MARKER_HEAD)?,
            tail: marker_ciphertext(inner, block_size, MARKER_TAIL)?,
            failures: AtomicUsize::new(0),
        })
    }

    fn marker_end(&self, ciphertext: &[u8]) -> Option<usize> {
        let blocks: Vec<&[u8]> = ciphertext.chunks_exact(self.block_size).collect();
        blocks
            .windows(2)
            .position(|pair| pair[0] == self.head.as_slice() && pair[1] == self.tail.as_slice())
            .map(|i| (i + 2) * self.block_size)
    }
}

impl<O> EncryptionOracle for AlignedMarkerOracle<'_, O>
where
    O: EncryptionOracle + ?Sized,
{
    fn encrypt(&self, input: &[u8]) -> Vec<u8> {
        let query = [
            vec![MARKER_HEAD; self.block_size].as_slice(),
            vec![MARKER_TAIL; self.block_size].as_slice(),
            input,
        ]
        .concat();
        for _ in 0..MAX_MARKER_ATTEMPTS {
            // Another query already gave up.
            if self.failures.load(Ordering::Relaxed) > 0 {
                return Vec::new();
            }
            let ciphertext = self.inner.encrypt(&query);
            if let Some(end) = self.marker_end(&ciphertext) {
                return ciphertext[end..].to_vec();
            }
        }
        warn!("marker not aligned after {MAX_MARKER_ATTEMPTS} attempts");
        self.failures.fetch_add(1, Ordering::Relaxed);
        Vec::new()
    }
}

/// Ciphertext of one block of `byte`. Three blocks of it always hold two
/// aligned copies, wherever the prefix ends.
fn marker_ciphertext<O>(oracle: &O, block_size: usize, byte: u8) -> Result<Vec<u8>, AttackError>
where
    O: EncryptionOracle + ?Sized,
{
    let ciphertext = oracle.encrypt(&vec![byte; 3 * block_size]);
    let offset =
        find_adjacent_matching_blocks(&ciphertext, block_size, 0).ok_or(AttackError::NotEcb)?;
    Ok(ciphertext[offset..offset + block_size].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{base64_decode, encrypt_aes_128_cbc, random_bytes_with_seed};

    use rstest::rstest;

    const UNKNOWN_STRING: &str = "Um9sbGluJyBpbiBteSA1LjAKV2l0aCBteSByYWctdG9wIGRvd24gc28gbXkg\
aGFpciBjYW4gYmxvdwpUaGUgZ2lybGllcyBvbiBzdGFuZGJ5IHdhdmluZyBq\
dXN0IHRvIHNheSBoaQpEaWQgeW91IHN0b3A/IE5vLCBJIGp1c3QgZHJvdmUg\
YnkK";

    #[rstest]
    #[case("", 0)]
    #[case("z", 1)]
    #[case("zomg", 4)]
    #[case("zomgwtf", 7)]
    #[case("zomgwtfbbq", 10)]
    #[case("oiajefoijewoifaoijfoasjdfoijsaodijfoijfioaejwfoiawjoijaofajio", 61)]
    #[case("oiajefoijewoifaoijfoasjdfoijsaodijfoijfioaejwfoiawjoijaofajioq", 62)]
    fn find_prefix_length_returns_prefix_length(#[case] prefix: &str, #[case] expected: usize) {
        let key = random_bytes_with_seed::<16>(101);
        let oracle = |input: &[u8]| -> Vec<u8> {
            let plaintext = [prefix.as_bytes(), input, b"some trailing secret".as_slice()].concat();
            encrypt_aes_128_ecb(&plaintext, &key)
        };

        assert_eq!(find_prefix_length(&oracle, 16), Ok(expected));
    }

    #[rstest]
    #[case([b"abcdefghij".as_slice(), &[0u8; 9]].concat(), b"suffix".to_vec(), 19)]
    #[case(b"abcdefghij".to_vec(), [[0xffu8; 7].as_slice(), b"suffix"].concat(), 10)]
    #[case([b"abc".as_slice(), &[0u8; 20]].concat(), [[0xffu8; 9].as_slice(), b"suffix"].concat(), 23)]
    fn find_prefix_length_ignores_filler_lookalikes(
        #[case] prefix: Vec<u8>,
        #[case] suffix: Vec<u8>,
        #[case] expected: usize,
    ) {
        let key = random_bytes_with_seed::<16>(101);
        let oracle = |input: &[u8]| -> Vec<u8> {
            encrypt_aes_128_ecb(&[prefix.as_slice(), input, &suffix].concat(), &key)
        };

        assert_eq!(find_prefix_length(&oracle, 16), Ok(expected));
    }

    #[test]
    fn random_prefix_byte_at_a_time_aes_ecb_decrypt_decrypts_message_with_oracle() {
        let _ = simple_logger::init_with_level(log::Level::Debug);
        let key = random_bytes_with_seed::<16>(101);
        let decoded_secret = base64_decode(UNKNOWN_STRING).unwrap();

        for seed in [101, 102, 103] {
            let oracle = EcbRandomPrefixOracle::new(key, seed, decoded_secret.clone());

            let secret_bytes = random_prefix_byte_at_a_time_aes_ecb_decrypt(&oracle).unwrap();

            assert_eq!(secret_bytes, decoded_secret, "seed {seed}");
        }
    }

    #[test]
    fn random_prefix_byte_at_a_time_aes_ecb_decrypt_rejects_cbc_oracle() {
        let key = random_bytes_with_seed::<16>(101);
        let oracle = |input: &[u8]| -> Vec<u8> {
            let plaintext = [b"prefix".as_slice(), input, b"secret".as_slice()].concat();
            encrypt_aes_128_cbc(&plaintext, &key, &[0u8; 16])
        };

        assert_eq!(
            random_prefix_byte_at_a_time_aes_ecb_decrypt(&oracle),
            Err(AttackError::NotEcb)
        );
    }

    #[test]
    fn per_call_prefix_oracle_changes_prefix_between_calls() {
        let key = random_bytes_with_seed::<16>(101);
        let oracle = EcbPerCallPrefixOracle::new(key, 101, b"secret".to_vec());

        let lengths: Vec<usize> = (0..20).map(|_| oracle.encrypt(b"").len()).collect();

        assert!(lengths.iter().any(|&len| len != lengths[0]));
    }

    #[test]
    fn per_call_prefix_byte_at_a_time_aes_ecb_decrypt_decrypts_message_with_oracle() {
        let key = random_bytes_with_seed::<16>(101);
        let decoded_secret = base64_decode(UNKNOWN_STRING).unwrap();
        let oracle = EcbPerCallPrefixOracle::new(key, 101, decoded_secret.clone());

        let secret_bytes = per_call_prefix_byte_at_a_time_aes_ecb_decrypt(&oracle).unwrap();

        assert_eq!(secret_bytes, decoded_secret);
    }

    #[test]
    fn per_call_prefix_byte_at_a_time_aes_ecb_decrypt_rejects_cbc_oracle() {
        let key = random_bytes_with_seed::<16>(101);
        let oracle = |input: &[u8]| -> Vec<u8> {
            encrypt_aes_128_cbc(&[input, b"secret".as_slice()].concat(), &key, &[0u8; 16])
        };

        assert!(matches!(
            per_call_prefix_byte_at_a_time_aes_ecb_decrypt(&oracle),
            Err(AttackError::NotEcb)
        ));
    }

    #[test]
    fn per_call_prefix_byte_at_a_time_aes_ecb_decrypt_stops_once_marker_never_aligns() {
        let key = random_bytes_with_seed::<16>(101);
        let calls = AtomicUsize::new(0);
        // Aligned for the marker blocks and the first query, off by one after.
        let oracle = |input: &[u8]| -> Vec<u8> {
            let prefix: &[u8] = if calls.fetch_add(1, Ordering::SeqCst) < 3 {
                b""
            } else {
                b"x"
            };
            encrypt_aes_128_ecb(&[prefix, input, b"secret".as_slice()].concat(), &key)
        };

        let result = per_call_prefix_byte_at_a_time_aes_ecb_decrypt(&oracle);

        assert_eq!(
            result,
            Err(AttackError::MarkerNotAligned {
                attempts: MAX_MARKER_ATTEMPTS
            })
        );
        let max_calls = (rayon::current_num_threads() + 1) * MAX_MARKER_ATTEMPTS + 256 + 3;
        assert!(calls.load(Ordering::SeqCst) <= max_calls);
    }
}
