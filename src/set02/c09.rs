/// Implement PKCS#7 padding
///
/// Input that is already a whole number of blocks gets a full block of
/// padding, so padded data always ends in at least one padding byte.
///
/// # Panics
///
/// If `block_size` is not in `2..=255`; the padding length must fit in a
/// byte.
pub fn pkcs7_pad(bytes: &[u8], block_size: usize) -> Vec<u8> {
    assert!(
        block_size > 1 && block_size < 256,
        "bad pad length: {block_size}"
    );
    let n_pad = block_size - (bytes.len() % block_size);
    let mut out = Vec::with_capacity(bytes.len() + n_pad);
    out.extend_from_slice(bytes);
    out.resize(bytes.len() + n_pad, n_pad as u8);
    out
}
