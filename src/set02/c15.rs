// PKCS#7 padding validation
use crate::InvalidPadding;

/// Strip PKCS#7 padding, or fail if there is none.
pub fn pkcs7_unpad(bytes: &[u8]) -> Result<&[u8], InvalidPadding> {
    let n_pad = padding_len(bytes).ok_or(InvalidPadding)?;
    Ok(&bytes[..bytes.len() - n_pad])
}

pub fn pkcs7_unpad_in_place(bytes: &mut Vec<u8>) -> Result<(), InvalidPadding> {
    let n_pad = padding_len(bytes).ok_or(InvalidPadding)?;
    bytes.truncate(bytes.len() - n_pad);
    Ok(())
}

/// Strip the padding if there is valid padding, otherwise return `bytes`
/// untouched.
pub fn maybe_pkcs7_unpad(bytes: &[u8]) -> &[u8] {
    pkcs7_unpad(bytes).unwrap_or(bytes)
}

pub fn is_pkcs7_padded(bytes: &[u8]) -> bool {
    padding_len(bytes).is_some()
}

// The block length is not checked: callers hand over whole decrypted
// buffers, which the block modes already guarantee are aligned.
fn padding_len(bytes: &[u8]) -> Option<usize> {
    let n_pad = *bytes.last()?;
    if n_pad == 0 || n_pad as usize > bytes.len() {
        return None;
    }
    let padding = &bytes[(bytes.len() - n_pad as usize)..];
    if padding.iter().all(|&el| el == n_pad) {
        return Some(n_pad as usize);
    }
    None
}
