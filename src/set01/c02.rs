// Fixed XOR

pub fn xor_bytes(buf_a: &[u8], buf_b: &[u8]) -> Result<Vec<u8>, String> {
    if buf_a.len() != buf_b.len() {
        return Err(format!(
            "buffers are not of equal length: {} != {}",
            buf_a.len(),
            buf_b.len()
        ));
    }
    Ok(buf_a.iter().zip(buf_b.iter()).map(|(a, b)| a ^ b).collect())
}

/// XOR `other` into `buf`. Both must have the same length.
pub fn xor_in_place(buf: &mut [u8], other: &[u8]) {
    assert_eq!(buf.len(), other.len(), "xor operands differ in length");
    buf.iter_mut().zip(other).for_each(|(b, o)| *b ^= o);
}
