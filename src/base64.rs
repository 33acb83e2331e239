/// Base64 helpers over the standard alphabet.
use base64::{engine::general_purpose::STANDARD, Engine};

pub fn base64_encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode base64, ignoring any whitespace (line-wrapped input is common).
pub fn base64_decode(s: &str) -> Result<Vec<u8>, String> {
    let stripped: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(stripped)
        .map_err(|e| format!("invalid base64: {e}"))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("QUJD", b"ABC")]
    #[case("QmFzZTY0", &[66, 97, 115, 101, 54, 52])]
    #[case("T2ggbXkg\nZ29zaA==", &[79, 104, 32, 109, 121, 32, 103, 111, 115, 104])]
    fn base64_decode_returns_expected_bytes(#[case] encoded: &str, #[case] expected: &[u8]) {
        let decoded = base64_decode(encoded).unwrap();

        assert_eq!(decoded, expected);
    }

    #[test]
    fn base64_decode_rejects_invalid_characters() {
        assert!(base64_decode("QU*D").is_err());
    }

    #[test]
    fn base64_encode_pads_output() {
        assert_eq!(base64_encode(b"Oh my gosh"), "T2ggbXkgZ29zaA==");
    }
}
