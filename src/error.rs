/// Returned when bytes do not end in valid PKCS#7 padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidPadding;

impl std::fmt::Display for InvalidPadding {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "input is not PKCS#7 padded")
    }
}

impl std::error::Error for InvalidPadding {}

/// Errors raised when an attack's assumptions about its oracle do not hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttackError {
    /// Ciphertext length never jumped while growing the input.
    BlockSizeNotFound,
    /// No repeated ciphertext blocks for repeated plaintext blocks.
    NotEcb,
    /// No lookup-table entry matched the oracle's block for this byte.
    NoLookupMatch { position: usize },
    /// Could not line attacker input up with a block boundary.
    PrefixNotFound,
    /// The alignment marker never landed on a block boundary.
    MarkerNotAligned { attempts: usize },
    /// None of the 256 candidates produced valid padding.
    NoValidPadding { block: usize, byte: usize },
    /// Could not locate attacker input inside the ciphertext.
    UserDataNotFound,
    /// The key could not be extracted from the receiver's response.
    KeyNotRecovered(String),
}

impl std::fmt::Display for AttackError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            AttackError::BlockSizeNotFound => write!(f, "could not detect the block size"),
            AttackError::NotEcb => write!(f, "oracle is not encrypting with ECB"),
            AttackError::NoLookupMatch { position } => {
                write!(f, "no lookup table match for byte {position}")
            }
            AttackError::PrefixNotFound => write!(f, "could not determine the prefix length"),
            AttackError::MarkerNotAligned { attempts } => {
                write!(f, "marker blocks not aligned after {attempts} attempts")
            }
            AttackError::NoValidPadding { block, byte } => write!(
                f,
                "no candidate produced valid padding for byte {byte} of block {block}"
            ),
            AttackError::UserDataNotFound => write!(f, "could not locate user data in ciphertext"),
            AttackError::KeyNotRecovered(reason) => write!(f, "key recovery failed: {reason}"),
        }
    }
}

impl std::error::Error for AttackError {}
