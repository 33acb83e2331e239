// ECB cut-and-paste
use std::{collections::HashMap, fmt::Display};

use crate::aes::BLOCK_SIZE;
use crate::{decrypt_aes_128_ecb, encrypt_aes_128_ecb, pkcs7_pad};

const DEFAULT_UID: u64 = 10;

#[derive(Debug, PartialEq, Eq)]
pub struct UserProfile {
    email: String,
    uid: u64,
    role: String,
}

impl UserProfile {
    pub fn new(email: &str, role: &str) -> Self {
        UserProfile {
            email: strip_metachars(email),
            uid: DEFAULT_UID,
            role: strip_metachars(role),
        }
    }

    pub fn profile_for(email: &str) -> Self {
        Self::new(email, "user")
    }

    pub fn role(&self) -> &str {
        &self.role
    }
}

impl Display for UserProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "email={}&uid={}&role={}", self.email, self.uid, self.role)
    }
}

impl TryFrom<&str> for UserProfile {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let fields = parse_query(value);
        let field = |name: &str| {
            fields
                .get(name)
                .cloned()
                .ok_or_else(|| format!("profile has no '{name}' field"))
        };
        Ok(Self {
            email: field("email")?,
            uid: field("uid")?
                .parse()
                .map_err(|e| format!("uid is not an integer: {e}"))?,
            role: field("role")?,
        })
    }
}

/// Hands out encrypted profiles and reads them back; the key stays inside.
pub struct ProfileOracle {
    key: [u8; 16],
}

impl ProfileOracle {
    pub fn new(key: [u8; 16]) -> Self {
        Self { key }
    }

    pub fn profile_for(&self, email: &str) -> Vec<u8> {
        let profile = UserProfile::profile_for(email);
        encrypt_aes_128_ecb(profile.to_string().as_bytes(), &self.key)
    }

    pub fn decrypt_profile(&self, ciphertext: &[u8]) -> Result<UserProfile, String> {
        let encoded = decrypt_aes_128_ecb(ciphertext, &self.key)
            .map_err(|e| format!("cannot decrypt profile: {e}"))?;
        UserProfile::try_from(String::from_utf8_lossy(&encoded).as_ref())
            .map_err(|e| format!("cannot parse decrypted string as user profile: {e}"))
    }
}

/// Build a ciphertext that decrypts to a profile with `role=admin` using
/// nothing but `profile_for` queries.
///
/// Returns the email of the forged profile and its ciphertext.
pub fn forge_admin_profile(oracle: &ProfileOracle) -> (String, Vec<u8>) {
    // A 13 byte email pushes the role value to the start of the third block:
    //    email=bob@gmail.com &uid=10&role= user
    let paste_email = "bob@gmail.com";
    let paste_profile = oracle.profile_for(paste_email);

    // Ten bytes of email fill the first block after 'email=', so the padded
    // 'admin' lands in a block of its own.
    let cut_email = [
        b"bob@gm.com".as_slice(),
        &pkcs7_pad(b"admin", BLOCK_SIZE),
    ]
    .concat();
    let cut_profile = oracle.profile_for(&String::from_utf8_lossy(&cut_email));

    let forged = [
        &paste_profile[..(2 * BLOCK_SIZE)],
        &cut_profile[BLOCK_SIZE..(2 * BLOCK_SIZE)],
    ]
    .concat();
    (paste_email.to_string(), forged)
}

fn strip_metachars(s: &str) -> String {
    s.chars().filter(|c| !['&', '='].contains(c)).collect()
}

fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::random_bytes_with_seed;

    use rstest::rstest;

    #[test]
    fn ecb_cut_and_paste_attack() {
        let key = random_bytes_with_seed::<BLOCK_SIZE>(101);
        let oracle = ProfileOracle::new(key);

        let (email, forged_profile) = forge_admin_profile(&oracle);

        let decrypted = oracle.decrypt_profile(&forged_profile).unwrap();
        assert_eq!(decrypted, UserProfile::new(&email, "admin"));
        assert_eq!(decrypted.role(), "admin");
    }

    #[test]
    fn parse_query_splits_pairs_and_skips_bare_words() {
        let parsed = parse_query("foo=bar&baz=qux&junk&zap=zaz=zle");

        let expected = HashMap::from([
            ("foo".to_string(), "bar".to_string()),
            ("baz".to_string(), "qux".to_string()),
            ("zap".to_string(), "zaz=zle".to_string()),
        ]);
        assert_eq!(parsed, expected);
    }

    #[rstest]
    #[case("foo@bar.com")]
    #[case("fo=o@bar.c&om&")]
    #[case("foo@bar.com&role=admin")]
    fn profile_for_encodes_without_metacharacters(#[case] email: &str) {
        let encoded = UserProfile::profile_for(email).to_string();

        assert!(encoded.starts_with("email=foo@bar.com"));
        assert!(encoded.ends_with("&uid=10&role=user"));
        assert_eq!(encoded.matches('&').count(), 2);
    }

    #[test]
    fn profile_for_round_trips_through_oracle() {
        let oracle = ProfileOracle::new(random_bytes_with_seed::<16>(102));

        let ciphertext = oracle.profile_for("test@yahoo.com");

        assert_eq!(
            oracle.decrypt_profile(&ciphertext),
            Ok(UserProfile::profile_for("test@yahoo.com"))
        );
    }

    #[test]
    fn decrypt_profile_rejects_missing_fields() {
        let oracle = ProfileOracle::new(random_bytes_with_seed::<16>(102));
        let ciphertext = encrypt_aes_128_ecb(b"email=a@b.c&uid=10", &oracle.key);

        assert!(oracle.decrypt_profile(&ciphertext).is_err());
    }
}
