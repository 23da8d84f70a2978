//! Password hashing: PBKDF2-HMAC-SHA256 with a per-password random salt.
//!
//! Encoded form: `pbkdf2-sha256$<iterations>$<salt b64>$<hash b64>`
//! (standard base64, no padding). The iteration count travels with the
//! hash, so raising the cost factor does not invalidate stored passwords.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::CryptoError;

pub const PBKDF2_ITERATIONS: u32 = 600_000;
pub const HASH_LENGTH: usize = 32;
pub const SALT_LENGTH: usize = 16;

const SCHEME: &str = "pbkdf2-sha256";

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str, iterations: u32) -> String {
    let salt = generate_salt();
    let hash = derive(password.as_bytes(), &salt, iterations);
    format!(
        "{SCHEME}${iterations}${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(&hash[..])
    )
}

/// Re-derive with the stored salt and iteration count and compare in constant time.
pub fn verify_password(password: &str, encoded: &str) -> Result<bool, CryptoError> {
    let parsed = parse(encoded)?;
    let candidate = derive(password.as_bytes(), &parsed.salt, parsed.iterations);
    Ok(candidate[..].ct_eq(&parsed.hash[..]).into())
}

/// Burn the same work as a real verification. Used when the account does
/// not exist so the response time does not reveal that.
pub fn dummy_verify(password: &str, iterations: u32) {
    let _ = derive(password.as_bytes(), &[0u8; SALT_LENGTH], iterations);
}

struct ParsedHash {
    iterations: u32,
    salt: Vec<u8>,
    hash: Vec<u8>,
}

fn parse(encoded: &str) -> Result<ParsedHash, CryptoError> {
    let mut parts = encoded.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(hash), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(CryptoError::MalformedHash);
    };
    if scheme != SCHEME {
        return Err(CryptoError::UnsupportedScheme(scheme.to_string()));
    }
    let iterations: u32 = iterations.parse().map_err(|_| CryptoError::MalformedHash)?;
    if iterations == 0 {
        return Err(CryptoError::MalformedHash);
    }
    let salt = STANDARD_NO_PAD
        .decode(salt)
        .map_err(|_| CryptoError::MalformedHash)?;
    let hash = STANDARD_NO_PAD
        .decode(hash)
        .map_err(|_| CryptoError::MalformedHash)?;
    if hash.len() != HASH_LENGTH {
        return Err(CryptoError::MalformedHash);
    }
    Ok(ParsedHash {
        iterations,
        salt,
        hash,
    })
}

fn derive(password: &[u8], salt: &[u8], iterations: u32) -> Zeroizing<[u8; HASH_LENGTH]> {
    let mut out = Zeroizing::new([0u8; HASH_LENGTH]);
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut out[..]);
    out
}

/// Generate a cryptographically random salt
fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: u32 = 1_000;

    #[test]
    fn hash_then_verify() {
        let encoded = hash_password("secret1", FAST);
        assert!(verify_password("secret1", &encoded).unwrap());
        assert!(!verify_password("secret2", &encoded).unwrap());
    }

    #[test]
    fn encoded_form_never_contains_plaintext() {
        let encoded = hash_password("secret1", FAST);
        assert!(encoded.starts_with("pbkdf2-sha256$1000$"));
        assert!(!encoded.contains("secret1"));
    }

    #[test]
    fn same_password_gets_different_salts() {
        let a = hash_password("secret1", FAST);
        let b = hash_password("secret1", FAST);
        assert_ne!(a, b);
        assert!(verify_password("secret1", &a).unwrap());
        assert!(verify_password("secret1", &b).unwrap());
    }

    #[test]
    fn iteration_count_is_read_from_hash() {
        let encoded = hash_password("secret1", 2_000);
        // Verification ignores the current default and uses the stored count
        assert!(verify_password("secret1", &encoded).unwrap());
    }

    #[test]
    fn malformed_hashes_are_rejected() {
        for bad in [
            "",
            "plaintext",
            "pbkdf2-sha256$abc$c2FsdA$aGFzaA",
            "pbkdf2-sha256$0$c2FsdA$aGFzaA",
            "pbkdf2-sha256$1000$c2FsdA$dG9vc2hvcnQ",
            "pbkdf2-sha256$1000$c2FsdA$aGFzaA$extra",
        ] {
            assert!(
                matches!(verify_password("x", bad), Err(CryptoError::MalformedHash)),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        let result = verify_password("x", "bcrypt$10$c2FsdA$aGFzaA");
        assert!(matches!(result, Err(CryptoError::UnsupportedScheme(s)) if s == "bcrypt"));
    }

    #[test]
    fn default_cost_is_meaningful() {
        assert!(PBKDF2_ITERATIONS >= 600_000);
    }
}
