//! Credential generation for newly provisioned consumers.
//!
//! - API keys are 160-bit random values, hex encoded (40 characters)
//! - Passwords are random tokens hashed with Argon2id (PHC string format)

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::Rng;

use crate::error::CredentialError;

const API_KEY_BYTES: usize = 20;
const PASSWORD_TOKEN_BYTES: usize = 16;

/// Generate a key for Kong's key-auth plugin.
pub fn generate_api_key() -> String {
    let bytes: [u8; API_KEY_BYTES] = rand::thread_rng().r#gen();
    hex::encode(bytes)
}

/// Generate a random password and return only its hash.
///
/// The plaintext is a random base64 token with `salt` appended; it is never
/// returned or stored.
pub fn generate_password(salt: Option<&str>) -> Result<String, CredentialError> {
    let mut bytes = [0u8; PASSWORD_TOKEN_BYTES];
    rand::thread_rng().fill(&mut bytes);
    let plaintext = format!("{}{}", STANDARD.encode(bytes), salt.unwrap_or_default());

    let hash_salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plaintext.as_bytes(), &hash_salt)
        .map_err(CredentialError::Hash)?;
    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_format() {
        let key = generate_api_key();
        assert_eq!(key.len(), 40, "API key should be 40 hex chars");
        assert!(hex::decode(&key).is_ok(), "API key should be valid hex");
        assert_eq!(key, key.to_lowercase());
    }

    #[test]
    fn test_api_key_uniqueness() {
        assert_ne!(generate_api_key(), generate_api_key());
    }

    #[test]
    fn test_password_is_argon2_hash() {
        let hash = generate_password(None).unwrap();
        assert!(hash.starts_with("$argon2id$"), "Hash should use Argon2id");
    }

    #[test]
    fn test_passwords_differ_with_same_salt() {
        let first = generate_password(Some("acme")).unwrap();
        let second = generate_password(Some("acme")).unwrap();
        assert_ne!(first, second);
    }
}
