use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;

const PBKDF2_ITERATIONS: u32 = 200_000;
const SALT_SIZE: usize = 16;
const NONCE_SIZE: usize = 12;
const KEY_SIZE: usize = 32;

/// API key encrypted under a password-derived key. Both fields are base64
/// text so the payload can be written straight to a JSON file.
///
/// `token` is `nonce[12] || ciphertext` (GCM tag included).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedSecret {
    pub salt: String,
    pub token: String,
}

#[derive(Debug)]
pub enum VaultError {
    /// Wrong password or tampered token.
    InvalidCredential,
    /// Payload is not structurally valid (bad base64, truncated token).
    MalformedPayload(String),
    EncryptionFailure(String),
}

impl fmt::Display for VaultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredential => write!(f, "Invalid password or corrupted key data"),
            Self::MalformedPayload(msg) => write!(f, "Malformed key payload: {}", msg),
            Self::EncryptionFailure(msg) => write!(f, "Encryption failed: {}", msg),
        }
    }
}

impl std::error::Error for VaultError {}

fn derive_key(password: &str, salt: &[u8]) -> [u8; KEY_SIZE] {
    let mut key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    key
}

/// Encrypt `secret` under a key derived from `password`.
///
/// A fresh random salt and nonce are drawn per call, so encrypting the same
/// secret twice never yields the same payload.
pub fn encrypt(secret: &str, password: &str) -> Result<EncryptedSecret, VaultError> {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);

    let derived = derive_key(password, &salt);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&derived));

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, secret.as_bytes())
        .map_err(|e| VaultError::EncryptionFailure(e.to_string()))?;

    let mut token = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    token.extend_from_slice(&nonce_bytes);
    token.extend_from_slice(&ciphertext);

    Ok(EncryptedSecret {
        salt: BASE64.encode(salt),
        token: BASE64.encode(token),
    })
}

/// Re-derive the key from the stored salt and decrypt the token.
///
/// Fails with `VaultError::InvalidCredential` when the password is wrong or
/// the ciphertext was modified; GCM authentication cannot tell the two
/// apart.
pub fn decrypt(secret: &EncryptedSecret, password: &str) -> Result<String, VaultError> {
    let salt = BASE64
        .decode(&secret.salt)
        .map_err(|e| VaultError::MalformedPayload(format!("salt is not valid base64: {}", e)))?;
    if salt.len() != SALT_SIZE {
        return Err(VaultError::MalformedPayload(format!(
            "expected {}-byte salt, got {}",
            SALT_SIZE,
            salt.len()
        )));
    }

    let data = BASE64
        .decode(&secret.token)
        .map_err(|e| VaultError::MalformedPayload(format!("token is not valid base64: {}", e)))?;
    if data.len() <= NONCE_SIZE {
        return Err(VaultError::MalformedPayload("token too short".to_string()));
    }
    let (nonce_bytes, ciphertext) = data.split_at(NONCE_SIZE);

    let derived = derive_key(password, &salt);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&derived));

    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| VaultError::InvalidCredential)?;

    String::from_utf8(plaintext).map_err(|_| VaultError::InvalidCredential)
}
