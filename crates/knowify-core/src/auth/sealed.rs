//! Passphrase encryption for the session file.
//!
//! The session bundle holds the vendor password, so when a session key is
//! configured the file is written as a sealed envelope instead of plain JSON.
//! The key is derived with Argon2id from the passphrase and a per-write salt;
//! the bundle is encrypted with ChaCha20-Poly1305.

use argon2::Argon2;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current envelope format version
const SEALED_VERSION: u32 = 1;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

#[derive(Error, Debug)]
pub enum SealError {
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Encryption failed")]
    Encrypt,

    #[error("Decryption failed - wrong session key or corrupted file")]
    Decrypt,

    #[error("Unsupported sealed session version {0}")]
    UnsupportedVersion(u32),

    #[error("Malformed sealed session: {0}")]
    Malformed(&'static str),
}

/// On-disk form of an encrypted session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedEnvelope {
    pub version: u32,
    pub salt: Vec<u8>,
    pub nonce: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

fn derive_key(passphrase: &str, salt: &[u8]) -> Result<Key, SealError> {
    let mut key = [0u8; KEY_LEN];
    Argon2::default()
        .hash_password_into(passphrase.as_bytes(), salt, &mut key)
        .map_err(|e| SealError::KeyDerivation(e.to_string()))?;
    Ok(*Key::from_slice(&key))
}

/// Encrypt `plaintext` under a key derived from `passphrase`.
pub fn seal(passphrase: &str, plaintext: &[u8]) -> Result<SealedEnvelope, SealError> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    let mut rng = rand::thread_rng();
    rng.fill_bytes(&mut salt);
    rng.fill_bytes(&mut nonce);

    let key = derive_key(passphrase, &salt)?;
    let cipher = ChaCha20Poly1305::new(&key);
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| SealError::Encrypt)?;

    Ok(SealedEnvelope {
        version: SEALED_VERSION,
        salt: salt.to_vec(),
        nonce: nonce.to_vec(),
        ciphertext,
    })
}

/// Decrypt an envelope produced by [`seal`].
pub fn open(passphrase: &str, envelope: &SealedEnvelope) -> Result<Vec<u8>, SealError> {
    if envelope.version != SEALED_VERSION {
        return Err(SealError::UnsupportedVersion(envelope.version));
    }
    if envelope.salt.len() != SALT_LEN {
        return Err(SealError::Malformed("salt length"));
    }
    if envelope.nonce.len() != NONCE_LEN {
        return Err(SealError::Malformed("nonce length"));
    }

    let key = derive_key(passphrase, &envelope.salt)?;
    let cipher = ChaCha20Poly1305::new(&key);
    cipher
        .decrypt(Nonce::from_slice(&envelope.nonce), envelope.ciphertext.as_slice())
        .map_err(|_| SealError::Decrypt)
}
