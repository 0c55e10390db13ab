//! Secret box: symmetric authenticated encryption for stored credentials.
//!
//! AES-256-GCM with a process-wide key loaded once at startup. `seal` prefixes
//! a random 96-bit nonce to the ciphertext+tag; `open` rejects anything
//! truncated, tampered with, or sealed under a different key.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::RngCore;

use crate::error::{AppError, AppResult};

/// AES-GCM nonce length in bytes.
const NONCE_LEN: usize = 12;

/// Process-wide secret box. Cheap to clone; the key is immutable after startup.
#[derive(Clone)]
pub struct SecretBox {
    cipher: Aes256Gcm,
}

impl SecretBox {
    /// Build a secret box from a 256-bit key.
    pub fn new(key: [u8; 32]) -> Self {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
        SecretBox { cipher }
    }

    /// Encrypt plaintext. Output layout: nonce || ciphertext || tag.
    pub fn seal(&self, plaintext: &[u8]) -> AppResult<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| AppError::Crypto)?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Decrypt bytes produced by [`seal`](Self::seal).
    pub fn open(&self, sealed: &[u8]) -> AppResult<Vec<u8>> {
        if sealed.len() < NONCE_LEN {
            return Err(AppError::Crypto);
        }
        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        self.cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| AppError::Crypto)
    }
}

impl std::fmt::Debug for SecretBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material must never appear in logs.
        f.write_str("SecretBox")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_box() -> SecretBox {
        SecretBox::new([7u8; 32])
    }

    #[test]
    fn test_seal_open_round_trip() {
        let sb = test_box();
        let sealed = sb.seal(b"s3cret-password").unwrap();
        assert_eq!(sb.open(&sealed).unwrap(), b"s3cret-password");
    }

    #[test]
    fn test_seal_is_randomized() {
        let sb = test_box();
        let a = sb.seal(b"same input").unwrap();
        let b = sb.seal(b"same input").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_open_rejects_tampering() {
        let sb = test_box();
        let mut sealed = sb.seal(b"payload").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert!(matches!(sb.open(&sealed), Err(AppError::Crypto)));
    }

    #[test]
    fn test_open_rejects_short_input() {
        let sb = test_box();
        assert!(matches!(sb.open(&[0u8; 5]), Err(AppError::Crypto)));
        assert!(matches!(sb.open(&[]), Err(AppError::Crypto)));
    }

    #[test]
    fn test_open_rejects_wrong_key() {
        let sealed = test_box().seal(b"payload").unwrap();
        let other = SecretBox::new([9u8; 32]);
        assert!(matches!(other.open(&sealed), Err(AppError::Crypto)));
    }

    #[test]
    fn test_empty_plaintext_round_trips() {
        let sb = test_box();
        let sealed = sb.seal(b"").unwrap();
        assert_eq!(sb.open(&sealed).unwrap(), b"");
    }
}
