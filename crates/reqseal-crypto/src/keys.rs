//! Per-envelope symmetric key generation

use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::error::{SealError, SealResult};
use crate::SYMMETRIC_KEY_SIZE;

/// A single-use 128-bit AES key. Zeroized on drop.
#[derive(Clone)]
pub struct SymmetricKey {
    bytes: [u8; SYMMETRIC_KEY_SIZE],
}

impl SymmetricKey {
    pub fn from_bytes(bytes: [u8; SYMMETRIC_KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Build a key from an untyped buffer, e.g. the output of key unwrapping.
    pub fn from_slice(bytes: &[u8]) -> SealResult<Self> {
        let array: [u8; SYMMETRIC_KEY_SIZE] =
            bytes.try_into().map_err(|_| SealError::KeyLength {
                expected: SYMMETRIC_KEY_SIZE,
                actual: bytes.len(),
            })?;
        Ok(Self::from_bytes(array))
    }

    /// Draw a fresh key from a cryptographically secure RNG.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> SealResult<Self> {
        let mut bytes = [0u8; SYMMETRIC_KEY_SIZE];
        rng.try_fill_bytes(&mut bytes)?;
        Ok(Self::from_bytes(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; SYMMETRIC_KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn test_generated_keys_differ() {
        let k1 = SymmetricKey::generate(&mut OsRng).unwrap();
        let k2 = SymmetricKey::generate(&mut OsRng).unwrap();
        assert_ne!(k1.as_bytes(), k2.as_bytes(), "random keys must differ");
    }

    #[test]
    fn test_from_slice_rejects_wrong_length() {
        let err = SymmetricKey::from_slice(&[0u8; 32]).unwrap_err();
        assert!(matches!(
            err,
            SealError::KeyLength {
                expected: 16,
                actual: 32
            }
        ));

        assert!(SymmetricKey::from_slice(&[]).is_err());
        assert!(SymmetricKey::from_slice(&[7u8; 16]).is_ok());
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = SymmetricKey::from_bytes([0xAB; SYMMETRIC_KEY_SIZE]);
        let rendered = format!("{key:?}");
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains("171"));
    }
}
