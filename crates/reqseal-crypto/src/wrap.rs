//! Chunked RSA PKCS#1 v1.5 key wrapping
//!
//! A single PKCS#1 v1.5 operation can carry at most `modulus - 11` bytes, so
//! the secret is split into slices of that size and each slice is encrypted
//! on its own:
//! ```text
//! secret:  [chunk_size][chunk_size]...[1..=chunk_size]
//! wrapped: [key_size  ][key_size  ]...[key_size      ]
//! ```
//! Blocks are concatenated in encryption order and unwrapped in the same order.

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};

use crate::error::{SealError, SealResult};
use crate::RESERVE_SIZE;

/// Chunk layout for wrapping `secret_len` bytes under a `key_size`-byte modulus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPlan {
    /// Modulus size in bytes; every wrapped block has exactly this length
    pub key_size: usize,
    /// Maximum plaintext bytes per block (`key_size - RESERVE_SIZE`)
    pub chunk_size: usize,
    /// Number of blocks, `ceil(secret_len / chunk_size)`
    pub chunk_count: usize,
}

impl BlockPlan {
    pub fn new(secret_len: usize, key_size: usize) -> SealResult<Self> {
        if key_size <= RESERVE_SIZE {
            return Err(SealError::InvalidKey(format!(
                "modulus of {key_size} bytes leaves no room for the {RESERVE_SIZE}-byte padding reserve"
            )));
        }
        let chunk_size = key_size - RESERVE_SIZE;
        Ok(Self {
            key_size,
            chunk_size,
            chunk_count: secret_len.div_ceil(chunk_size),
        })
    }

    /// Exact length of the wrapped output.
    pub fn wrapped_len(&self) -> usize {
        self.key_size * self.chunk_count
    }
}

/// Wrap `secret` under `public_key` using padding randomness from the OS RNG.
pub fn wrap(secret: &[u8], public_key: &RsaPublicKey) -> SealResult<Vec<u8>> {
    wrap_with_rng(secret, public_key, &mut OsRng)
}

/// Wrap `secret` under `public_key`, one PKCS#1 v1.5 block per chunk.
///
/// An empty secret produces an empty output. Any block failure aborts the
/// whole wrap.
pub fn wrap_with_rng<R: RngCore + CryptoRng>(
    secret: &[u8],
    public_key: &RsaPublicKey,
    rng: &mut R,
) -> SealResult<Vec<u8>> {
    let plan = BlockPlan::new(secret.len(), public_key.size())?;
    let mut wrapped = vec![0u8; plan.wrapped_len()];

    for (index, (out, chunk)) in wrapped
        .chunks_exact_mut(plan.key_size)
        .zip(secret.chunks(plan.chunk_size))
        .enumerate()
    {
        let block = public_key
            .encrypt(rng, Pkcs1v15Encrypt, chunk)
            .map_err(|e| SealError::Encryption(format!("RSA block {index}: {e}")))?;
        if block.len() != plan.key_size {
            return Err(SealError::Encryption(format!(
                "RSA block {index} is {} bytes, expected {}",
                block.len(),
                plan.key_size
            )));
        }
        out.copy_from_slice(&block);
    }

    Ok(wrapped)
}

/// Reverse [`wrap`]: decrypt each `key_size` block and concatenate in order.
pub fn unwrap(wrapped: &[u8], private_key: &RsaPrivateKey) -> SealResult<Vec<u8>> {
    let key_size = private_key.size();
    let plan = BlockPlan::new(0, key_size)?;

    if wrapped.len() % key_size != 0 {
        return Err(SealError::Decryption(format!(
            "wrapped key of {} bytes is not a multiple of the {key_size}-byte modulus",
            wrapped.len()
        )));
    }

    let mut secret = Vec::with_capacity(wrapped.len() / key_size * plan.chunk_size);
    for (index, block) in wrapped.chunks_exact(key_size).enumerate() {
        let chunk = private_key
            .decrypt(Pkcs1v15Encrypt, block)
            .map_err(|e| SealError::Decryption(format!("RSA block {index}: {e}")))?;
        secret.extend_from_slice(&chunk);
    }

    Ok(secret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_keys::{recipient, sender};

    #[test]
    fn test_block_plan_arithmetic() {
        let plan = BlockPlan::new(16, 256).unwrap();
        assert_eq!(plan.chunk_size, 245);
        assert_eq!(plan.chunk_count, 1);
        assert_eq!(plan.wrapped_len(), 256);

        let plan = BlockPlan::new(300, 256).unwrap();
        assert_eq!(plan.chunk_count, 2);
        assert_eq!(plan.wrapped_len(), 512);

        let plan = BlockPlan::new(245, 256).unwrap();
        assert_eq!(plan.chunk_count, 1, "exact fit stays a single block");

        assert_eq!(BlockPlan::new(0, 256).unwrap().chunk_count, 0);
    }

    #[test]
    fn test_block_plan_rejects_tiny_modulus() {
        assert!(matches!(
            BlockPlan::new(16, RESERVE_SIZE),
            Err(SealError::InvalidKey(_))
        ));
        assert!(BlockPlan::new(16, 4).is_err());
        assert!(BlockPlan::new(16, RESERVE_SIZE + 1).is_ok());
    }

    #[test]
    fn test_wrap_16_byte_key_is_one_block() {
        let (private_key, public_key) = recipient();
        let secret = [0x5Au8; 16];

        let wrapped = wrap(&secret, public_key).unwrap();
        assert_eq!(wrapped.len(), 256);
        assert_eq!(unwrap(&wrapped, private_key).unwrap(), secret);
    }

    #[test]
    fn test_wrap_300_bytes_is_two_blocks() {
        let (private_key, public_key) = recipient();
        let secret: Vec<u8> = (0..300u32).map(|i| (i % 251) as u8).collect();

        let wrapped = wrap(&secret, public_key).unwrap();
        assert_eq!(wrapped.len(), 512);

        // Each block decrypts on its own to its slice: 245 + 55 bytes.
        let first = private_key
            .decrypt(Pkcs1v15Encrypt, &wrapped[..256])
            .unwrap();
        let second = private_key
            .decrypt(Pkcs1v15Encrypt, &wrapped[256..])
            .unwrap();
        assert_eq!(first, &secret[..245]);
        assert_eq!(second, &secret[245..]);

        assert_eq!(unwrap(&wrapped, private_key).unwrap(), secret);
    }

    #[test]
    fn test_wrap_empty_secret() {
        let (private_key, public_key) = recipient();
        let wrapped = wrap(&[], public_key).unwrap();
        assert!(wrapped.is_empty());
        assert!(unwrap(&wrapped, private_key).unwrap().is_empty());
    }

    #[test]
    fn test_unwrap_rejects_partial_block() {
        let (private_key, public_key) = recipient();
        let wrapped = wrap(b"0123456789abcdef", public_key).unwrap();
        let err = unwrap(&wrapped[..255], private_key).unwrap_err();
        assert!(matches!(err, SealError::Decryption(_)));
    }

    #[test]
    fn test_unwrap_wrong_private_key() {
        let (_, public_key) = recipient();
        let (other_private, _) = sender();

        let wrapped = wrap(b"0123456789abcdef", public_key).unwrap();
        let result = unwrap(&wrapped, other_private);
        assert!(
            !matches!(result, Ok(ref s) if s == b"0123456789abcdef"),
            "a foreign private key must not recover the secret"
        );
    }

    #[test]
    fn test_unwrap_corrupted_block_aborts() {
        let (private_key, public_key) = recipient();
        let secret = vec![0x11u8; 300];
        let mut wrapped = wrap(&secret, public_key).unwrap();
        wrapped[300] ^= 0xFF;

        match unwrap(&wrapped, private_key) {
            Ok(out) => assert_ne!(out, secret),
            Err(e) => assert!(matches!(e, SealError::Decryption(_))),
        }
    }
}
