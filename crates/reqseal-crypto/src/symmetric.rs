//! AES-128-CBC payload encryption/decryption
//!
//! Transport format (binary):
//! ```text
//! [16 bytes: random IV][N bytes: AES-128-CBC ciphertext of PKCS#7-padded payload]
//! ```
//!
//! N is the payload length rounded up to the next multiple of 16 (a full
//! extra block when already aligned). The IV travels with the ciphertext so
//! the receiver can decrypt without any side channel.

use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::error::{SealError, SealResult};
use crate::keys::SymmetricKey;
use crate::BLOCK_SIZE;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// A CBC ciphertext together with the IV it was produced under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ciphertext {
    iv: [u8; BLOCK_SIZE],
    body: Vec<u8>,
}

impl Ciphertext {
    pub fn iv(&self) -> &[u8; BLOCK_SIZE] {
        &self.iv
    }

    /// The padded, encrypted payload without the IV.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Transport form: `iv || body`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(BLOCK_SIZE + self.body.len());
        out.extend_from_slice(&self.iv);
        out.extend_from_slice(&self.body);
        out
    }

    /// Parse the transport form produced by [`Ciphertext::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> SealResult<Self> {
        if bytes.len() < BLOCK_SIZE * 2 {
            return Err(SealError::Padding(format!(
                "ciphertext too short: {} bytes (minimum {})",
                bytes.len(),
                BLOCK_SIZE * 2
            )));
        }
        let (iv_bytes, body) = bytes.split_at(BLOCK_SIZE);
        if body.len() % BLOCK_SIZE != 0 {
            return Err(SealError::Padding(format!(
                "ciphertext body of {} bytes is not block aligned",
                body.len()
            )));
        }

        let mut iv = [0u8; BLOCK_SIZE];
        iv.copy_from_slice(iv_bytes);
        Ok(Self {
            iv,
            body: body.to_vec(),
        })
    }
}

/// Encrypt a payload under `key` with a fresh IV from the OS RNG.
pub fn encrypt(payload: &[u8], key: &SymmetricKey) -> SealResult<Ciphertext> {
    encrypt_with_rng(payload, key, &mut OsRng)
}

/// Encrypt a payload under `key`, drawing the IV from `rng`.
pub fn encrypt_with_rng<R: RngCore + CryptoRng>(
    payload: &[u8],
    key: &SymmetricKey,
    rng: &mut R,
) -> SealResult<Ciphertext> {
    let mut iv = [0u8; BLOCK_SIZE];
    rng.try_fill_bytes(&mut iv)?;

    let cipher = Aes128CbcEnc::new_from_slices(key.as_bytes(), &iv)
        .map_err(|e| SealError::CipherInit(format!("AES-128-CBC: {e}")))?;

    let body = cipher.encrypt_padded_vec_mut::<Pkcs7>(payload);

    Ok(Ciphertext { iv, body })
}

/// Decrypt the transport form `iv || body` and strip the padding.
pub fn decrypt(ciphertext: &[u8], key: &SymmetricKey) -> SealResult<Vec<u8>> {
    let parsed = Ciphertext::from_bytes(ciphertext)?;

    let cipher = Aes128CbcDec::new_from_slices(key.as_bytes(), parsed.iv())
        .map_err(|e| SealError::CipherInit(format!("AES-128-CBC: {e}")))?;

    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(parsed.body())
        .map_err(|_| SealError::Padding("malformed PKCS#7 padding".into()))
}
