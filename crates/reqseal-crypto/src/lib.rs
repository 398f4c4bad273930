//! reqseal-crypto: hybrid encryption envelopes for signed API requests
//!
//! Architecture: fresh AES key per request, RSA-wrapped, payload signed by the sender
//!
//! Pipeline: payload → AES-128-CBC (random IV prefix) → base64 → RSA sign → envelope
//!
//! Key flow:
//! ```text
//! Symmetric Key (128-bit, random per envelope, never reused)
//!   ├── Payload: AES-128-CBC, PKCS#7 padding, data = base64(iv || body)
//!   └── Wrapped: RSA PKCS#1 v1.5, chunked to (modulus - 11) bytes per block
//! Sender private key
//!   └── Signature: RSASSA-PKCS1-v1_5 over the base64 text of the data field
//! ```

pub mod encoding;
pub mod envelope;
pub mod error;
pub mod keys;
pub mod sign;
pub mod symmetric;
pub mod wrap;

#[cfg(test)]
mod test_keys;

pub use envelope::{Envelope, EnvelopeBuilder, EnvelopeConfig, EnvelopeOpener, RequestMetadata};
pub use error::{SealError, SealResult};
pub use keys::SymmetricKey;
pub use sign::{sign, verify, SignatureAlgorithm};
pub use symmetric::{decrypt, encrypt, Ciphertext};
pub use wrap::{unwrap, wrap, BlockPlan};

/// Re-exported so callers can hand in parsed keys without a direct `rsa` dependency.
pub use rsa::{RsaPrivateKey, RsaPublicKey};

/// Size of the per-envelope symmetric key (AES-128)
pub const SYMMETRIC_KEY_SIZE: usize = 16;

/// AES block size, also the IV size for CBC
pub const BLOCK_SIZE: usize = 16;

/// Per-block overhead of RSA PKCS#1 v1.5 encryption padding
pub const RESERVE_SIZE: usize = 11;
