//! Request envelope assembly and opening
//!
//! Wire layout (JSON, camelCase):
//! ```text
//! mid              merchant identifier (from EnvelopeConfig)
//! sign             base64(RSA signature over the `data` text)
//! timestamp        request time, formatted per EnvelopeConfig
//! version          API version (from EnvelopeConfig)
//! customerOrderNo  caller-supplied correlation id
//! signType         e.g. "SHA1WithRSA"
//! encryptType      e.g. "AES"
//! encryptKey       base64(chunked RSA wrap of the AES key)
//! data             base64(iv || AES-128-CBC ciphertext)
//! ```

use std::fmt::Write as _;

use chrono::{Local, NaiveDateTime};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};

use crate::error::{SealError, SealResult};
use crate::keys::SymmetricKey;
use crate::sign::{sign, verify, SignatureAlgorithm};
use crate::{encoding, symmetric, wrap};

/// Per-deployment envelope settings, supplied at builder construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// Merchant identifier placed in `mid`
    pub merchant_id: String,
    /// API version placed in `version` (default: 1.0.0)
    pub version: String,
    /// Symmetric algorithm label placed in `encryptType` (default: AES)
    pub encrypt_type: String,
    /// Signature scheme (default: SHA1WithRSA)
    pub signature_algorithm: SignatureAlgorithm,
    /// chrono format string for `timestamp` (default: `%Y-%m-%d %H:%M:%S`)
    pub timestamp_format: String,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            merchant_id: String::new(),
            version: "1.0.0".into(),
            encrypt_type: "AES".into(),
            signature_algorithm: SignatureAlgorithm::default(),
            timestamp_format: "%Y-%m-%d %H:%M:%S".into(),
        }
    }
}

/// Caller-supplied metadata for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMetadata {
    pub correlation_id: String,
    pub timestamp: NaiveDateTime,
}

impl RequestMetadata {
    pub fn new(correlation_id: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            timestamp,
        }
    }

    /// Metadata stamped with the current local time.
    pub fn now(correlation_id: impl Into<String>) -> Self {
        Self::new(correlation_id, Local::now().naive_local())
    }
}

/// A sealed, signed request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    mid: String,
    sign: String,
    timestamp: String,
    version: String,
    customer_order_no: String,
    sign_type: String,
    encrypt_type: String,
    encrypt_key: String,
    data: String,
}

impl Envelope {
    pub fn merchant_id(&self) -> &str {
        &self.mid
    }

    /// base64 signature over [`Envelope::data`].
    pub fn signature(&self) -> &str {
        &self.sign
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn correlation_id(&self) -> &str {
        &self.customer_order_no
    }

    pub fn sign_type(&self) -> &str {
        &self.sign_type
    }

    pub fn encrypt_type(&self) -> &str {
        &self.encrypt_type
    }

    /// base64 of the RSA-wrapped symmetric key.
    pub fn encrypted_key(&self) -> &str {
        &self.encrypt_key
    }

    /// base64 of `iv || ciphertext`; also the exact signed message.
    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn signature_algorithm(&self) -> SealResult<SignatureAlgorithm> {
        self.sign_type.parse()
    }

    pub fn to_json(&self) -> SealResult<String> {
        serde_json::to_string(self).map_err(|e| SealError::Encoding(format!("envelope: {e}")))
    }

    pub fn from_json(s: &str) -> SealResult<Self> {
        serde_json::from_str(s).map_err(|e| SealError::Encoding(format!("envelope: {e}")))
    }
}

/// Builds envelopes: fresh key → encrypt → wrap → encode → sign → assemble.
///
/// Stateless apart from its configuration; one builder can be shared across
/// threads and used for concurrent builds.
#[derive(Debug, Clone, Default)]
pub struct EnvelopeBuilder {
    config: EnvelopeConfig,
}

impl EnvelopeBuilder {
    pub fn new(config: EnvelopeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EnvelopeConfig {
        &self.config
    }

    /// Build an envelope using the OS RNG for the key, IV and RSA padding.
    pub fn build(
        &self,
        payload: &[u8],
        public_key: &RsaPublicKey,
        private_key: &RsaPrivateKey,
        metadata: &RequestMetadata,
    ) -> SealResult<Envelope> {
        self.build_with_rng(payload, public_key, private_key, metadata, &mut OsRng)
    }

    /// Build an envelope drawing all randomness from `rng`.
    ///
    /// Any failing step aborts the build; no partial output is returned.
    pub fn build_with_rng<R: RngCore + CryptoRng>(
        &self,
        payload: &[u8],
        public_key: &RsaPublicKey,
        private_key: &RsaPrivateKey,
        metadata: &RequestMetadata,
        rng: &mut R,
    ) -> SealResult<Envelope> {
        let order_no = metadata.correlation_id.as_str();

        let key = SymmetricKey::generate(rng)?;
        tracing::debug!(order_no, "generated symmetric key");

        let ciphertext = symmetric::encrypt_with_rng(payload, &key, rng)?;
        tracing::debug!(
            order_no,
            payload_bytes = payload.len(),
            ciphertext_bytes = ciphertext.body().len(),
            "encrypted payload"
        );

        let wrapped_key = wrap::wrap_with_rng(key.as_bytes(), public_key, rng)?;
        tracing::debug!(order_no, wrapped_bytes = wrapped_key.len(), "wrapped key");

        let data = encoding::encode(&ciphertext.to_bytes());
        let signature = sign(
            data.as_bytes(),
            private_key,
            self.config.signature_algorithm,
        )?;
        tracing::debug!(
            order_no,
            sign_type = %self.config.signature_algorithm,
            "signed data"
        );

        let timestamp = self.format_timestamp(&metadata.timestamp)?;

        Ok(Envelope {
            mid: self.config.merchant_id.clone(),
            sign: encoding::encode(&signature),
            timestamp,
            version: self.config.version.clone(),
            customer_order_no: metadata.correlation_id.clone(),
            sign_type: self.config.signature_algorithm.to_string(),
            encrypt_type: self.config.encrypt_type.clone(),
            encrypt_key: encoding::encode(&wrapped_key),
            data,
        })
    }

    fn format_timestamp(&self, timestamp: &NaiveDateTime) -> SealResult<String> {
        let mut out = String::new();
        write!(out, "{}", timestamp.format(&self.config.timestamp_format)).map_err(|_| {
            SealError::Encoding(format!(
                "invalid timestamp format {:?}",
                self.config.timestamp_format
            ))
        })?;
        Ok(out)
    }
}

/// Receiving side: verifies and decrypts envelopes built by [`EnvelopeBuilder`].
#[derive(Debug, Clone, Default)]
pub struct EnvelopeOpener {
    config: EnvelopeConfig,
}

impl EnvelopeOpener {
    /// Only envelopes whose `signType` and `encryptType` match `config` are accepted.
    pub fn new(config: EnvelopeConfig) -> Self {
        Self { config }
    }

    /// Check the sender's signature over the `data` text.
    pub fn verify(&self, envelope: &Envelope, sender_public_key: &RsaPublicKey) -> SealResult<bool> {
        let algorithm = self.accepted_algorithm(envelope)?;
        let signature = encoding::decode("sign", envelope.signature())?;
        verify(
            envelope.data().as_bytes(),
            &signature,
            sender_public_key,
            algorithm,
        )
    }

    /// Verify, unwrap the symmetric key and decrypt the payload.
    pub fn open(
        &self,
        envelope: &Envelope,
        recipient_private_key: &RsaPrivateKey,
        sender_public_key: &RsaPublicKey,
    ) -> SealResult<Vec<u8>> {
        if !self.verify(envelope, sender_public_key)? {
            tracing::warn!(
                order_no = envelope.correlation_id(),
                "envelope signature mismatch"
            );
            return Err(SealError::Signing(
                "signature does not match envelope data".into(),
            ));
        }

        let wrapped = encoding::decode("encryptKey", envelope.encrypted_key())?;
        let key = SymmetricKey::from_slice(&wrap::unwrap(&wrapped, recipient_private_key)?)?;

        let ciphertext = encoding::decode("data", envelope.data())?;
        symmetric::decrypt(&ciphertext, &key)
    }

    fn accepted_algorithm(&self, envelope: &Envelope) -> SealResult<SignatureAlgorithm> {
        let algorithm = envelope.signature_algorithm()?;
        if algorithm != self.config.signature_algorithm {
            return Err(SealError::Signing(format!(
                "envelope signed with {algorithm}, expected {}",
                self.config.signature_algorithm
            )));
        }
        if envelope.encrypt_type() != self.config.encrypt_type {
            return Err(SealError::Decryption(format!(
                "envelope encrypted with {}, expected {}",
                envelope.encrypt_type(),
                self.config.encrypt_type
            )));
        }
        Ok(algorithm)
    }
}
