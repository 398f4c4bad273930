//! RSASSA-PKCS1-v1_5 request signatures
//!
//! The signed message is the base64 text of the encrypted data field, exactly
//! as it travels in the envelope, so any holder of the envelope can verify it
//! without re-encoding anything.

use std::fmt;
use std::str::FromStr;

use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::Sha256;

use crate::error::{SealError, SealResult};

/// Hash-then-sign scheme, named the way it appears on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureAlgorithm {
    #[default]
    #[serde(rename = "SHA1WithRSA")]
    Sha1WithRsa,
    #[serde(rename = "SHA256WithRSA")]
    Sha256WithRsa,
}

impl SignatureAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha1WithRsa => "SHA1WithRSA",
            Self::Sha256WithRsa => "SHA256WithRSA",
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = SealError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SHA1WithRSA" => Ok(Self::Sha1WithRsa),
            "SHA256WithRSA" => Ok(Self::Sha256WithRsa),
            other => Err(SealError::Signing(format!(
                "unsupported signature algorithm: {other}"
            ))),
        }
    }
}

/// Sign `message` with `private_key`. Deterministic for a given key and message.
pub fn sign(
    message: &[u8],
    private_key: &RsaPrivateKey,
    algorithm: SignatureAlgorithm,
) -> SealResult<Vec<u8>> {
    let signature = match algorithm {
        SignatureAlgorithm::Sha1WithRsa => SigningKey::<Sha1>::new(private_key.clone())
            .try_sign(message)
            .map(|s| s.to_vec()),
        SignatureAlgorithm::Sha256WithRsa => SigningKey::<Sha256>::new(private_key.clone())
            .try_sign(message)
            .map(|s| s.to_vec()),
    };
    signature.map_err(|e| SealError::Signing(format!("{algorithm}: {e}")))
}

/// Verify `signature` over `message`.
///
/// Returns `Ok(false)` for a well-formed signature that does not match, and an
/// error only when the signature cannot be a signature under this key at all.
pub fn verify(
    message: &[u8],
    signature: &[u8],
    public_key: &RsaPublicKey,
    algorithm: SignatureAlgorithm,
) -> SealResult<bool> {
    if signature.len() != public_key.size() {
        return Err(SealError::Signing(format!(
            "signature is {} bytes, expected {} for this key",
            signature.len(),
            public_key.size()
        )));
    }
    let signature = Signature::try_from(signature)
        .map_err(|e| SealError::Signing(format!("malformed signature: {e}")))?;

    let ok = match algorithm {
        SignatureAlgorithm::Sha1WithRsa => VerifyingKey::<Sha1>::new(public_key.clone())
            .verify(message, &signature)
            .is_ok(),
        SignatureAlgorithm::Sha256WithRsa => VerifyingKey::<Sha256>::new(public_key.clone())
            .verify(message, &signature)
            .is_ok(),
    };
    Ok(ok)
}
