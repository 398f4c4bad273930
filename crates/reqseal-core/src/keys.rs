//! PEM key material loading and generation
//!
//! Accepts PKCS#8 / SubjectPublicKeyInfo PEM and falls back to PKCS#1
//! (`BEGIN RSA PUBLIC KEY` / `BEGIN RSA PRIVATE KEY`).

use std::path::Path;

use rand::rngs::OsRng;
use reqseal_crypto::{RsaPrivateKey, RsaPublicKey};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};

use crate::error::{ReqsealError, ReqsealResult};

pub fn parse_public_key(pem: &str) -> ReqsealResult<RsaPublicKey> {
    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|e| ReqsealError::Key(format!("not an RSA public key PEM: {e}")))
}

pub fn parse_private_key(pem: &str) -> ReqsealResult<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs8_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
        .map_err(|e| ReqsealError::Key(format!("not an RSA private key PEM: {e}")))
}

pub fn load_public_key(path: &Path) -> ReqsealResult<RsaPublicKey> {
    let pem = std::fs::read_to_string(path)?;
    parse_public_key(&pem).map_err(|e| ReqsealError::Key(format!("{}: {e}", path.display())))
}

pub fn load_private_key(path: &Path) -> ReqsealResult<RsaPrivateKey> {
    let pem = std::fs::read_to_string(path)?;
    parse_private_key(&pem).map_err(|e| ReqsealError::Key(format!("{}: {e}", path.display())))
}

/// A freshly generated key pair in PEM form (PKCS#8 private, SPKI public).
pub struct GeneratedKeyPair {
    pub private_pem: String,
    pub public_pem: String,
}

pub fn generate_key_pair(bits: usize) -> ReqsealResult<GeneratedKeyPair> {
    let private_key = RsaPrivateKey::new(&mut OsRng, bits)
        .map_err(|e| ReqsealError::Key(format!("RSA-{bits} generation failed: {e}")))?;
    let public_key = RsaPublicKey::from(&private_key);

    let private_pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| ReqsealError::Key(format!("PKCS#8 encoding: {e}")))?
        .to_string();
    let public_pem = public_key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| ReqsealError::Key(format!("SPKI encoding: {e}")))?;

    Ok(GeneratedKeyPair {
        private_pem,
        public_pem,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey};

    #[test]
    fn test_generated_pair_parses_back() {
        let pair = generate_key_pair(1024).unwrap();
        let private_key = parse_private_key(&pair.private_pem).unwrap();
        let public_key = parse_public_key(&pair.public_pem).unwrap();

        assert_eq!(RsaPublicKey::from(&private_key), public_key);
    }

    #[test]
    fn test_pkcs1_fallback() {
        let private_key = RsaPrivateKey::new(&mut OsRng, 1024).unwrap();
        let public_key = RsaPublicKey::from(&private_key);

        let private_pem = private_key.to_pkcs1_pem(LineEnding::LF).unwrap();
        let public_pem = public_key.to_pkcs1_pem(LineEnding::LF).unwrap();

        assert_eq!(parse_private_key(&private_pem).unwrap(), private_key);
        assert_eq!(parse_public_key(&public_pem).unwrap(), public_key);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let pair = generate_key_pair(1024).unwrap();
        let path = dir.path().join("peer.pem");
        std::fs::write(&path, &pair.public_pem).unwrap();

        assert!(load_public_key(&path).is_ok());
        assert!(matches!(
            load_private_key(&path),
            Err(ReqsealError::Key(_))
        ));
        assert!(matches!(
            load_public_key(&dir.path().join("missing.pem")),
            Err(ReqsealError::Io(_))
        ));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(parse_public_key("-----BEGIN NOTHING-----").is_err());
        assert!(parse_private_key("").is_err());
    }
}
