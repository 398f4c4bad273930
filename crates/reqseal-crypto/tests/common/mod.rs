//! Shared fixtures for reqseal-crypto integration tests.

use std::sync::OnceLock;

use rand::rngs::OsRng;
use reqseal_crypto::{RsaPrivateKey, RsaPublicKey};

pub struct KeyPair {
    pub private_key: RsaPrivateKey,
    pub public_key: RsaPublicKey,
}

fn generate() -> KeyPair {
    let private_key = RsaPrivateKey::new(&mut OsRng, 2048).expect("RSA-2048 keygen");
    let public_key = RsaPublicKey::from(&private_key);
    KeyPair {
        private_key,
        public_key,
    }
}

/// Receiver of envelopes: its public key wraps the symmetric key.
#[allow(dead_code)]
pub fn recipient() -> &'static KeyPair {
    static KEYS: OnceLock<KeyPair> = OnceLock::new();
    KEYS.get_or_init(generate)
}

/// Builder of envelopes: its private key signs the data field.
#[allow(dead_code)]
pub fn sender() -> &'static KeyPair {
    static KEYS: OnceLock<KeyPair> = OnceLock::new();
    KEYS.get_or_init(generate)
}
