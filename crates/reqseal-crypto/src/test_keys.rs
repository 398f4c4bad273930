//! Shared RSA fixtures for unit tests. Keys are generated once per test binary.

use std::sync::OnceLock;

use rand::rngs::OsRng;
use rsa::{RsaPrivateKey, RsaPublicKey};

fn generate() -> (RsaPrivateKey, RsaPublicKey) {
    let private_key = RsaPrivateKey::new(&mut OsRng, 2048).expect("RSA-2048 keygen");
    let public_key = RsaPublicKey::from(&private_key);
    (private_key, public_key)
}

/// The party that receives envelopes (wraps against its public key).
pub fn recipient() -> (&'static RsaPrivateKey, &'static RsaPublicKey) {
    static KEYS: OnceLock<(RsaPrivateKey, RsaPublicKey)> = OnceLock::new();
    let (private_key, public_key) = KEYS.get_or_init(generate);
    (private_key, public_key)
}

/// The party that builds and signs envelopes.
pub fn sender() -> (&'static RsaPrivateKey, &'static RsaPublicKey) {
    static KEYS: OnceLock<(RsaPrivateKey, RsaPublicKey)> = OnceLock::new();
    let (private_key, public_key) = KEYS.get_or_init(generate);
    (private_key, public_key)
}
