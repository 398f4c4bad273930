use reqseal_crypto::EnvelopeConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ReqsealError, ReqsealResult};

/// Top-level configuration (loaded from reqseal.toml)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReqsealConfig {
    pub envelope: EnvelopeConfig,
    pub keys: KeysConfig,
    pub log: LogConfig,
}

/// PEM key locations. All optional; CLI flags take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    /// Recipient's RSA public key, used to wrap the AES key
    pub recipient_public_key: Option<PathBuf>,
    /// Our RSA private key, used to sign the data field
    pub signing_private_key: Option<PathBuf>,
    /// Recipient-side private key, used when opening envelopes
    pub recipient_private_key: Option<PathBuf>,
    /// Sender's public key, used when verifying envelopes
    pub sender_public_key: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ReqsealConfig {
    /// Load configuration from `path`, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> ReqsealResult<Self> {
        match Self::read(path)? {
            Some(config) => Ok(config),
            None => {
                tracing::warn!("config file not found: {}  (using defaults)", path.display());
                Ok(Self::default())
            }
        }
    }

    /// Read and parse `path`; `None` when no file exists there.
    ///
    /// Does not log, so it can run before a subscriber is installed.
    pub fn read(path: &Path) -> ReqsealResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map(Some)
            .map_err(|e| ReqsealError::Config(format!("parsing {}: {e}", path.display())))
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn to_toml(&self) -> ReqsealResult<String> {
        toml::to_string_pretty(self).map_err(|e| ReqsealError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqseal_crypto::SignatureAlgorithm;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReqsealConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, ReqsealConfig::default());
        assert_eq!(config.envelope.version, "1.0.0");
        assert_eq!(config.envelope.signature_algorithm, SignatureAlgorithm::Sha1WithRsa);
    }

    #[test]
    fn test_read_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(ReqsealConfig::read(&dir.path().join("absent.toml")).unwrap(), None);

        let path = dir.path().join("reqseal.toml");
        std::fs::write(&path, "[envelope]\nmerchant_id = \"M1\"\n").unwrap();
        let config = ReqsealConfig::read(&path).unwrap().unwrap();
        assert_eq!(config.envelope.merchant_id, "M1");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reqseal.toml");
        std::fs::write(
            &path,
            r#"
[envelope]
merchant_id = "6888800000001"
signature_algorithm = "SHA256WithRSA"

[keys]
recipient_public_key = "/etc/reqseal/peer.pem"

[log]
format = "json"
"#,
        )
        .unwrap();

        let config = ReqsealConfig::load(&path).unwrap();
        assert_eq!(config.envelope.merchant_id, "6888800000001");
        assert_eq!(config.envelope.signature_algorithm, SignatureAlgorithm::Sha256WithRsa);
        assert_eq!(config.envelope.encrypt_type, "AES");
        assert_eq!(config.envelope.timestamp_format, "%Y-%m-%d %H:%M:%S");
        assert_eq!(
            config.keys.recipient_public_key.as_deref(),
            Some(Path::new("/etc/reqseal/peer.pem"))
        );
        assert_eq!(config.keys.signing_private_key, None);
        assert_eq!(config.log.format, "json");
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_unknown_algorithm_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reqseal.toml");
        std::fs::write(&path, "[envelope]\nsignature_algorithm = \"MD5WithRSA\"\n").unwrap();

        let err = ReqsealConfig::load(&path).unwrap_err();
        assert!(matches!(err, ReqsealError::Config(_)));
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = ReqsealConfig::default();
        config.envelope.merchant_id = "M1".into();
        config.keys.sender_public_key = Some(PathBuf::from("sender.pem"));

        let text = config.to_toml().unwrap();
        assert_eq!(ReqsealConfig::from_toml(&text).unwrap(), config);
    }
}
