// Credential resolution
//
// Turns the credential record supplied by the host into a ConnectionConfig.
// TLS is all-or-nothing: both the certificate and key paths must be set,
// otherwise the connection is unencrypted and no file is read.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{ConnectorError, Result, TlsFileKind};

/// Default connect timeout when the record leaves it unset
pub const DEFAULT_CONNECT_TIMEOUT_SECS: f64 = 10.0;

/// Default namespace for Temporal operations
pub const DEFAULT_NAMESPACE: &str = "default";

/// Default server address offered to hosts
pub const DEFAULT_ADDRESS: &str = "localhost:7233";

/// Credentials supplied by the host platform per invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    /// Temporal server address (host:port)
    pub address: String,

    /// Namespace to use for Temporal operations
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Path to the TLS client certificate (empty means no TLS)
    #[serde(default)]
    pub tls_cert_path: String,

    /// Path to the TLS client key (empty means no TLS)
    #[serde(default)]
    pub tls_key_path: String,

    /// Connect timeout in seconds
    #[serde(default, alias = "connectTimeout")]
    pub connect_timeout_seconds: Option<f64>,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

impl Default for CredentialRecord {
    fn default() -> Self {
        Self::new(DEFAULT_ADDRESS)
    }
}

impl CredentialRecord {
    /// Create a record for the given address with default namespace and no TLS
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            namespace: default_namespace(),
            tls_cert_path: String::new(),
            tls_key_path: String::new(),
            connect_timeout_seconds: None,
        }
    }

    /// Set the namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the TLS certificate and key paths
    pub fn with_tls(mut self, cert_path: impl Into<String>, key_path: impl Into<String>) -> Self {
        self.tls_cert_path = cert_path.into();
        self.tls_key_path = key_path.into();
        self
    }

    /// Set the connect timeout in seconds
    pub fn with_connect_timeout(mut self, seconds: f64) -> Self {
        self.connect_timeout_seconds = Some(seconds);
        self
    }

    /// Connect timeout in milliseconds, falling back to the default for
    /// absent, zero, negative or non-finite values
    pub fn timeout_millis(&self) -> u64 {
        let seconds = self
            .connect_timeout_seconds
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);
        (seconds * 1000.0).round() as u64
    }

    /// Which TLS files to load, if any
    pub fn tls_paths(&self) -> TlsPaths {
        let cert = non_empty(&self.tls_cert_path);
        let key = non_empty(&self.tls_key_path);

        match (cert, key) {
            (Some(cert), Some(key)) => TlsPaths::Both {
                cert: PathBuf::from(cert),
                key: PathBuf::from(key),
            },
            (None, None) => TlsPaths::None,
            _ => TlsPaths::Incomplete,
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Result of the two-field TLS presence check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsPaths {
    /// Neither path configured
    None,
    /// Only one of the two paths configured; treated as no TLS
    Incomplete,
    /// Both paths configured
    Both { cert: PathBuf, key: PathBuf },
}

/// Client certificate and private key bytes
#[derive(Clone, PartialEq, Eq)]
pub struct TlsMaterial {
    pub cert: Vec<u8>,
    pub key: Vec<u8>,
}

impl fmt::Debug for TlsMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsMaterial")
            .field("cert", &format_args!("{} bytes", self.cert.len()))
            .field("key", &"[redacted]")
            .finish()
    }
}

/// TLS mode of a connection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsSetting {
    #[default]
    Disabled,
    Enabled(TlsMaterial),
}

impl TlsSetting {
    pub fn is_enabled(&self) -> bool {
        matches!(self, TlsSetting::Enabled(_))
    }

    pub fn material(&self) -> Option<&TlsMaterial> {
        match self {
            TlsSetting::Enabled(material) => Some(material),
            TlsSetting::Disabled => None,
        }
    }
}

/// Normalized connection configuration derived from a CredentialRecord
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub address: String,
    pub namespace: String,
    pub timeout_millis: u64,
    pub tls: TlsSetting,
}

impl ConnectionConfig {
    /// Plaintext configuration, mostly useful for tests and dry runs
    pub fn plaintext(address: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            namespace: namespace.into(),
            timeout_millis: (DEFAULT_CONNECT_TIMEOUT_SECS * 1000.0) as u64,
            tls: TlsSetting::Disabled,
        }
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_millis)
    }
}

/// Resolve a credential record into a connection configuration.
///
/// Reads the TLS certificate and key concurrently when both paths are set.
/// Fails only when one of those reads fails.
pub async fn resolve(record: &CredentialRecord) -> Result<ConnectionConfig> {
    let tls = match record.tls_paths() {
        TlsPaths::Both { cert, key } => {
            debug!(cert = %cert.display(), key = %key.display(), "Loading TLS client material");
            let (cert, key) = tokio::try_join!(
                read_tls_file(&cert, TlsFileKind::Certificate),
                read_tls_file(&key, TlsFileKind::PrivateKey),
            )?;
            TlsSetting::Enabled(TlsMaterial { cert, key })
        }
        TlsPaths::Incomplete => {
            warn!(
                address = %record.address,
                "Only one of TLS certificate/key path is set, connecting without TLS"
            );
            TlsSetting::Disabled
        }
        TlsPaths::None => TlsSetting::Disabled,
    };

    Ok(ConnectionConfig {
        address: record.address.trim().to_string(),
        namespace: record.namespace.clone(),
        timeout_millis: record.timeout_millis(),
        tls,
    })
}

async fn read_tls_file(path: &Path, kind: TlsFileKind) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|source| ConnectorError::Credential {
            kind,
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_defaults_from_json() {
        let record: CredentialRecord =
            serde_json::from_value(json!({ "address": "temporal:7233" })).unwrap();

        assert_eq!(record.namespace, "default");
        assert_eq!(record.tls_paths(), TlsPaths::None);
        assert_eq!(record.timeout_millis(), 10_000);
    }

    #[test]
    fn test_connect_timeout_alias() {
        let record: CredentialRecord = serde_json::from_value(json!({
            "address": "temporal:7233",
            "connectTimeout": 2.5
        }))
        .unwrap();

        assert_eq!(record.timeout_millis(), 2_500);
    }

    #[test]
    fn test_timeout_falls_back_for_zero_and_negative() {
        let record = CredentialRecord::new("x:1").with_connect_timeout(0.0);
        assert_eq!(record.timeout_millis(), 10_000);

        let record = CredentialRecord::new("x:1").with_connect_timeout(-3.0);
        assert_eq!(record.timeout_millis(), 10_000);

        let record = CredentialRecord::new("x:1").with_connect_timeout(f64::NAN);
        assert_eq!(record.timeout_millis(), 10_000);
    }

    #[test]
    fn test_tls_paths_all_or_nothing() {
        let cert_only = CredentialRecord::new("x:1").with_tls("/tmp/cert.pem", "");
        assert_eq!(cert_only.tls_paths(), TlsPaths::Incomplete);

        let key_only = CredentialRecord::new("x:1").with_tls("", "/tmp/key.pem");
        assert_eq!(key_only.tls_paths(), TlsPaths::Incomplete);

        let whitespace = CredentialRecord::new("x:1").with_tls("  ", "/tmp/key.pem");
        assert_eq!(whitespace.tls_paths(), TlsPaths::Incomplete);

        let both = CredentialRecord::new("x:1").with_tls("/tmp/cert.pem", "/tmp/key.pem");
        assert_eq!(
            both.tls_paths(),
            TlsPaths::Both {
                cert: PathBuf::from("/tmp/cert.pem"),
                key: PathBuf::from("/tmp/key.pem"),
            }
        );
    }

    #[tokio::test]
    async fn test_incomplete_tls_never_reads_files() {
        // Paths that do not exist: any read attempt would fail resolution
        let record = CredentialRecord::new("localhost:7233")
            .with_tls("/nonexistent/cert.pem", "");

        let config = resolve(&record).await.unwrap();
        assert_eq!(config.tls, TlsSetting::Disabled);
    }

    #[test]
    fn test_tls_material_debug_redacts_key() {
        let material = TlsMaterial {
            cert: b"CERT".to_vec(),
            key: b"SECRET".to_vec(),
        };
        let debug = format!("{:?}", material);
        assert!(!debug.contains("SECRET"));
        assert!(debug.contains("4 bytes"));
    }
}
