// Error types for credential resolution and operation dispatch
//
// Batch-level errors (Credential, Connection) abort the whole invocation.
// Per-item errors (InputParse, Remote) are either recorded inline or wrapped
// in ItemFailed with the index of the offending item.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for connector operations
pub type Result<T> = std::result::Result<T, ConnectorError>;

/// Which half of the TLS key pair a file read was for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsFileKind {
    Certificate,
    PrivateKey,
}

impl fmt::Display for TlsFileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TlsFileKind::Certificate => write!(f, "certificate"),
            TlsFileKind::PrivateKey => write!(f, "key"),
        }
    }
}

/// Errors that can occur while resolving credentials or running a batch
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// TLS certificate or key file could not be read
    #[error("Failed to read TLS {kind} file '{}': {source}", .path.display())]
    Credential {
        kind: TlsFileKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Connection to the Temporal server could not be established
    #[error(
        "Failed to connect to Temporal server at {address}: {reason}\n\
         Please check:\n\
         - The Temporal server is running and reachable\n\
         - The server address is correct (host:port format)\n\
         - Network connectivity between this host and the server\n\
         - TLS configuration is correct (if using TLS)"
    )]
    Connection { address: String, reason: String },

    /// Item parameters were missing, malformed or named an unknown operation
    #[error("{0}")]
    InputParse(String),

    /// The Temporal server rejected or failed a call
    #[error("{0}")]
    Remote(String),

    /// A per-item error in fail-fast mode, tagged with the item index
    #[error("{source} [item {index}]")]
    ItemFailed {
        index: usize,
        #[source]
        source: Box<ConnectorError>,
    },

    /// HTTP transport failure during the credential probe
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ConnectorError {
    /// Create an input parse error
    pub fn input(msg: impl Into<String>) -> Self {
        ConnectorError::InputParse(msg.into())
    }

    /// Create a remote call error
    pub fn remote(msg: impl Into<String>) -> Self {
        ConnectorError::Remote(msg.into())
    }

    /// Create a connection error for the given address
    pub fn connection(address: impl Into<String>, reason: impl Into<String>) -> Self {
        ConnectorError::Connection {
            address: address.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a per-item error with the index of the failing item
    pub fn item_failed(index: usize, source: ConnectorError) -> Self {
        ConnectorError::ItemFailed {
            index,
            source: Box::new(source),
        }
    }

    /// Whether this error aborts the whole batch regardless of continue-on-fail
    pub fn is_batch_level(&self) -> bool {
        matches!(
            self,
            ConnectorError::Credential { .. } | ConnectorError::Connection { .. }
        )
    }

    /// Index of the failing item, for errors raised in fail-fast mode
    pub fn item_index(&self) -> Option<usize> {
        match self {
            ConnectorError::ItemFailed { index, .. } => Some(*index),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_lists_remediation_checks() {
        let err = ConnectorError::connection("temporal.internal:7233", "connection refused");
        let msg = err.to_string();

        assert!(msg.contains("temporal.internal:7233"));
        assert!(msg.contains("connection refused"));
        assert!(msg.contains("running and reachable"));
        assert!(msg.contains("host:port format"));
        assert!(msg.contains("Network connectivity"));
        assert!(msg.contains("TLS configuration"));
        assert!(err.is_batch_level());
    }

    #[test]
    fn test_item_failed_preserves_message_and_index() {
        let err = ConnectorError::item_failed(3, ConnectorError::remote("workflow not found"));

        assert_eq!(err.item_index(), Some(3));
        assert!(err.to_string().contains("workflow not found"));
        assert!(!err.is_batch_level());
    }

    #[test]
    fn test_credential_error_names_file() {
        let err = ConnectorError::Credential {
            kind: TlsFileKind::PrivateKey,
            path: PathBuf::from("/etc/temporal/client.key"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };

        let msg = err.to_string();
        assert!(msg.contains("TLS key file"));
        assert!(msg.contains("/etc/temporal/client.key"));
        assert!(err.is_batch_level());
    }
}
