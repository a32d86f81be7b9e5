// Backend selection
// Decision: Backend is chosen at runtime via --backend / TEMPORAL_CONNECTOR_BACKEND.
// "temporal" talks gRPC to a real server (requires the `temporal` feature),
// "inmemory" completes workflows immediately and is meant for dry runs.

use anyhow::Result;
use std::sync::Arc;
use temporal_connector::{InMemoryTemporal, RemoteService};

/// Type of remote backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backend {
    /// Real Temporal server over gRPC
    #[default]
    Temporal,
    /// In-memory cluster, nothing leaves the process
    InMemory,
}

impl std::str::FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "temporal" | "" => Ok(Backend::Temporal),
            "inmemory" | "in-memory" | "in_memory" | "memory" => Ok(Backend::InMemory),
            _ => anyhow::bail!("Unknown backend: {}. Use 'temporal' or 'inmemory'", s),
        }
    }
}

/// Create the remote service for the selected backend
pub fn create_remote(backend: Backend) -> Result<Arc<dyn RemoteService>> {
    match backend {
        Backend::InMemory => {
            tracing::info!("Using in-memory Temporal backend");
            Ok(Arc::new(InMemoryTemporal::new()))
        }
        Backend::Temporal => {
            #[cfg(feature = "temporal")]
            {
                tracing::debug!("Using Temporal gRPC backend");
                Ok(Arc::new(temporal_connector::TemporalService::new()))
            }
            #[cfg(not(feature = "temporal"))]
            {
                anyhow::bail!(
                    "Temporal backend requested but 'temporal' feature is not enabled. \
                     Compile with --features temporal or use --backend inmemory"
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str() {
        assert_eq!("temporal".parse::<Backend>().unwrap(), Backend::Temporal);
        assert_eq!("In-Memory".parse::<Backend>().unwrap(), Backend::InMemory);
        assert_eq!("inmemory".parse::<Backend>().unwrap(), Backend::InMemory);
        assert!("redis".parse::<Backend>().is_err());
    }

    #[test]
    fn test_inmemory_backend_available() {
        assert!(create_remote(Backend::InMemory).is_ok());
    }
}
