//! Remote statement analyzer boundary
//!
//! An external network service can replace the local parser entirely: it
//! accepts a whole statement file and returns a pre-classified
//! subscription list. The calling layer tries it first and falls back to
//! the local pipeline; this core only defines the contract and never
//! depends on the service being reachable.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{FileKind, Subscription};

/// Contract for the remote AI-based statement analyzer
///
/// Implementations live outside the core. Any timeout budget belongs to
/// the implementor; the core itself never blocks on network I/O.
#[async_trait]
pub trait StatementAnalyzer: Send + Sync {
    /// Analyze a whole statement file, bypassing the local pipeline.
    async fn analyze(&self, bytes: &[u8], kind: FileKind) -> Result<Vec<Subscription>>;

    /// Cheap availability probe so callers can skip a doomed attempt.
    async fn health_check(&self) -> bool {
        true
    }
}

/// Mock analyzer for tests
///
/// Returns a canned subscription list, or errors when unhealthy,
/// exercising both sides of the remote-first / local-fallback flow.
#[derive(Clone, Default)]
pub struct MockAnalyzer {
    pub healthy: bool,
    pub subscriptions: Vec<Subscription>,
}

impl MockAnalyzer {
    pub fn new(subscriptions: Vec<Subscription>) -> Self {
        Self {
            healthy: true,
            subscriptions,
        }
    }

    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            subscriptions: Vec::new(),
        }
    }
}

#[async_trait]
impl StatementAnalyzer for MockAnalyzer {
    async fn analyze(&self, _bytes: &[u8], _kind: FileKind) -> Result<Vec<Subscription>> {
        if !self.healthy {
            return Err(Error::Analyzer("mock analyzer is offline".into()));
        }
        Ok(self.subscriptions.clone())
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_analyzer_healthy() {
        let analyzer = MockAnalyzer::new(Vec::new());
        assert!(analyzer.health_check().await);
        let result = analyzer.analyze(b"anything", FileKind::Csv).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_mock_analyzer_offline() {
        let analyzer = MockAnalyzer::unhealthy();
        assert!(!analyzer.health_check().await);
        assert!(analyzer.analyze(b"anything", FileKind::Csv).await.is_err());
    }
}
