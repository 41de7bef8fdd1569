//! Facial-analysis collaborator seam.
//!
//! The actual video analysis runs in an external service; the engine only
//! consumes its structured summary. `AppState` holds an
//! `Arc<dyn FacialAnalyzer>`, swapped at startup.

use async_trait::async_trait;

use crate::interview::models::FacialAnalysis;

#[async_trait]
pub trait FacialAnalyzer: Send + Sync {
    /// Analyzes the candidate's answer video. `Ok(None)` when no analysis is
    /// available; the prompt renders its fixed "no data" placeholder.
    async fn analyze(&self, video: &[u8]) -> anyhow::Result<Option<FacialAnalysis>>;
}

/// Default analyzer for deployments without the video-analysis service.
pub struct NoopFacialAnalyzer;

#[async_trait]
impl FacialAnalyzer for NoopFacialAnalyzer {
    async fn analyze(&self, _video: &[u8]) -> anyhow::Result<Option<FacialAnalysis>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_analyzer_returns_no_analysis() {
        let analyzer = NoopFacialAnalyzer;
        assert!(analyzer.analyze(&[1, 2, 3]).await.unwrap().is_none());
    }
}
