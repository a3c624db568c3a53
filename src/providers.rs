//! Capture and landmark providers
//!
//! The capture source and the landmark (pose-estimation) model are opaque
//! external services behind narrow request/response traits with explicit
//! non-fatal failure modes. A provider failure means "no hands this frame";
//! an absent capture source means the pipeline idles and produces no
//! pointers.

use crate::landmarks::HandDetection;
use anyhow::Result;
use async_trait::async_trait;

pub mod replay;

pub use replay::ReplaySource;

/// Opaque handle to one captured frame.
#[derive(Debug, Clone, Copy)]
pub struct CaptureFrame {
    pub seq: u64,
}

/// External capture source (camera, replay script, ...).
#[async_trait]
pub trait CaptureSource: Send + Sync {
    fn name(&self) -> &str;

    /// Readiness signal; the pipeline polls this before requesting frames.
    async fn ready(&self) -> bool;

    /// Next capture frame. `Ok(None)` means the source is exhausted.
    async fn next_frame(&self) -> Result<Option<CaptureFrame>>;

    /// Stop capturing. First step of the teardown order.
    async fn stop(&self);
}

/// External landmark provider: frame in, zero-to-two hand landmark sets out.
#[async_trait]
pub trait LandmarkProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn detect(&self, frame: &CaptureFrame) -> Result<Vec<HandDetection>>;
}

/// Capture source that never becomes ready (no camera granted).
///
/// The pipeline idles against it and produces no pointers.
pub struct IdleCapture;

#[async_trait]
impl CaptureSource for IdleCapture {
    fn name(&self) -> &str {
        "idle"
    }

    async fn ready(&self) -> bool {
        false
    }

    async fn next_frame(&self) -> Result<Option<CaptureFrame>> {
        Ok(None)
    }

    async fn stop(&self) {}
}

/// Landmark provider that never detects anything.
pub struct NullProvider;

#[async_trait]
impl LandmarkProvider for NullProvider {
    fn name(&self) -> &str {
        "null"
    }

    async fn detect(&self, _frame: &CaptureFrame) -> Result<Vec<HandDetection>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_idle_capture_never_ready() {
        let source = IdleCapture;
        assert!(!source.ready().await);
        assert!(source.next_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_null_provider_detects_nothing() {
        let provider = NullProvider;
        let frame = CaptureFrame { seq: 0 };
        assert!(provider.detect(&frame).await.unwrap().is_empty());
    }
}
