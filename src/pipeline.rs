//! Frame pipeline - detection/classification offload with latest-wins
//!
//! One detection+classification cycle runs at a time. Frames arriving while
//! a cycle is in flight are dropped (latest-wins, no queue, no retry); the
//! tick loop keeps rendering and dispatching the last published pointer list
//! without blocking on inference latency. Classified results come back over
//! a channel so the tracker is only ever touched from the select loop.

use crate::classifier::ClassifierAdapter;
use crate::classifier::features::feature_vector;
use crate::landmarks::MAX_HANDS;
use crate::providers::{CaptureFrame, LandmarkProvider};
use crate::tracker::ClassifiedHand;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

/// Non-fatal pipeline conditions. The system degrades to "no virtual
/// pointer" rather than terminating.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("capture or landmark provider unavailable")]
    ProviderUnavailable,
    #[error("classifier model failed to load: {0}")]
    ModelLoadFailure(String),
    #[error("detection or classification failed for one frame: {0}")]
    TransientInference(String),
    #[error("no actionable element under the pointer")]
    DispatchTargetMissing,
}

/// One frame's classified detections, ready for the tracker.
#[derive(Debug)]
pub struct ClassifiedFrame {
    pub seq: u64,
    pub hands: Vec<ClassifiedHand>,
}

/// Offloads detection and classification, one cycle at a time.
pub struct FramePipeline {
    provider: Arc<dyn LandmarkProvider>,
    classifier: Arc<ClassifierAdapter>,
    in_flight: Arc<AtomicBool>,
    dropped_frames: Arc<AtomicU64>,
    results_tx: mpsc::Sender<ClassifiedFrame>,
    current_task: Option<JoinHandle<()>>,
}

impl FramePipeline {
    /// Build the pipeline and the receiving end for classified frames.
    pub fn new(
        provider: Arc<dyn LandmarkProvider>,
        classifier: Arc<ClassifierAdapter>,
    ) -> (Self, mpsc::Receiver<ClassifiedFrame>) {
        let (results_tx, results_rx) = mpsc::channel(MAX_HANDS * 4);
        (
            Self {
                provider,
                classifier,
                in_flight: Arc::new(AtomicBool::new(false)),
                dropped_frames: Arc::new(AtomicU64::new(0)),
                results_tx,
                current_task: None,
            },
            results_rx,
        )
    }

    /// Submit a capture frame for detection and classification.
    ///
    /// Returns false when the frame was dropped because a cycle is already
    /// in flight.
    pub fn submit(&mut self, frame: CaptureFrame) -> bool {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            let dropped = self.dropped_frames.fetch_add(1, Ordering::Relaxed) + 1;
            trace!("Dropped frame {} (cycle in flight, {} total)", frame.seq, dropped);
            return false;
        }

        let provider = self.provider.clone();
        let classifier = self.classifier.clone();
        let in_flight = self.in_flight.clone();
        let results_tx = self.results_tx.clone();

        self.current_task = Some(tokio::spawn(async move {
            match provider.detect(&frame).await {
                Ok(detections) => {
                    let mut hands = Vec::with_capacity(detections.len().min(MAX_HANDS));
                    for detection in detections.into_iter().take(MAX_HANDS) {
                        let features = feature_vector(&detection.landmarks);
                        let gesture = classifier.classify(&features).await;
                        hands.push(ClassifiedHand { detection, gesture });
                    }
                    if results_tx
                        .send(ClassifiedFrame {
                            seq: frame.seq,
                            hands,
                        })
                        .await
                        .is_err()
                    {
                        trace!("Pipeline consumer gone, discarding frame {}", frame.seq);
                    }
                }
                Err(e) => {
                    // This frame's output is skipped; the previous pointer
                    // list keeps rendering until it ages out.
                    warn!(
                        "{}",
                        PipelineError::TransientInference(format!("frame {}: {}", frame.seq, e))
                    );
                }
            }
            in_flight.store(false, Ordering::Release);
        }));
        true
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames.load(Ordering::Relaxed)
    }

    /// Cancel any in-flight inference. Second step of the teardown order,
    /// after the capture source has stopped.
    pub fn abort(&mut self) {
        if let Some(task) = self.current_task.take() {
            task.abort();
        }
        self.in_flight.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::GestureState;
    use crate::landmarks::{HandDetection, Handedness, Point2, LANDMARK_COUNT};
    use anyhow::Result;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Provider that waits before answering, to hold a cycle in flight.
    struct SlowProvider {
        delay: Duration,
    }

    #[async_trait]
    impl LandmarkProvider for SlowProvider {
        fn name(&self) -> &str {
            "slow"
        }

        async fn detect(&self, _frame: &CaptureFrame) -> Result<Vec<HandDetection>> {
            tokio::time::sleep(self.delay).await;
            Ok(vec![HandDetection::new(
                vec![Point2::new(0.5, 0.5); LANDMARK_COUNT],
                Handedness::Right,
            )])
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl LandmarkProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        async fn detect(&self, _frame: &CaptureFrame) -> Result<Vec<HandDetection>> {
            anyhow::bail!("camera disconnected")
        }
    }

    #[tokio::test]
    async fn test_frames_dropped_while_in_flight() {
        let provider = Arc::new(SlowProvider {
            delay: Duration::from_millis(100),
        });
        let (mut pipeline, mut rx) =
            FramePipeline::new(provider, Arc::new(ClassifierAdapter::degraded()));

        assert!(pipeline.submit(CaptureFrame { seq: 0 }));
        assert!(!pipeline.submit(CaptureFrame { seq: 1 }));
        assert!(!pipeline.submit(CaptureFrame { seq: 2 }));
        assert_eq!(pipeline.dropped_frames(), 2);

        // Only the first frame produces a result.
        let result = rx.recv().await.unwrap();
        assert_eq!(result.seq, 0);
        assert_eq!(result.hands.len(), 1);
        assert_eq!(result.hands[0].gesture, GestureState::Open);

        // Guard released: the next frame is accepted.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(pipeline.submit(CaptureFrame { seq: 3 }));
    }

    #[tokio::test]
    async fn test_provider_failure_skips_frame_and_releases_guard() {
        let (mut pipeline, mut rx) = FramePipeline::new(
            Arc::new(FailingProvider),
            Arc::new(ClassifierAdapter::degraded()),
        );

        assert!(pipeline.submit(CaptureFrame { seq: 0 }));

        // No result arrives for the failed frame.
        let timed_out =
            tokio::time::timeout(Duration::from_millis(50), rx.recv()).await.is_err();
        assert!(timed_out);

        // But the guard is released for the next frame.
        assert!(pipeline.submit(CaptureFrame { seq: 1 }));
    }

    #[tokio::test]
    async fn test_abort_releases_guard() {
        let provider = Arc::new(SlowProvider {
            delay: Duration::from_secs(60),
        });
        let (mut pipeline, _rx) =
            FramePipeline::new(provider, Arc::new(ClassifierAdapter::degraded()));

        assert!(pipeline.submit(CaptureFrame { seq: 0 }));
        pipeline.abort();
        assert!(pipeline.submit(CaptureFrame { seq: 1 }));
    }
}
