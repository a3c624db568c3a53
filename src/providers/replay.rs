//! Replay capture source - scripted landmark frames for development
//!
//! Plays a YAML script of landmark frames at a fixed rate, acting as both
//! the capture source and the landmark provider. Deterministic stand-in for
//! a live camera plus pose estimator.

use super::{CaptureFrame, CaptureSource, LandmarkProvider};
use crate::landmarks::{HandDetection, RawLandmarkFrame};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;
use tracing::info;

/// Replay script: a frame list played at `fps`, optionally looping.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayScript {
    #[serde(default = "default_fps")]
    pub fps: f32,
    #[serde(default, rename = "loop")]
    pub loop_playback: bool,
    pub frames: Vec<ScriptFrame>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptFrame {
    #[serde(default)]
    pub hands: Vec<HandDetection>,
}

fn default_fps() -> f32 {
    30.0
}

impl ReplayScript {
    pub fn parse(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse replay script")
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read replay script: {}", path.display()))?;
        Self::parse(&content)
    }
}

/// Plays a [`ReplayScript`], implementing both provider-side traits.
pub struct ReplaySource {
    script: ReplayScript,
    seq: AtomicU64,
    ticker: Mutex<IntervalStream>,
    stopped: std::sync::atomic::AtomicBool,
}

impl ReplaySource {
    pub fn new(script: ReplayScript) -> Self {
        let period = std::time::Duration::from_secs_f32(1.0 / script.fps.max(1.0));
        info!(
            "Replay source: {} frame(s) at {:.0} fps (loop: {})",
            script.frames.len(),
            script.fps,
            script.loop_playback
        );
        Self {
            script,
            seq: AtomicU64::new(0),
            ticker: Mutex::new(IntervalStream::new(tokio::time::interval(period))),
            stopped: std::sync::atomic::AtomicBool::new(false),
        }
    }

    fn frame_at(&self, seq: u64) -> Option<RawLandmarkFrame> {
        let len = self.script.frames.len() as u64;
        if len == 0 {
            return None;
        }
        let index = if self.script.loop_playback {
            (seq % len) as usize
        } else if seq < len {
            seq as usize
        } else {
            return None;
        };
        Some(RawLandmarkFrame::new(
            self.script.frames[index].hands.clone(),
        ))
    }
}

#[async_trait]
impl CaptureSource for ReplaySource {
    fn name(&self) -> &str {
        "replay"
    }

    async fn ready(&self) -> bool {
        !self.stopped.load(Ordering::Relaxed) && !self.script.frames.is_empty()
    }

    async fn next_frame(&self) -> Result<Option<CaptureFrame>> {
        if self.stopped.load(Ordering::Relaxed) {
            return Ok(None);
        }
        self.ticker.lock().await.next().await;

        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        if !self.script.loop_playback && seq >= self.script.frames.len() as u64 {
            return Ok(None);
        }
        Ok(Some(CaptureFrame { seq }))
    }

    async fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
        info!("Replay source stopped");
    }
}

#[async_trait]
impl LandmarkProvider for ReplaySource {
    fn name(&self) -> &str {
        "replay"
    }

    async fn detect(&self, frame: &CaptureFrame) -> Result<Vec<HandDetection>> {
        Ok(self
            .frame_at(frame.seq)
            .map(|f| f.hands)
            .unwrap_or_default())
    }
}
