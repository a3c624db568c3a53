//! Gesture GW - Rust implementation
//!
//! Gateway turning hand-tracking landmarks into virtual pointers that drive
//! UI interaction through synthesized activation events.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gesture_gw::api::{ApiState, PointerInfo, StateSnapshot};
use gesture_gw::classifier::{ClassifierAdapter, GestureState, HeuristicModel, GESTURE_LABELS};
use gesture_gw::config::{watcher::ConfigWatcher, AppConfig};
use gesture_gw::dispatch::Dispatcher;
use gesture_gw::effects::EffectManager;
use gesture_gw::mode::ModeController;
use gesture_gw::pipeline::{FramePipeline, PipelineError};
use gesture_gw::providers::{CaptureSource, IdleCapture, LandmarkProvider, NullProvider, ReplaySource};
use gesture_gw::providers::replay::ReplayScript;
use gesture_gw::surface::{ConsoleSurface, UiSurface};
use gesture_gw::tracker::CursorTracker;

/// Gesture Gateway - drive UI interaction from hand-tracking gestures
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Play a landmark replay script instead of the configured capture source
    #[arg(long)]
    replay: Option<String>,

    /// Override the debug API port from the configuration file
    #[arg(long)]
    api_port: Option<u16>,

    /// Disable the debug/telemetry API server
    #[arg(long)]
    no_api: bool,

    /// Test the gesture classifier against synthetic hands
    #[arg(long)]
    test_classifier: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level)?;

    info!("Starting Gesture GW...");
    info!("Configuration file: {}", args.config);

    // Handle classifier test mode
    if args.test_classifier {
        test_classifier().await?;
        return Ok(());
    }

    // Load configuration with hot-reload watcher
    let (config_watcher, initial_config) = ConfigWatcher::new(args.config.clone()).await?;
    info!("Configuration loaded successfully with hot-reload enabled");

    // Set up shutdown signal
    let shutdown_signal = shutdown_signal();

    // Start the main application
    run_app(
        (*initial_config).clone(),
        config_watcher,
        args.replay,
        args.api_port,
        args.no_api,
        shutdown_signal,
    )
    .await?;

    info!("Gesture GW shutdown complete");
    Ok(())
}

async fn run_app(
    config: AppConfig,
    mut config_watcher: ConfigWatcher,
    replay_override: Option<String>,
    api_port_override: Option<u16>,
    no_api: bool,
    shutdown: impl std::future::Future<Output = ()>,
) -> Result<()> {
    info!("Starting main application loop...");

    // Shared interaction mode, injected into dispatcher and API
    let mode = Arc::new(ModeController::new());

    // Classifier adapter - degraded when no model is configured
    let classifier = match config.classifier.model.as_str() {
        "heuristic" => Arc::new(ClassifierAdapter::new(Arc::new(HeuristicModel::default()))),
        "none" => {
            info!("No classifier model configured, running degraded");
            Arc::new(ClassifierAdapter::degraded())
        }
        other => {
            warn!(
                "{}",
                PipelineError::ModelLoadFailure(format!("model '{}' not available", other))
            );
            Arc::new(ClassifierAdapter::degraded())
        }
    };

    // UI surface (console implementation for development)
    let surface: Arc<dyn UiSurface> = Arc::new(ConsoleSurface::new("console"));
    info!("UI surface registered: {}", surface.name());

    // Capture source and landmark provider
    let replay_path = replay_override.or_else(|| config.capture.replay_script.clone());
    let (capture, provider): (Arc<dyn CaptureSource>, Arc<dyn LandmarkProvider>) =
        match replay_path {
            Some(path) => {
                let script = ReplayScript::load(&path).await?;
                let source = Arc::new(ReplaySource::new(script));
                info!("Capture source: replay script {}", path);
                (source.clone(), source)
            }
            None => {
                warn!("{}", PipelineError::ProviderUnavailable);
                (Arc::new(IdleCapture), Arc::new(NullProvider))
            }
        };

    // Core pipeline state
    let mut tracker = CursorTracker::new(
        config.display.width,
        config.display.height,
        Duration::from_millis(config.tracking.freshness_ms),
    );
    let mut effects = EffectManager::new(
        Duration::from_millis(config.effects.lifetime_ms),
        config.effects.base_radius,
        config.effects.growth_span,
    );
    let mut dispatcher = Dispatcher::new(
        surface.clone(),
        mode.clone(),
        Duration::from_millis(config.dispatch.debounce_ms),
        Duration::from_millis(config.tracking.freshness_ms),
    );
    let (mut pipeline, mut results_rx) = FramePipeline::new(provider, classifier);

    // Debug/telemetry API
    let api_state = ApiState::new(mode.clone());
    if config.api.enabled && !no_api {
        let api_state = api_state.clone();
        let port = api_port_override.unwrap_or(config.api.port);
        tokio::spawn(async move {
            if let Err(e) = gesture_gw::api::run_server(api_state, port).await {
                warn!("Debug API server stopped: {}", e);
            }
        });
    }

    // Capture pump: polls readiness and forwards frames into the select loop
    let (frames_tx, mut frames_rx) = mpsc::channel(4);
    let pump_capture = capture.clone();
    let pump = tokio::spawn(async move {
        loop {
            if !pump_capture.ready().await {
                tokio::time::sleep(Duration::from_millis(250)).await;
                continue;
            }
            match pump_capture.next_frame().await {
                Ok(Some(frame)) => {
                    if frames_tx.send(frame).await.is_err() {
                        break;
                    }
                }
                Ok(None) => tokio::time::sleep(Duration::from_millis(250)).await,
                Err(e) => {
                    warn!("Capture source error: {}", e);
                    tokio::time::sleep(Duration::from_millis(250)).await;
                }
            }
        }
    });

    info!("Ready to process landmark frames!");

    // Render/dispatch tick, tied to display refresh
    let mut tick = tokio::time::interval(Duration::from_millis(16));

    // Main event loop
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            // Capture frames, non-overlapping: in-flight cycles drop frames
            Some(frame) = frames_rx.recv() => {
                pipeline.submit(frame);
            }

            // Classified detections from the offloaded cycle
            Some(classified) = results_rx.recv() => {
                let now = Instant::now();
                let transitions = tracker.apply_frame(&classified.hands, now);
                effects.on_transitions(&transitions, tracker.points(), now);
            }

            // Dispatch and publish against the last published pointer list
            _ = tick.tick() => {
                let now = Instant::now();
                let dispatches = dispatcher.run_tick(tracker.points(), now).await;
                let effect_frames = effects.tick(tracker.points(), now);

                let pointers = tracker
                    .points()
                    .iter()
                    .map(|p| PointerInfo {
                        x: p.x,
                        y: p.y,
                        gesture: p.gesture.as_str().to_string(),
                        handedness: p.handedness.as_str().to_string(),
                        color: p.color().to_string(),
                        fresh: p.is_fresh(now, tracker.freshness()),
                    })
                    .collect();

                api_state.publish(StateSnapshot {
                    timestamp_ms: StateSnapshot::now_ms(),
                    mode: mode.current().as_str().to_string(),
                    pointers,
                    effects: effect_frames,
                    recent_dispatches: dispatches,
                    dropped_frames: pipeline.dropped_frames(),
                });
            }

            // Handle config reload
            Some(new_config) = config_watcher.next_config() => {
                info!("Configuration file changed, applying...");
                tracker.reconfigure(
                    new_config.display.width,
                    new_config.display.height,
                    Duration::from_millis(new_config.tracking.freshness_ms),
                );
                dispatcher.reconfigure(
                    Duration::from_millis(new_config.dispatch.debounce_ms),
                    Duration::from_millis(new_config.tracking.freshness_ms),
                );
                effects.reconfigure(
                    Duration::from_millis(new_config.effects.lifetime_ms),
                    new_config.effects.base_radius,
                    new_config.effects.growth_span,
                );
                info!("Configuration applied without dropping pointers");
            }

            // Handle shutdown signal. Teardown order: capture source first,
            // then any in-flight inference, then the tick loop exits.
            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping...");
                capture.stop().await;
                pipeline.abort();
                break;
            }
        }
    }

    pump.abort();
    info!("Capture and inference stopped");

    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    info!("Shutdown signal received");
}

async fn test_classifier() -> Result<()> {
    use colored::*;
    use gesture_gw::classifier::features::feature_vector;
    use gesture_gw::landmarks::{Point2, INDEX_TIP, LANDMARK_COUNT, THUMB_TIP};

    println!("\n{}", "=== Testing Gesture Classifier ===".bold().cyan());

    println!("\n{}", "Class table:".bold());
    for (index, label) in GESTURE_LABELS.iter().enumerate() {
        println!("  {} -> {}", index, label.as_str().yellow());
    }

    let adapter = ClassifierAdapter::new(Arc::new(HeuristicModel::default()));

    // Spread hand: fingertips fan out from the wrist
    let open_hand: Vec<Point2> = (0..LANDMARK_COUNT)
        .map(|i| Point2::new(0.5 + (i as f32 * 0.017), 0.8 - (i as f32 * 0.03)))
        .collect();

    // Pinched hand: thumb and index tips together
    let mut pinched_hand = vec![Point2::new(0.5, 0.8); LANDMARK_COUNT];
    pinched_hand[THUMB_TIP] = Point2::new(0.45, 0.3);
    pinched_hand[INDEX_TIP] = Point2::new(0.45, 0.3);

    println!("\n{}", "Sample classifications:".bold());
    for (name, hand) in [("spread", open_hand), ("pinched", pinched_hand)] {
        let state = adapter.classify(&feature_vector(&hand)).await;
        let colored_state = match state {
            GestureState::Open => state.as_str().green(),
            GestureState::Closed => state.as_str().magenta(),
            GestureState::Pointing => state.as_str().blue(),
        };
        println!("  {} hand -> {}", name.bright_white(), colored_state);
    }

    println!("\n{}", "Classifier test complete!".green().bold());

    Ok(())
}
