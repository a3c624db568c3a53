//! Gesture GW - gesture-to-interaction gateway
//!
//! Turns a stream of per-hand skeletal landmarks into virtual pointers with
//! discrete pose classifications, and drives UI interaction by synthesizing
//! activation events at each pointer's screen location.

pub mod api;
pub mod classifier;
pub mod config;
pub mod dispatch;
pub mod effects;
pub mod landmarks;
pub mod mode;
pub mod pipeline;
pub mod providers;
pub mod surface;
pub mod tracker;
