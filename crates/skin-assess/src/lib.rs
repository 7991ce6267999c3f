//! Skin-age assessment orchestration: remote analysis, deterministic fallback scoring, and the
//! session handoff consumed by the funnel pages.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
