//! Section and Frame Profiler
//!
//! This crate provides a low-overhead, in-process performance aggregator:
//! - Named section timings grouped into categories
//! - Per-frame render times with 60fps / 30fps jank classification
//! - Windowed snapshots with totals, averages, p95, category rollups
//! - Self-overhead accounting under reserved `profiler.*` sections
//!
//! Samples live in fixed-capacity ring buffers, so memory use is bounded and
//! old samples are evicted first. A disabled profiler costs one atomic load
//! per call.
//!
//! # Example
//!
//! ```rust
//! use profiler::{Profiler, ProfilerConfig};
//!
//! let profiler = Profiler::with_config(ProfilerConfig::new().with_enabled(true)).unwrap();
//!
//! let lines = profiler.measure("shape_text", "layout", || vec!["line one", "line two"]);
//! assert_eq!(lines.len(), 2);
//!
//! profiler.record("upload", 2_500_000, "render");
//! profiler.record_frame_duration(18_000_000);
//!
//! let snapshot = profiler.snapshot(5_000, 12);
//! assert_eq!(snapshot.section("upload").unwrap().total_ns, 2_500_000);
//! assert_eq!(snapshot.frame.jank16_percent, 100.0);
//! println!("{}", snapshot.format_compact());
//! ```

mod clock;
mod config;
mod error;
mod profiler;
mod registry;
mod ring_buffer;
mod snapshot;
mod timing;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::*;
pub use error::{ProfilerError, ProfilerResult};
pub use profiler::Profiler;
pub use registry::{InternalSection, DEFAULT_CATEGORY, PROFILER_CATEGORY};
pub use ring_buffer::{RingBuffer, EMPTY_SLOT};
pub use snapshot::{
    percentile, CategorySummary, FrameSummary, SectionSummary, Snapshot, JANK_30FPS_NS,
    JANK_60FPS_NS, P95_FRACTION,
};
pub use timing::SectionTimer;

/// Re-export for convenience
pub use std::time::Duration;
