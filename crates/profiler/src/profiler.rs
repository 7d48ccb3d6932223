//! The profiler context: recording, enable/reset and snapshots.

use crate::clock::{duration_to_ns, Clock, MonotonicClock};
use crate::config::ProfilerConfig;
use crate::error::ProfilerResult;
use crate::registry::{InternalSection, SectionRegistry, DEFAULT_CATEGORY};
use crate::ring_buffer::RingBuffer;
use crate::snapshot::{self, Snapshot};
use crate::timing::SectionTimer;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Everything guarded by the profiler's single lock.
#[derive(Debug)]
struct ProfilerState {
    sections: SectionRegistry,
    frames: RingBuffer,
}

/// Records section and frame durations and summarizes them on demand.
///
/// A profiler starts disabled with empty buffers. While disabled, every
/// recording call costs a single atomic load and [`measure`] just runs its
/// closure. Enabling or disabling never discards samples; [`reset`] does.
///
/// One mutex guards the section map, every section buffer and the frame
/// buffer, so a [`Snapshot`] never observes a half-applied write. Share the
/// profiler between threads with `&Profiler` or `Arc<Profiler>`.
///
/// The profiler records its own cost under reserved sections in the
/// `"profiler"` category (see [`InternalSection`]). Those samples show up in
/// snapshots like any other section.
///
/// # Example
///
/// ```rust
/// use profiler::Profiler;
///
/// let profiler = Profiler::new();
/// profiler.set_enabled(true);
///
/// let sum = profiler.measure("sum", "compute", || (1..=10).sum::<u32>());
/// assert_eq!(sum, 55);
///
/// profiler.record_frame_duration(12_000_000);
///
/// let snapshot = profiler.snapshot(1_000, 12);
/// assert_eq!(snapshot.frame.sample_count, 1);
/// ```
///
/// [`measure`]: Profiler::measure
/// [`reset`]: Profiler::reset
pub struct Profiler {
    enabled: AtomicBool,
    state: Mutex<ProfilerState>,
    clock: Box<dyn Clock>,
    config: ProfilerConfig,
}

impl Profiler {
    /// Create a disabled profiler with default buffer sizes.
    pub fn new() -> Self {
        Self::build(ProfilerConfig::default(), Box::new(MonotonicClock::new()))
    }

    /// Create a profiler from a configuration.
    pub fn with_config(config: ProfilerConfig) -> ProfilerResult<Self> {
        Self::with_clock(config, MonotonicClock::new())
    }

    /// Create a profiler that stamps samples with `clock`.
    pub fn with_clock(config: ProfilerConfig, clock: impl Clock + 'static) -> ProfilerResult<Self> {
        config.validate()?;
        Ok(Self::build(config, Box::new(clock)))
    }

    fn build(config: ProfilerConfig, clock: Box<dyn Clock>) -> Self {
        tracing::debug!(
            target: "profiler",
            section_capacity = config.section_capacity,
            frame_capacity = config.frame_capacity,
            enabled = config.enabled,
            "profiler created"
        );

        Self {
            enabled: AtomicBool::new(config.enabled),
            state: Mutex::new(ProfilerState {
                sections: SectionRegistry::new(config.section_capacity),
                frames: RingBuffer::new(config.frame_capacity),
            }),
            clock,
            config,
        }
    }

    /// The configuration this profiler was built with.
    pub fn config(&self) -> &ProfilerConfig {
        &self.config
    }

    /// Whether samples are currently being collected.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Turn collection on or off. Calls already past their enable check finish normally.
    pub fn set_enabled(&self, enabled: bool) {
        let was = self.enabled.swap(enabled, Ordering::Relaxed);
        if was != enabled {
            tracing::debug!(target: "profiler", enabled, "profiler toggled");
        }
    }

    /// Discard every recorded sample. The enable flag is left as is.
    pub fn reset(&self) {
        let mut state = self.lock_state();
        state.sections.clear();
        state.frames.clear();
        let sections = state.sections.len();
        drop(state);

        tracing::debug!(target: "profiler", sections, "profiler reset");
    }

    /// Record one duration for a named section.
    ///
    /// Ignored while disabled or when `duration_ns <= 0`. The first call for
    /// a given name fixes that section's category.
    pub fn record(&self, name: &str, duration_ns: i64, category: &str) {
        if !self.is_enabled() || duration_ns <= 0 {
            return;
        }

        let start = Instant::now();
        {
            let mut state = self.lock_state();
            let now = self.clock.now_ns();
            state.sections.append(name, category, now, duration_ns as u64);
        }
        self.record_internal(InternalSection::Record, start.elapsed());
    }

    /// Record one duration in the `"general"` category.
    pub fn record_general(&self, name: &str, duration_ns: i64) {
        self.record(name, duration_ns, DEFAULT_CATEGORY);
    }

    /// Record a [`Duration`] for a named section.
    pub fn record_duration(&self, name: &str, duration: Duration, category: &str) {
        self.record(name, duration_to_i64(duration), category);
    }

    /// Record how long one frame took to render.
    ///
    /// Ignored while disabled or when `duration_ns <= 0`.
    pub fn record_frame_duration(&self, duration_ns: i64) {
        if !self.is_enabled() || duration_ns <= 0 {
            return;
        }

        let start = Instant::now();
        {
            let mut state = self.lock_state();
            let now = self.clock.now_ns();
            state.frames.add(now, duration_ns as u64);
        }
        self.record_internal(InternalSection::Frame, start.elapsed());
    }

    /// Record a frame render time given as a [`Duration`].
    pub fn record_frame(&self, duration: Duration) {
        self.record_frame_duration(duration_to_i64(duration));
    }

    /// Run `work` and return its result, timing it if profiling is enabled.
    ///
    /// `work` always runs, and its return value (including any `Err`) is
    /// passed through untouched. If `work` panics, the elapsed time is still
    /// recorded while the panic unwinds, and the panic then continues to the
    /// caller.
    pub fn measure<T, F>(&self, name: &str, category: &str, work: F) -> T
    where
        F: FnOnce() -> T,
    {
        if !self.is_enabled() {
            return work();
        }
        let _timer = self.start_section(name, category);
        work()
    }

    /// Start a guard that records the time until it is dropped.
    ///
    /// The guard is inert if profiling is disabled when it starts.
    pub fn start_section<'a>(&'a self, name: &'a str, category: &'a str) -> SectionTimer<'a> {
        SectionTimer::start(self, name, category)
    }

    /// Record a finished measurement plus the cost of recording it.
    pub(crate) fn finish_measurement(&self, name: &str, category: &str, elapsed: Duration) {
        let start = Instant::now();
        self.record_duration(name, elapsed, category);
        self.record_internal(InternalSection::Measure, start.elapsed());
    }

    /// Summarize the last `window_ms` milliseconds, keeping the `top_n` largest sections.
    ///
    /// Returns [`Snapshot::empty`] without touching any buffer if the window
    /// is not positive or profiling is disabled. A `top_n` of 0 is treated
    /// as 1. The cost of building this snapshot is recorded afterwards and
    /// shows up in the next one.
    pub fn snapshot(&self, window_ms: i64, top_n: usize) -> Snapshot {
        if window_ms <= 0 || !self.is_enabled() {
            return Snapshot::empty(window_ms);
        }

        let start = Instant::now();
        let snapshot = {
            let state = self.lock_state();
            let now = self.clock.now_ns();
            snapshot::aggregate(
                &state.sections,
                &state.frames,
                now,
                window_ms,
                top_n,
                self.config.max_categories,
            )
        };
        let elapsed = start.elapsed();
        self.record_internal(InternalSection::Snapshot, elapsed);

        tracing::trace!(
            target: "profiler",
            window_ms,
            sections = snapshot.sections.len(),
            total_section_ns = snapshot.total_section_ns,
            frames = snapshot.frame.sample_count,
            elapsed_ns = duration_to_ns(elapsed),
            "snapshot computed"
        );

        snapshot
    }

    /// Snapshot using the configured default section count.
    pub fn snapshot_default(&self, window_ms: i64) -> Snapshot {
        self.snapshot(window_ms, self.config.default_top_n)
    }

    /// Append a self-overhead sample, subject to the usual gating.
    fn record_internal(&self, id: InternalSection, elapsed: Duration) {
        let duration_ns = duration_to_ns(elapsed);
        if !self.is_enabled() || duration_ns == 0 {
            return;
        }

        let mut state = self.lock_state();
        let now = self.clock.now_ns();
        state.sections.internal(id).add(now, duration_ns);
    }

    // Buffers stay consistent even if a holder panicked: every critical
    // section is a single append, clear or read.
    fn lock_state(&self) -> MutexGuard<'_, ProfilerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Profiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profiler")
            .field("enabled", &self.is_enabled())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn duration_to_i64(duration: Duration) -> i64 {
    i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX)
}
