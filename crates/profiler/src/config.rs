//! Profiler configuration

use crate::error::{ProfilerError, ProfilerResult};
use serde::{Deserialize, Serialize};

/// Samples kept per section before the oldest is overwritten.
pub const DEFAULT_SECTION_CAPACITY: usize = 1200;

/// Frame durations kept before the oldest is overwritten.
pub const DEFAULT_FRAME_CAPACITY: usize = 2400;

/// Sections shown by [`crate::Profiler::snapshot_default`].
pub const DEFAULT_TOP_N: usize = 12;

/// Categories kept in a snapshot's rollup.
pub const DEFAULT_MAX_CATEGORIES: usize = 8;

/// Profiler configuration.
///
/// Controls buffer sizes and snapshot truncation. All fields have defaults
/// matching a 60fps diagnostics overlay, so most hosts only ever call
/// [`ProfilerConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfilerConfig {
    /// Ring buffer capacity for every named section.
    pub section_capacity: usize,

    /// Ring buffer capacity for frame durations.
    ///
    /// At 60fps the default holds roughly 40 seconds of frames.
    pub frame_capacity: usize,

    /// Number of sections kept by `snapshot_default`.
    pub default_top_n: usize,

    /// Maximum number of categories in a snapshot rollup.
    pub max_categories: usize,

    /// Whether profiling starts enabled.
    pub enabled: bool,
}

impl ProfilerConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self {
            section_capacity: DEFAULT_SECTION_CAPACITY,
            frame_capacity: DEFAULT_FRAME_CAPACITY,
            default_top_n: DEFAULT_TOP_N,
            max_categories: DEFAULT_MAX_CATEGORIES,
            enabled: false,
        }
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> ProfilerResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Builder method to set the per-section capacity.
    pub fn with_section_capacity(mut self, capacity: usize) -> Self {
        self.section_capacity = capacity;
        self
    }

    /// Builder method to set the frame buffer capacity.
    pub fn with_frame_capacity(mut self, capacity: usize) -> Self {
        self.frame_capacity = capacity;
        self
    }

    /// Builder method to set the default number of sections per snapshot.
    pub fn with_default_top_n(mut self, top_n: usize) -> Self {
        self.default_top_n = top_n;
        self
    }

    /// Builder method to set the category rollup limit.
    pub fn with_max_categories(mut self, max: usize) -> Self {
        self.max_categories = max;
        self
    }

    /// Builder method to set the initial enable flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Check that the configuration can back a profiler.
    pub fn validate(&self) -> ProfilerResult<()> {
        if self.section_capacity == 0 {
            return Err(ProfilerError::ZeroCapacity { buffer: "section" });
        }
        if self.frame_capacity == 0 {
            return Err(ProfilerError::ZeroCapacity { buffer: "frame" });
        }
        if self.max_categories == 0 {
            return Err(ProfilerError::ZeroCategoryLimit);
        }
        Ok(())
    }
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self::new()
    }
}
