//! Windowed statistical summaries
//!
//! A [`Snapshot`] is computed on demand from the live section registry and
//! frame buffer. It owns all of its data and never changes after
//! construction.

use crate::error::{ProfilerError, ProfilerResult};
use crate::registry::SectionRegistry;
use crate::ring_buffer::RingBuffer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write as _;

/// Frames slower than this miss a 60fps budget (~16.67 ms).
pub const JANK_60FPS_NS: u64 = 16_666_667;

/// Frames slower than this miss a 30fps budget (~33.33 ms).
pub const JANK_30FPS_NS: u64 = 33_333_333;

/// Percentile reported for sections and frames.
pub const P95_FRACTION: f64 = 0.95;

const NANOS_PER_MS: f64 = 1_000_000.0;

/// Nearest-rank percentile of ascending `sorted` values.
///
/// `fraction` is clamped to `[0, 1]`. The selected index is
/// `round((n - 1) * fraction)`, so the result is always an observed value.
/// Returns 0 for an empty slice.
pub fn percentile(sorted: &[u64], fraction: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
    let last = sorted.len() - 1;
    let index = ((last as f64) * fraction).round() as usize;
    sorted[index.min(last)]
}

fn saturating_sum(values: &[u64]) -> u64 {
    values.iter().fold(0u64, |acc, &v| acc.saturating_add(v))
}

fn share_percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Statistics for one section over the snapshot window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSummary {
    /// Section name
    pub name: String,
    /// Category fixed at the section's creation
    pub category: String,
    /// Whether this row is the profiler's own overhead
    pub internal: bool,
    /// Samples inside the window
    pub sample_count: usize,
    /// Sum of sample durations
    pub total_ns: u64,
    /// `total_ns / sample_count`, truncated
    pub average_ns: u64,
    /// Nearest-rank 95th percentile
    pub p95_ns: u64,
    /// Largest sample
    pub max_ns: u64,
    /// Share of all section time in the window, 0-100
    pub share_percent: f64,
}

impl SectionSummary {
    /// Summarize a non-empty set of durations. Returns `None` for an empty set.
    fn from_values(
        name: &str,
        category: &str,
        internal: bool,
        mut values: Vec<u64>,
    ) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        values.sort_unstable();

        let sample_count = values.len();
        let total_ns = saturating_sum(&values);

        Some(Self {
            name: name.to_string(),
            category: category.to_string(),
            internal,
            sample_count,
            total_ns,
            average_ns: total_ns / sample_count as u64,
            p95_ns: percentile(&values, P95_FRACTION),
            max_ns: values[sample_count - 1],
            share_percent: 0.0,
        })
    }

    /// Average duration in milliseconds.
    pub fn average_ms(&self) -> f64 {
        self.average_ns as f64 / NANOS_PER_MS
    }

    /// Total duration in milliseconds.
    pub fn total_ms(&self) -> f64 {
        self.total_ns as f64 / NANOS_PER_MS
    }
}

/// Section time rolled up by category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    /// Category label
    pub category: String,
    /// Number of sections with samples in the window
    pub section_count: usize,
    /// Sum of those sections' totals
    pub total_ns: u64,
    /// Share of all section time in the window, 0-100
    pub share_percent: f64,
}

/// Frame timing and jank over the snapshot window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSummary {
    /// Frames inside the window
    pub sample_count: usize,
    /// Mean frame time in milliseconds
    pub average_frame_ms: f64,
    /// Nearest-rank 95th percentile frame time in milliseconds
    pub p95_frame_ms: f64,
    /// Slowest frame in milliseconds
    pub max_frame_ms: f64,
    /// Percentage of frames over [`JANK_60FPS_NS`]
    pub jank16_percent: f64,
    /// Percentage of frames over [`JANK_30FPS_NS`]
    pub jank33_percent: f64,
}

impl FrameSummary {
    /// Summary of a window with no frames.
    pub const EMPTY: FrameSummary = FrameSummary {
        sample_count: 0,
        average_frame_ms: 0.0,
        p95_frame_ms: 0.0,
        max_frame_ms: 0.0,
        jank16_percent: 0.0,
        jank33_percent: 0.0,
    };

    /// Summarize frame durations given in nanoseconds.
    pub fn from_values(mut values: Vec<u64>) -> Self {
        if values.is_empty() {
            return Self::EMPTY;
        }
        values.sort_unstable();

        let n = values.len();
        let average_ns = saturating_sum(&values) / n as u64;
        let over_60 = values.iter().filter(|&&v| v > JANK_60FPS_NS).count();
        let over_30 = values.iter().filter(|&&v| v > JANK_30FPS_NS).count();

        Self {
            sample_count: n,
            average_frame_ms: average_ns as f64 / NANOS_PER_MS,
            p95_frame_ms: percentile(&values, P95_FRACTION) as f64 / NANOS_PER_MS,
            max_frame_ms: values[n - 1] as f64 / NANOS_PER_MS,
            jank16_percent: over_60 as f64 / n as f64 * 100.0,
            jank33_percent: over_30 as f64 / n as f64 * 100.0,
        }
    }

    /// Whether the window held no frames.
    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }
}

impl Default for FrameSummary {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Point-in-time summary of profiling data over a trailing window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Requested window in milliseconds
    pub window_ms: i64,
    /// Sections ranked by total time, truncated to the requested count
    pub sections: Vec<SectionSummary>,
    /// Categories ranked by total time
    pub categories: Vec<CategorySummary>,
    /// Frame statistics
    pub frame: FrameSummary,
    /// Total time across every section with samples, before truncation
    pub total_section_ns: u64,
}

impl Snapshot {
    /// A snapshot with no data.
    pub fn empty(window_ms: i64) -> Self {
        Self {
            window_ms,
            sections: Vec::new(),
            categories: Vec::new(),
            frame: FrameSummary::EMPTY,
            total_section_ns: 0,
        }
    }

    /// Whether the snapshot carries neither section nor frame data.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.frame.is_empty()
    }

    /// Find an application section by name.
    pub fn section(&self, name: &str) -> Option<&SectionSummary> {
        self.sections.iter().find(|s| !s.internal && s.name == name)
    }

    /// Find a category rollup by label.
    pub fn category(&self, category: &str) -> Option<&CategorySummary> {
        self.categories.iter().find(|c| c.category == category)
    }

    /// Export as pretty-printed JSON.
    pub fn to_json(&self) -> ProfilerResult<String> {
        serde_json::to_string_pretty(self).map_err(ProfilerError::Export)
    }

    /// Render a short multi-line report suitable for an overlay or a log line.
    pub fn format_compact(&self) -> String {
        let mut output = format!(
            "Profile: last {}ms, {:.2}ms in sections\n",
            self.window_ms,
            self.total_section_ns as f64 / NANOS_PER_MS
        );

        for section in &self.sections {
            let _ = writeln!(
                output,
                "  {} [{}]: {} samples, avg {:.2}ms, p95 {:.2}ms, max {:.2}ms ({:.1}%)",
                section.name,
                section.category,
                section.sample_count,
                section.average_ms(),
                section.p95_ns as f64 / NANOS_PER_MS,
                section.max_ns as f64 / NANOS_PER_MS,
                section.share_percent
            );
        }

        if !self.categories.is_empty() {
            output.push_str("Categories:\n");
            for category in &self.categories {
                let _ = writeln!(
                    output,
                    "  {}: {:.2}ms ({:.1}%)",
                    category.category,
                    category.total_ns as f64 / NANOS_PER_MS,
                    category.share_percent
                );
            }
        }

        let frame = &self.frame;
        let _ = writeln!(
            output,
            "Frames: {} samples, avg {:.2}ms, p95 {:.2}ms, max {:.2}ms, \
             jank16 {:.1}%, jank33 {:.1}%",
            frame.sample_count,
            frame.average_frame_ms,
            frame.p95_frame_ms,
            frame.max_frame_ms,
            frame.jank16_percent,
            frame.jank33_percent
        );

        output
    }
}

/// Sort by total descending, then name ascending.
fn rank_sections(sections: &mut [SectionSummary]) {
    sections.sort_by(|a, b| {
        b.total_ns
            .cmp(&a.total_ns)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.internal.cmp(&b.internal))
    });
}

fn roll_up_categories(
    sections: &[SectionSummary],
    total_section_ns: u64,
    max_categories: usize,
) -> Vec<CategorySummary> {
    let mut totals: HashMap<&str, (u64, usize)> = HashMap::new();
    for section in sections {
        let entry = totals.entry(section.category.as_str()).or_insert((0, 0));
        entry.0 = entry.0.saturating_add(section.total_ns);
        entry.1 += 1;
    }

    let mut categories: Vec<CategorySummary> = totals
        .into_iter()
        .map(|(category, (total_ns, section_count))| CategorySummary {
            category: category.to_string(),
            section_count,
            total_ns,
            share_percent: share_percent(total_ns, total_section_ns),
        })
        .collect();

    categories.sort_by(|a, b| {
        b.total_ns
            .cmp(&a.total_ns)
            .then_with(|| a.category.cmp(&b.category))
    });
    categories.truncate(max_categories);
    categories
}

/// Compute a snapshot from live state. The caller holds the state lock.
pub(crate) fn aggregate(
    registry: &SectionRegistry,
    frames: &RingBuffer,
    now: u64,
    window_ms: i64,
    top_n: usize,
    max_categories: usize,
) -> Snapshot {
    let window_ns = u64::try_from(window_ms)
        .unwrap_or(0)
        .saturating_mul(1_000_000);

    let mut sections: Vec<SectionSummary> = registry
        .iter()
        .filter_map(|entry| {
            SectionSummary::from_values(
                entry.name,
                entry.section.category(),
                entry.internal,
                entry.section.buffer().values_in_window(now, window_ns),
            )
        })
        .collect();

    let total_section_ns = sections
        .iter()
        .fold(0u64, |acc, s| acc.saturating_add(s.total_ns));

    for section in &mut sections {
        section.share_percent = share_percent(section.total_ns, total_section_ns);
    }

    let categories = roll_up_categories(&sections, total_section_ns, max_categories);

    rank_sections(&mut sections);
    sections.truncate(top_n.max(1));

    Snapshot {
        window_ms,
        sections,
        categories,
        frame: FrameSummary::from_values(frames.values_in_window(now, window_ns)),
        total_section_ns,
    }
}
