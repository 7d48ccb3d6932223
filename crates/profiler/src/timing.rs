//! Scope timing guards

use crate::clock::duration_to_ns;
use crate::profiler::Profiler;
use std::time::{Duration, Instant};

/// A guard that records the time from its creation until it is dropped.
///
/// Obtained from [`Profiler::start_section`]. If profiling was disabled when
/// the guard was created it stays inert: it never reads the clock and
/// records nothing. Because
/// recording happens in `Drop`, a panic unwinding through the guard's scope
/// still records the elapsed time.
///
/// # Example
///
/// ```rust
/// use profiler::Profiler;
///
/// let profiler = Profiler::new();
/// profiler.set_enabled(true);
///
/// fn layout_paragraph(profiler: &Profiler) {
///     let _timer = profiler.start_section("paragraph", "layout");
///     // ... layout code ...
/// } // recorded here
///
/// layout_paragraph(&profiler);
/// ```
#[must_use = "the section is recorded when the timer is dropped"]
pub struct SectionTimer<'a> {
    profiler: Option<&'a Profiler>,
    name: &'a str,
    category: &'a str,
    start: Option<Instant>,
}

impl<'a> SectionTimer<'a> {
    pub(crate) fn start(profiler: &'a Profiler, name: &'a str, category: &'a str) -> Self {
        let profiler = profiler.is_enabled().then_some(profiler);
        Self {
            profiler,
            name,
            category,
            start: profiler.map(|_| Instant::now()),
        }
    }

    /// Section name this timer records under.
    #[inline]
    pub fn name(&self) -> &str {
        self.name
    }

    /// Whether dropping this timer will record a sample.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.profiler.is_some()
    }

    /// Time since the timer started, or zero for an inert timer.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.map(|start| start.elapsed()).unwrap_or_default()
    }

    /// Record now and return the elapsed time. An inert timer returns zero.
    pub fn stop(mut self) -> Duration {
        self.finish()
    }

    /// Discard the measurement without recording.
    pub fn cancel(mut self) {
        self.profiler = None;
    }

    fn finish(&mut self) -> Duration {
        let (Some(profiler), Some(start)) = (self.profiler.take(), self.start.take()) else {
            return Duration::ZERO;
        };

        let elapsed = start.elapsed();
        tracing::trace!(
            target: "profiler",
            name = self.name,
            category = self.category,
            elapsed_ns = duration_to_ns(elapsed),
            "section timer completed"
        );
        profiler.finish_measurement(self.name, self.category, elapsed);
        elapsed
    }
}

impl Drop for SectionTimer<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Time the rest of the enclosing scope as a profiler section.
///
/// # Example
///
/// ```rust
/// use profiler::{time_section, Profiler};
///
/// fn draw(profiler: &Profiler) {
///     time_section!(profiler, "draw", "render");
///     // ... drawing code ...
/// }
///
/// let profiler = Profiler::new();
/// draw(&profiler);
/// ```
#[macro_export]
macro_rules! time_section {
    ($profiler:expr, $name:expr) => {
        let _section_timer = $profiler.start_section($name, $crate::DEFAULT_CATEGORY);
    };
    ($profiler:expr, $name:expr, $category:expr) => {
        let _section_timer = $profiler.start_section($name, $category);
    };
}

#[cfg(test)]
mod tests {
    use crate::clock::ManualClock;
    use crate::config::ProfilerConfig;
    use crate::profiler::Profiler;
    use std::panic::{self, AssertUnwindSafe};
    use std::thread::sleep;
    use std::time::Duration;

    fn enabled_profiler() -> Profiler {
        Profiler::with_clock(ProfilerConfig::new().with_enabled(true), ManualClock::new(1))
            .expect("default config is valid")
    }

    fn sample_count(profiler: &Profiler, name: &str) -> usize {
        profiler
            .snapshot(1_000, usize::MAX)
            .section(name)
            .map(|s| s.sample_count)
            .unwrap_or(0)
    }

    #[test]
    fn test_timer_records_on_drop() {
        let profiler = enabled_profiler();
        {
            let timer = profiler.start_section("scope", "cpu");
            assert!(timer.is_active());
            assert_eq!(timer.name(), "scope");
            sleep(Duration::from_millis(1));
        }
        assert_eq!(sample_count(&profiler, "scope"), 1);
    }

    #[test]
    fn test_timer_stop_returns_elapsed() {
        let profiler = enabled_profiler();
        let timer = profiler.start_section("stopped", "cpu");
        sleep(Duration::from_millis(5));
        let elapsed = timer.stop();

        assert!(
            elapsed >= Duration::from_millis(4),
            "elapsed should be at least 4ms, got {:?}",
            elapsed
        );
        assert_eq!(sample_count(&profiler, "stopped"), 1);
    }

    #[test]
    fn test_timer_cancel() {
        let profiler = enabled_profiler();
        let timer = profiler.start_section("cancelled", "cpu");
        timer.cancel();
        assert_eq!(sample_count(&profiler, "cancelled"), 0);
    }

    #[test]
    fn test_timer_inert_when_disabled() {
        let profiler = enabled_profiler();
        profiler.set_enabled(false);
        let timer = profiler.start_section("off", "cpu");
        assert!(!timer.is_active());

        // Enabling mid-flight does not revive an inert timer
        profiler.set_enabled(true);
        sleep(Duration::from_millis(1));
        drop(timer);
        assert_eq!(sample_count(&profiler, "off"), 0);
    }

    #[test]
    fn test_inert_timer_has_no_start_time() {
        let profiler = enabled_profiler();
        profiler.set_enabled(false);

        let timer = profiler.start_section("off", "cpu");
        assert!(timer.start.is_none());
        sleep(Duration::from_millis(1));
        assert_eq!(timer.elapsed(), Duration::ZERO);
        assert_eq!(timer.stop(), Duration::ZERO);
    }

    #[test]
    fn test_panic_still_records() {
        let profiler = enabled_profiler();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            profiler.measure("explode", "cpu", || {
                sleep(Duration::from_millis(1));
                panic!("work failed");
            })
        }));

        let payload = outcome.unwrap_err();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"work failed"));
        assert_eq!(sample_count(&profiler, "explode"), 1);
    }

    #[test]
    fn test_time_section_macro() {
        let profiler = enabled_profiler();
        {
            time_section!(profiler, "macro", "render");
            sleep(Duration::from_millis(1));
        }
        {
            time_section!(&profiler, "macro_default");
            sleep(Duration::from_millis(1));
        }

        let snapshot = profiler.snapshot(1_000, usize::MAX);
        assert_eq!(snapshot.section("macro").unwrap().category, "render");
        assert_eq!(snapshot.section("macro_default").unwrap().category, "general");
    }
}
