//! Fixed-capacity circular store of timestamped samples.

/// Timestamp value marking a slot that has never been written.
pub const EMPTY_SLOT: u64 = 0;

/// A fixed-capacity ring of `(timestamp, value)` pairs.
///
/// Once full, each insertion overwrites the oldest sample. Timestamps and
/// values live in two parallel arrays allocated up front, so [`add`] never
/// allocates.
///
/// A slot whose timestamp is [`EMPTY_SLOT`] is treated as unwritten. A real
/// sample stamped at exactly `0` would therefore be invisible to window
/// queries; clocks feeding this buffer must not produce `0`.
///
/// [`add`]: RingBuffer::add
#[derive(Debug, Clone)]
pub struct RingBuffer {
    timestamps: Vec<u64>,
    values: Vec<u64>,
    cursor: usize,
    count: usize,
}

impl RingBuffer {
    /// Create an empty buffer holding at most `capacity` samples.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0. [`crate::ProfilerConfig::validate`] rejects
    /// such configurations before a buffer is ever built.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be > 0");
        Self {
            timestamps: vec![EMPTY_SLOT; capacity],
            values: vec![0; capacity],
            cursor: 0,
            count: 0,
        }
    }

    /// Store a sample, evicting the oldest one if the buffer is full.
    #[inline]
    pub fn add(&mut self, timestamp: u64, value: u64) {
        self.timestamps[self.cursor] = timestamp;
        self.values[self.cursor] = value;
        self.cursor = (self.cursor + 1) % self.capacity();
        if self.count < self.capacity() {
            self.count += 1;
        }
    }

    /// Values whose age at `now` is at most `window` nanoseconds.
    ///
    /// Order is unspecified. Samples stamped after `now` count as age zero.
    pub fn values_in_window(&self, now: u64, window: u64) -> Vec<u64> {
        self.timestamps
            .iter()
            .zip(&self.values)
            .filter(|&(&ts, _)| ts != EMPTY_SLOT && now.saturating_sub(ts) <= window)
            .map(|(_, &value)| value)
            .collect()
    }

    /// Drop every sample and zero the backing arrays.
    pub fn clear(&mut self) {
        self.timestamps.fill(EMPTY_SLOT);
        self.values.fill(0);
        self.cursor = 0;
        self.count = 0;
    }

    /// Number of occupied slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether nothing has been stored since creation or the last clear.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Maximum number of samples held.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.values.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_is_empty() {
        let buffer = RingBuffer::new(4);
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 4);
        assert!(buffer.values_in_window(100, u64::MAX).is_empty());
    }

    #[test]
    #[should_panic(expected = "capacity must be > 0")]
    fn test_zero_capacity_panics() {
        let _ = RingBuffer::new(0);
    }

    #[test]
    fn test_overwrites_oldest() {
        let mut buffer = RingBuffer::new(3);
        for i in 1..=5 {
            buffer.add(i, i * 10);
        }

        assert_eq!(buffer.len(), 3);
        let mut values = buffer.values_in_window(5, u64::MAX);
        values.sort_unstable();
        assert_eq!(values, vec![30, 40, 50]);
    }

    #[test]
    fn test_window_filters_by_age() {
        let mut buffer = RingBuffer::new(8);
        buffer.add(100, 1);
        buffer.add(200, 2);
        buffer.add(300, 3);

        let mut values = buffer.values_in_window(300, 100);
        values.sort_unstable();
        assert_eq!(values, vec![2, 3]);

        // Age exactly equal to the window is included
        assert_eq!(buffer.values_in_window(300, 0), vec![3]);
    }

    #[test]
    fn test_future_samples_count_as_fresh() {
        let mut buffer = RingBuffer::new(2);
        buffer.add(500, 7);
        assert_eq!(buffer.values_in_window(400, 0), vec![7]);
    }

    #[test]
    fn test_zero_timestamp_is_treated_as_empty() {
        let mut buffer = RingBuffer::new(2);
        buffer.add(EMPTY_SLOT, 9);
        assert_eq!(buffer.len(), 1);
        assert!(buffer.values_in_window(10, u64::MAX).is_empty());
    }

    #[test]
    fn test_clear() {
        let mut buffer = RingBuffer::new(2);
        buffer.add(1, 1);
        buffer.add(2, 2);
        buffer.add(3, 3);
        buffer.clear();

        assert!(buffer.is_empty());
        assert!(buffer.values_in_window(3, u64::MAX).is_empty());

        buffer.add(4, 4);
        assert_eq!(buffer.values_in_window(4, u64::MAX), vec![4]);
    }

    proptest! {
        #[test]
        fn prop_keeps_most_recent_capacity_values(
            capacity in 1usize..64,
            extra in 1usize..64,
        ) {
            let mut buffer = RingBuffer::new(capacity);
            let total = capacity + extra;
            for i in 1..=total as u64 {
                buffer.add(i, i);
                prop_assert!(buffer.len() <= capacity);
            }

            let mut values = buffer.values_in_window(total as u64, u64::MAX);
            values.sort_unstable();
            let expected: Vec<u64> = ((extra as u64 + 1)..=total as u64).collect();
            prop_assert_eq!(values, expected);
        }

        #[test]
        fn prop_widening_window_never_removes(
            stamps in proptest::collection::vec(1u64..10_000, 1..100),
            narrow in 0u64..10_000,
            widen in 0u64..10_000,
        ) {
            let mut buffer = RingBuffer::new(128);
            for &ts in &stamps {
                buffer.add(ts, ts);
            }
            let narrow_count = buffer.values_in_window(10_000, narrow).len();
            let wide_count = buffer.values_in_window(10_000, narrow + widen).len();
            prop_assert!(wide_count >= narrow_count);
        }
    }
}
