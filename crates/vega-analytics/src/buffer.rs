//! Rolling sample history.
//!
//! Provides:
//! - **Sample**: an immutable timestamped scalar reading
//! - **RollingBuffer**: bounded circular buffer backing every "recent history" need

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

// ── Sample ──────────────────────────────────────────────────────────────

/// A single timestamped reading on one channel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Measured value (μSv/h for dose, counts/s for count rate).
    pub value: f64,
    /// Epoch milliseconds as reported by the sensor transport.
    pub timestamp_ms: i64,
}

impl Sample {
    pub fn new(value: f64, timestamp_ms: i64) -> Self {
        Self {
            value,
            timestamp_ms,
        }
    }

    /// Timestamp as a UTC datetime, if representable.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp_ms).single()
    }

    /// Seconds elapsed from `earlier` to `self`. Negative when clocks go backwards.
    pub fn seconds_since(&self, earlier: &Sample) -> f64 {
        self.timestamp_ms.saturating_sub(earlier.timestamp_ms) as f64 / 1000.0
    }
}

// ── Rolling Buffer ──────────────────────────────────────────────────────

/// A bounded circular buffer.
///
/// When full, the oldest items are silently overwritten. Iteration is
/// always oldest first.
#[derive(Clone, Debug)]
pub struct RollingBuffer<T> {
    buffer: Vec<Option<T>>,
    head: usize,
    len: usize,
}

impl<T: Clone> RollingBuffer<T> {
    /// Create a rolling buffer with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "rolling buffer capacity must be positive");
        Self {
            buffer: vec![None; capacity],
            head: 0,
            len: 0,
        }
    }

    /// Push an item, overwriting the oldest if full.
    pub fn push(&mut self, item: T) {
        self.buffer[self.head] = Some(item);
        self.head = (self.head + 1) % self.buffer.len();
        if self.len < self.buffer.len() {
            self.len += 1;
        }
    }

    /// Iterate over items in insertion order (oldest first).
    pub fn iter(&self) -> RollingBufferIter<'_, T> {
        let start = if self.len < self.buffer.len() {
            0
        } else {
            self.head
        };
        RollingBufferIter {
            buffer: &self.buffer,
            pos: start,
            remaining: self.len,
        }
    }

    /// The most recently pushed item.
    pub fn last(&self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        let idx = (self.head + self.buffer.len() - 1) % self.buffer.len();
        self.buffer[idx].as_ref()
    }

    /// The `n` most recent items, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &T> {
        self.iter().skip(self.len.saturating_sub(n))
    }

    /// Copy the contents out, oldest first.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    /// Number of items currently in the buffer.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the buffer has reached capacity.
    pub fn is_full(&self) -> bool {
        self.len == self.buffer.len()
    }

    /// Maximum capacity.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Clear all items.
    pub fn clear(&mut self) {
        for slot in &mut self.buffer {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }
}

impl RollingBuffer<Sample> {
    /// Sample values, oldest first.
    pub fn values(&self) -> Vec<f64> {
        self.iter().map(|s| s.value).collect()
    }

    /// Mean of the `n` most recent values, or `None` if fewer are held.
    pub fn mean_of_last(&self, n: usize) -> Option<f64> {
        if n == 0 || self.len < n {
            return None;
        }
        Some(self.recent(n).map(|s| s.value).sum::<f64>() / n as f64)
    }
}

/// Iterator over a RollingBuffer.
pub struct RollingBufferIter<'a, T> {
    buffer: &'a [Option<T>],
    pos: usize,
    remaining: usize,
}

impl<'a, T: Clone> Iterator for RollingBufferIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let item = self.buffer[self.pos].as_ref();
        self.pos = (self.pos + 1) % self.buffer.len();
        self.remaining -= 1;
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_since_saturates_on_extreme_timestamps() {
        let late = Sample::new(0.1, 1_000);
        let early = Sample::new(0.1, i64::MIN);
        assert_eq!(early.seconds_since(&late), i64::MIN as f64 / 1000.0);
        assert_eq!(late.seconds_since(&early), i64::MAX as f64 / 1000.0);
        assert_eq!(late.seconds_since(&Sample::new(0.2, 4_000)), -3.0);
    }

    #[test]
    fn buffer_basic_push_and_iter() {
        let mut rb = RollingBuffer::new(3);
        rb.push(1);
        rb.push(2);
        let items: Vec<_> = rb.iter().cloned().collect();
        assert_eq!(items, vec![1, 2]);
        assert_eq!(rb.len(), 2);
        assert!(!rb.is_full());
    }

    #[test]
    fn buffer_evicts_oldest() {
        let mut rb = RollingBuffer::new(3);
        for i in 1..=5 {
            rb.push(i);
        }
        assert_eq!(rb.to_vec(), vec![3, 4, 5]);
        assert_eq!(rb.len(), 3);
        assert!(rb.is_full());
        assert_eq!(rb.last(), Some(&5));
    }

    #[test]
    fn buffer_recent_is_oldest_first() {
        let mut rb = RollingBuffer::new(10);
        for i in 0..7 {
            rb.push(i);
        }
        let recent: Vec<_> = rb.recent(3).cloned().collect();
        assert_eq!(recent, vec![4, 5, 6]);
        // Asking for more than held returns everything.
        assert_eq!(rb.recent(50).count(), 7);
    }

    #[test]
    fn buffer_clear() {
        let mut rb = RollingBuffer::new(4);
        rb.push(1);
        rb.push(2);
        rb.clear();
        assert!(rb.is_empty());
        assert_eq!(rb.last(), None);
        rb.push(9);
        assert_eq!(rb.to_vec(), vec![9]);
    }

    #[test]
    #[should_panic(expected = "capacity must be positive")]
    fn buffer_zero_capacity_panics() {
        let _ = RollingBuffer::<i32>::new(0);
    }

    #[test]
    fn sample_mean_of_last() {
        let mut rb = RollingBuffer::new(5);
        for (i, v) in [1.0, 2.0, 3.0, 4.0].iter().enumerate() {
            rb.push(Sample::new(*v, i as i64 * 1000));
        }
        assert_eq!(rb.mean_of_last(2), Some(3.5));
        assert_eq!(rb.mean_of_last(5), None);
        assert_eq!(rb.values(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn sample_time_helpers() {
        let a = Sample::new(0.1, 1_000);
        let b = Sample::new(0.2, 3_500);
        assert!((b.seconds_since(&a) - 2.5).abs() < 1e-12);
        assert!(a.seconds_since(&b) < 0.0);
        assert_eq!(a.datetime().map(|d| d.timestamp_millis()), Some(1_000));
    }
}
