//! Presentation time tracking for extracted frames.
//!
//! Times are in microseconds. Upstream packets may carry a timestamp; frames
//! that complete without a fresh one are stamped by extrapolating from the
//! previous frame's duration.

use log::trace;

pub const MICROS_PER_SECOND: u64 = 1_000_000;

/// Duration of `sample_count` PCM samples at `sample_rate`, rounded down.
///
/// An unknown (zero) sample rate yields a zero duration.
pub fn sample_count_to_duration_us(sample_count: u32, sample_rate: u32) -> i64 {
    if sample_rate == 0 {
        return 0;
    }

    (sample_count as u64 * MICROS_PER_SECOND / sample_rate as u64) as i64
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TimestampTracker {
    time_us: Option<i64>,
}

impl TimestampTracker {
    /// Anchors the next frame to complete at `time_us`, if set.
    pub fn packet_started(&mut self, time_us: Option<i64>) {
        if let Some(time_us) = time_us {
            trace!("Packet timestamp {time_us} us");
            self.time_us = Some(time_us);
        }
    }

    pub fn current(&self) -> Option<i64> {
        self.time_us
    }

    /// Returns the timestamp of the frame just completed and advances the
    /// anchor by its duration. Stays unset until a packet timestamp arrives.
    pub fn complete_frame(&mut self, duration_us: i64) -> Option<i64> {
        let time_us = self.time_us?;
        self.time_us = Some(time_us + duration_us);

        Some(time_us)
    }

    pub fn reset(&mut self) {
        self.time_us = None;
    }
}

#[test]
fn duration_rounds_down() {
    assert_eq!(sample_count_to_duration_us(100, 48_000), 2083);
    assert_eq!(sample_count_to_duration_us(512, 48_000), 10_666);
    assert_eq!(sample_count_to_duration_us(1024, 44_100), 23_219);
    assert_eq!(sample_count_to_duration_us(0, 48_000), 0);
    assert_eq!(sample_count_to_duration_us(512, 0), 0);
}

#[test]
fn duration_does_not_overflow_at_high_rates() {
    assert_eq!(sample_count_to_duration_us(u32::MAX, 384_000), 11_184_810_664);
}

#[test]
fn timestamps_extrapolate_between_packets() {
    let mut tracker = TimestampTracker::default();
    assert_eq!(tracker.complete_frame(1000), None);
    assert_eq!(tracker.current(), None);

    tracker.packet_started(Some(5000));
    tracker.packet_started(None);
    assert_eq!(tracker.complete_frame(1000), Some(5000));
    assert_eq!(tracker.complete_frame(2000), Some(6000));
    assert_eq!(tracker.current(), Some(8000));

    tracker.packet_started(Some(100));
    assert_eq!(tracker.complete_frame(10), Some(100));

    tracker.reset();
    assert_eq!(tracker.current(), None);
}
