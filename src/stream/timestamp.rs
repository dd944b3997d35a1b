use log::warn;

/// Per-type timestamp discipline for outgoing media.
///
/// Chunk header compression assumes non-decreasing timestamps within a
/// lane; a sample arriving out of order is clamped to the last value
/// sent for its type rather than forcing a type-0 rewind.
#[derive(Debug, Default)]
pub struct TimestampTracker {
    audio: Option<u32>,
    video: Option<u32>,
    data: Option<u32>,
}

impl TimestampTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clamp_audio(&mut self, timestamp: u32) -> u32 {
        Self::clamp(&mut self.audio, timestamp, "audio")
    }

    pub fn clamp_video(&mut self, timestamp: u32) -> u32 {
        Self::clamp(&mut self.video, timestamp, "video")
    }

    pub fn clamp_data(&mut self, timestamp: u32) -> u32 {
        Self::clamp(&mut self.data, timestamp, "data")
    }

    fn clamp(slot: &mut Option<u32>, timestamp: u32, kind: &str) -> u32 {
        match slot {
            Some(last) if timestamp < *last => {
                warn!(
                    "Out-of-order {} timestamp {} behind {}, clamping",
                    kind, timestamp, last
                );
                *last
            }
            _ => {
                *slot = Some(timestamp);
                timestamp
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_passthrough() {
        let mut tracker = TimestampTracker::new();
        assert_eq!(tracker.clamp_audio(0), 0);
        assert_eq!(tracker.clamp_audio(20), 20);
        assert_eq!(tracker.clamp_audio(20), 20);
        assert_eq!(tracker.clamp_audio(40), 40);
    }

    #[test]
    fn test_regression_clamped() {
        let mut tracker = TimestampTracker::new();
        assert_eq!(tracker.clamp_video(100), 100);
        assert_eq!(tracker.clamp_video(60), 100);
        assert_eq!(tracker.clamp_video(120), 120);
    }

    #[test]
    fn test_types_tracked_independently() {
        let mut tracker = TimestampTracker::new();
        assert_eq!(tracker.clamp_video(500), 500);
        assert_eq!(tracker.clamp_audio(10), 10);
        assert_eq!(tracker.clamp_data(0), 0);
    }
}
