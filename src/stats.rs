//! Statistics snapshots for sources and the server

use std::time::Duration;

/// Per-source frame counters
#[derive(Debug, Clone, Default)]
pub struct SourceStats {
    /// Frames fed into the source
    pub frames: u64,
    /// Total pixel bytes fed in
    pub bytes: u64,
    /// Time since the source was created
    pub duration: Duration,
}

impl SourceStats {
    /// Observed frame rate over the source's lifetime
    pub fn fps(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }

    /// Throughput in bits per second
    pub fn bitrate(&self) -> u64 {
        let secs = self.duration.as_secs();
        if secs > 0 {
            (self.bytes * 8) / secs
        } else {
            0
        }
    }
}

/// Server-wide registry counts
#[derive(Debug, Clone, Default)]
pub struct HubStats {
    /// Registered video sources
    pub sources: usize,
    /// Registered frame sinks
    pub frame_sinks: usize,
    /// Registered stream servers
    pub stream_servers: usize,
    /// Next port the auto-allocator will hand out
    pub next_port: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps() {
        let stats = SourceStats {
            frames: 300,
            bytes: 0,
            duration: Duration::from_secs(10),
        };
        assert!((stats.fps() - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bitrate() {
        let stats = SourceStats {
            frames: 0,
            bytes: 1_000_000,
            duration: Duration::from_secs(10),
        };
        assert_eq!(stats.bitrate(), 800_000);
    }

    #[test]
    fn test_zero_duration() {
        let stats = SourceStats {
            frames: 10,
            bytes: 1_000,
            duration: Duration::ZERO,
        };
        assert_eq!(stats.fps(), 0.0);
        assert_eq!(stats.bitrate(), 0);
    }
}
