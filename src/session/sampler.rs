use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Run correction on every Nth frame the camera delivers.
    pub processing_interval: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            processing_interval: 15,
        }
    }
}

/// Picks frames 0, N, 2N, ... out of the camera stream.
#[derive(Debug, Clone)]
pub struct FrameSampler {
    interval: u64,
    seen: u64,
}

impl FrameSampler {
    pub fn new(interval: u32) -> Self {
        Self {
            interval: u64::from(interval.max(1)),
            seen: 0,
        }
    }

    pub fn should_process(&mut self) -> bool {
        let due = self.seen % self.interval == 0;
        self.seen = self.seen.wrapping_add(1);
        due
    }

    pub fn frames_seen(&self) -> u64 {
        self.seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processes_every_nth_frame_starting_with_first() {
        let mut sampler = FrameSampler::new(15);
        let processed: Vec<u64> = (0..46).filter(|_| sampler.should_process()).collect();

        assert_eq!(processed, vec![0, 15, 30, 45]);
        assert_eq!(sampler.frames_seen(), 46);
    }

    #[test]
    fn test_zero_interval_processes_everything() {
        let mut sampler = FrameSampler::new(0);
        assert!((0..5).all(|_| sampler.should_process()));
    }
}
