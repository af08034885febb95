use rodio::Source;
use std::f32::consts::PI;
use std::time::Duration;

const SAMPLE_RATE: u32 = 44100;
/// Linear fade at each end, in samples, so bursts don't click.
const FADE_SAMPLES: usize = 441;

/// Short mono sine burst. Finite, unlike the ambient generators.
pub struct ToneBurst {
    freq: f32,
    amplitude: f32,
    total_samples: usize,
    num_sample: usize,
}

impl ToneBurst {
    pub fn new(freq: f32, duration: Duration) -> Self {
        Self {
            freq,
            amplitude: 0.25,
            total_samples: (duration.as_secs_f32() * SAMPLE_RATE as f32) as usize,
            num_sample: 0,
        }
    }

    pub fn silence(duration: Duration) -> Self {
        Self {
            amplitude: 0.0,
            ..Self::new(0.0, duration)
        }
    }

    fn envelope(&self) -> f32 {
        let from_start = self.num_sample;
        let to_end = self.total_samples.saturating_sub(self.num_sample + 1);
        let edge = from_start.min(to_end);
        if edge >= FADE_SAMPLES {
            1.0
        } else {
            edge as f32 / FADE_SAMPLES as f32
        }
    }
}

impl Iterator for ToneBurst {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.num_sample >= self.total_samples {
            return None;
        }

        let t = self.num_sample as f32 / SAMPLE_RATE as f32;
        let sample = (2.0 * PI * self.freq * t).sin() * self.amplitude * self.envelope();
        self.num_sample += 1;
        Some(sample)
    }
}

impl Source for ToneBurst {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.total_samples - self.num_sample)
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f32(
            self.total_samples as f32 / SAMPLE_RATE as f32,
        ))
    }
}
