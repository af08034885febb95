use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CaptureState {
    Idle,
    CountingDown,
    TakingPicture,
    Cooldown,
}

impl Default for CaptureState {
    fn default() -> Self {
        CaptureState::Idle
    }
}

/// Timings and prompt for one capture cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureTiming {
    pub countdown_ms: u64,
    pub cooldown_ms: u64,
    /// Spoken, interrupting anything else, when the countdown starts.
    pub hold_prompt: String,
    /// Spoken once when a session starts. Empty disables it.
    pub start_prompt: String,
}

impl Default for CaptureTiming {
    fn default() -> Self {
        Self {
            countdown_ms: 3_500,
            cooldown_ms: 2_000,
            hold_prompt: "Hold the pose".to_string(),
            start_prompt: "Prepare yourself to enter the camera".to_string(),
        }
    }
}

impl CaptureTiming {
    pub fn countdown(&self) -> Duration {
        Duration::from_millis(self.countdown_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSnapshot {
    pub state: CaptureState,
    /// Incremented every time a countdown starts. Timers only act on their own cycle.
    pub cycle: u64,
    pub captures_taken: u64,
    pub updated_at: DateTime<Utc>,
    /// End of the current timed phase (countdown or cooldown).
    #[serde(skip)]
    pub deadline: Option<Instant>,
}

impl Default for CaptureSnapshot {
    fn default() -> Self {
        Self {
            state: CaptureState::Idle,
            cycle: 0,
            captures_taken: 0,
            updated_at: Utc::now(),
            deadline: None,
        }
    }
}

impl CaptureSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Milliseconds left in the current countdown or cooldown, 0 otherwise.
    pub fn remaining_ms(&self) -> u64 {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()).as_millis() as u64)
            .unwrap_or(0)
    }

    pub fn is_current(&self, cycle: u64, state: CaptureState) -> bool {
        self.cycle == cycle && self.state == state
    }

    /// Returns the new cycle number.
    pub fn begin_countdown(&mut self, deadline: Instant) -> u64 {
        self.cycle = self.cycle.wrapping_add(1);
        self.transition(CaptureState::CountingDown, Some(deadline));
        self.cycle
    }

    pub fn begin_capture(&mut self) {
        self.transition(CaptureState::TakingPicture, None);
    }

    pub fn begin_cooldown(&mut self, deadline: Instant) {
        self.captures_taken = self.captures_taken.saturating_add(1);
        self.transition(CaptureState::Cooldown, Some(deadline));
    }

    pub fn reset(&mut self) {
        self.transition(CaptureState::Idle, None);
    }

    fn transition(&mut self, state: CaptureState, deadline: Option<Instant>) {
        self.state = state;
        self.deadline = deadline;
        self.updated_at = Utc::now();
    }
}
