pub mod controller;
pub mod state;

pub use controller::{CaptureController, CaptureTrigger};
pub use state::{CaptureSnapshot, CaptureState, CaptureTiming};
