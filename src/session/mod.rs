pub mod controller;
pub mod loop_worker;
pub mod pose_session;
pub mod sampler;

pub use controller::{FrameSender, SessionController};
pub use pose_session::PoseSession;
pub use sampler::{FrameSampler, SamplingConfig};
