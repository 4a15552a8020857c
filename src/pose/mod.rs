pub mod sequence;

pub use sequence::{PoseSequence, RootMotionTrack};
