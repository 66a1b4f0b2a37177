pub mod buffer;
pub mod throttle;
pub mod sessions;

pub use buffer::FrameBuffer;
pub use throttle::Throttle;
pub use sessions::{SessionRegistry, DEFAULT_SESSION};
