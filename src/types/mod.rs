pub mod point;
pub mod frame;
pub mod metrics;
pub mod messages;

pub use point::Point;
pub use frame::Frame;
pub use metrics::ThrowMetrics;
pub use messages::{ApiResponse, StreamMessage};
