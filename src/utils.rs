use chrono::{Duration, Utc};
use rand::Rng;

/// 为每个 WebSocket 连接生成日志用的标识
pub fn generate_connection_id() -> String {
    let suffix: u16 = rand::rng().random();
    format!("stream_{}_{:04x}", Utc::now().format("%Y%m%d_%H%M%S"), suffix)
}

/// 将时间间隔格式化为 "12.3s"
pub fn format_duration(duration: Duration) -> String {
    format!("{:.1}s", duration.num_milliseconds() as f64 / 1000.0)
}
