use std::collections::HashMap;
use std::sync::Mutex;
use log::warn;

use crate::types::Frame;
use super::FrameBuffer;

pub const DEFAULT_SESSION: &str = "default";

/// 请求/响应通道的按会话帧缓冲
/// 追加与整批取出在同一把锁内完成，每一批只会被一个调用者取走
#[derive(Debug)]
pub struct SessionRegistry {
    buffers: Mutex<HashMap<String, FrameBuffer>>,
    threshold: usize,
}

impl SessionRegistry {
    pub fn new(threshold: usize) -> Self {
        Self {
            buffers: Mutex::new(HashMap::new()),
            threshold,
        }
    }

    pub fn push(&self, session_id: &str, frame: Frame) -> Option<Vec<Frame>> {
        let mut buffers = self.lock();
        let buffer = buffers
            .entry(session_id.to_string())
            .or_insert_with(|| FrameBuffer::new(self.threshold));
        let batch = buffer.push(frame);

        // 已取空的会话不再占用内存
        if batch.is_some() {
            buffers.remove(session_id);
        }
        batch
    }

    #[cfg(test)]
    pub fn len(&self, session_id: &str) -> usize {
        self.lock().get(session_id).map_or(0, FrameBuffer::len)
    }

    #[cfg(test)]
    pub fn session_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, FrameBuffer>> {
        match self.buffers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Session registry lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}
