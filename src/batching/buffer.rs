use crate::types::Frame;

/// 帧缓冲区：追加帧直到达到阈值，随后整批取出并清空
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    frames: Vec<Frame>,
    threshold: usize,
}

impl FrameBuffer {
    pub fn new(threshold: usize) -> Self {
        Self {
            frames: Vec::with_capacity(threshold),
            threshold: threshold.max(1),
        }
    }

    /// 追加一帧；达到阈值时返回整批帧，缓冲区随之清空
    pub fn push(&mut self, frame: Frame) -> Option<Vec<Frame>> {
        self.frames.push(frame);
        if self.frames.len() >= self.threshold {
            Some(self.flush())
        } else {
            None
        }
    }

    pub fn flush(&mut self) -> Vec<Frame> {
        std::mem::replace(&mut self.frames, Vec::with_capacity(self.threshold))
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}
