use super::Point;

/// 一帧骨架数据：关键点按下标定位（下标遵循外部姿态关键点编号）
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    points: Vec<Point>,
}

impl Frame {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn keypoint(&self, index: usize) -> Option<&Point> {
        self.points.get(index)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }
}

impl From<Vec<Point>> for Frame {
    fn from(points: Vec<Point>) -> Self {
        Self::new(points)
    }
}
