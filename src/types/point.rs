/// 单个姿态关键点的三维坐标
/// 客户端姿态估计器还会附带 visibility，分析时不使用
#[derive(serde::Deserialize, serde::Serialize, Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
}

impl Point {
    #[cfg(test)]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z, visibility: None }
    }
}
