/// 一批帧的投掷动作汇总指标
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrowMetrics {
    pub min_elbow_angle: f64,
    pub max_elbow_angle: f64,
    pub wrist_delta_y: f64,
    pub max_hip_drift: f64,
    pub frame_count: usize,
}
