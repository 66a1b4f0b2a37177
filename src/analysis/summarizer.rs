use crate::types::{Frame, Point, ThrowMetrics};
use super::geometry::angle_between;
use super::keypoints::{LEFT_HIP, RIGHT_ELBOW, RIGHT_HIP, RIGHT_SHOULDER, RIGHT_WRIST};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AnalysisError {
    #[error("Cannot analyze an empty batch")]
    EmptyBatch,
    #[error("Frame {frame} is missing keypoint {index}")]
    MissingKeypoint { frame: usize, index: usize },
}

fn keypoint(frame: &Frame, frame_index: usize, index: usize) -> Result<&Point, AnalysisError> {
    frame.keypoint(index).ok_or(AnalysisError::MissingKeypoint {
        frame: frame_index,
        index,
    })
}

/// 对一批帧计算投掷动作汇总指标
/// - 肘角：肩-肘-腕夹角的最小/最大值
/// - 腕部纵向位移：末帧 y 减首帧 y
/// - 髋部横向漂移：左右髋 x 差的最大值
pub fn analyze_throw(frames: &[Frame]) -> Result<ThrowMetrics, AnalysisError> {
    if frames.is_empty() {
        return Err(AnalysisError::EmptyBatch);
    }

    let mut min_elbow_angle = f64::INFINITY;
    let mut max_elbow_angle = f64::NEG_INFINITY;
    let mut max_hip_drift = f64::NEG_INFINITY;
    let mut first_wrist_y = 0.0;
    let mut last_wrist_y = 0.0;

    for (i, frame) in frames.iter().enumerate() {
        let shoulder = keypoint(frame, i, RIGHT_SHOULDER)?;
        let elbow = keypoint(frame, i, RIGHT_ELBOW)?;
        let wrist = keypoint(frame, i, RIGHT_WRIST)?;
        let hip_right = keypoint(frame, i, RIGHT_HIP)?;
        let hip_left = keypoint(frame, i, LEFT_HIP)?;

        let elbow_angle = angle_between(shoulder, elbow, wrist);
        min_elbow_angle = min_elbow_angle.min(elbow_angle);
        max_elbow_angle = max_elbow_angle.max(elbow_angle);

        if i == 0 {
            first_wrist_y = wrist.y;
        }
        last_wrist_y = wrist.y;

        let hip_drift = (hip_right.x - hip_left.x).abs();
        max_hip_drift = max_hip_drift.max(hip_drift);
    }

    Ok(ThrowMetrics {
        min_elbow_angle,
        max_elbow_angle,
        wrist_delta_y: last_wrist_y - first_wrist_y,
        max_hip_drift,
        frame_count: frames.len(),
    })
}

/// 生成发送给语言模型的文本报告，instruction 为可配置的教练指令
pub fn render_report(metrics: &ThrowMetrics, instruction: &str) -> String {
    let report = format!(
        "Throw Analysis:\n\
         \n\
         - Minimum elbow angle during throw: {:.2} degrees (Expected: < 100 degrees for cocking phase)\n\
         - Maximum elbow angle during throw: {:.2} degrees (Expected: > 150 degrees for full extension)\n\
         - Wrist vertical movement (end - start): {:.4} units (Expected: negative value indicating wrist snap upward)\n\
         - Maximum hip drift (side to side): {:.4} units (Expected: < 0.2 units for stable core)\n\
         \n\
         {}",
        metrics.min_elbow_angle,
        metrics.max_elbow_angle,
        metrics.wrist_delta_y,
        metrics.max_hip_drift,
        instruction.trim(),
    );
    report.trim().to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 构造一帧：只有投掷相关关键点有意义，其余填零
    pub(crate) fn throw_frame(
        shoulder: Point,
        elbow: Point,
        wrist: Point,
        hip_left_x: f64,
        hip_right_x: f64,
    ) -> Frame {
        let mut points = vec![Point::new(0.0, 0.0, 0.0); RIGHT_HIP + 1];
        points[RIGHT_SHOULDER] = shoulder;
        points[RIGHT_ELBOW] = elbow;
        points[RIGHT_WRIST] = wrist;
        points[LEFT_HIP] = Point::new(hip_left_x, 0.9, 0.0);
        points[RIGHT_HIP] = Point::new(hip_right_x, 0.9, 0.0);
        Frame::new(points)
    }

    /// 肘部弯曲 90 度，腕部位于 wrist_y
    pub(crate) fn bent_arm_frame(wrist_y: f64, hip_drift: f64) -> Frame {
        throw_frame(
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(1.0, wrist_y, 0.0),
            0.4,
            0.4 + hip_drift,
        )
    }

    #[test]
    fn test_analyze_single_frame() {
        let metrics = analyze_throw(&[bent_arm_frame(1.0, 0.1)]).unwrap();
        assert!((metrics.min_elbow_angle - 90.0).abs() < 1e-9);
        assert_eq!(metrics.min_elbow_angle, metrics.max_elbow_angle);
        assert_eq!(metrics.wrist_delta_y, 0.0);
        assert!((metrics.max_hip_drift - 0.1).abs() < 1e-12);
        assert_eq!(metrics.frame_count, 1);
    }

    #[test]
    fn test_analyze_throw_sequence() {
        // 从折叠的手臂到完全伸直
        let cocked = bent_arm_frame(1.0, 0.05);
        let extended = throw_frame(
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(2.0, 0.0, 0.0),
            0.4,
            0.7,
        );
        let snapped = bent_arm_frame(-0.5, 0.02);

        let metrics = analyze_throw(&[cocked, extended, snapped]).unwrap();
        assert!((metrics.min_elbow_angle - 90.0).abs() < 1e-9);
        assert!((metrics.max_elbow_angle - 180.0).abs() < 1e-6);
        assert!((metrics.wrist_delta_y - (-1.5)).abs() < 1e-12);
        assert!((metrics.max_hip_drift - 0.3).abs() < 1e-12);
        assert!(metrics.min_elbow_angle <= metrics.max_elbow_angle);
    }

    #[test]
    fn test_hip_drift_is_absolute() {
        let metrics = analyze_throw(&[bent_arm_frame(0.0, -0.25)]).unwrap();
        assert!((metrics.max_hip_drift - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_empty_batch() {
        assert_eq!(analyze_throw(&[]), Err(AnalysisError::EmptyBatch));
    }

    #[test]
    fn test_missing_keypoint() {
        let short = Frame::new(vec![Point::new(0.0, 0.0, 0.0); 20]);
        let frames = vec![bent_arm_frame(0.0, 0.0), short];
        assert_eq!(
            analyze_throw(&frames),
            Err(AnalysisError::MissingKeypoint { frame: 1, index: RIGHT_HIP })
        );
    }

    #[test]
    fn test_render_report() {
        let metrics = ThrowMetrics {
            min_elbow_angle: 85.123,
            max_elbow_angle: 162.5,
            wrist_delta_y: -0.123456,
            max_hip_drift: 0.1,
            frame_count: 30,
        };
        let report = render_report(&metrics, "  Give one short tip.\n");

        assert!(report.starts_with("Throw Analysis:"));
        assert!(report.contains("Minimum elbow angle during throw: 85.12 degrees"));
        assert!(report.contains("Maximum elbow angle during throw: 162.50 degrees"));
        assert!(report.contains("Wrist vertical movement (end - start): -0.1235 units"));
        assert!(report.contains("Maximum hip drift (side to side): 0.1000 units"));
        assert!(report.ends_with("Give one short tip."));
    }
}
