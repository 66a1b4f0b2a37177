use serde::Serialize;
use serde_json::Value;

use super::{Frame, Point};

pub const MISSING_POINTS_ERROR: &str = "Invalid payload: 'points' missing";

/// 返回给客户端的消息（HTTP 响应体与 WebSocket 出站消息共用）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ApiResponse {
    Echo {
        message: String,
        data: Value,
    },
    Received {
        message: String,
    },
    Feedback {
        #[serde(rename = "Text")]
        text: String,
    },
    Error {
        error: String,
    },
}

impl ApiResponse {
    pub fn received() -> Self {
        Self::Received {
            message: "Data received".to_string(),
        }
    }

    pub fn echo(data: Value) -> Self {
        Self::Echo {
            message: "Data received".to_string(),
            data,
        }
    }

    pub fn feedback(text: String) -> Self {
        Self::Feedback { text }
    }

    pub fn error(error: String) -> Self {
        Self::Error { error }
    }

    #[cfg(test)]
    pub fn missing_points() -> Self {
        Self::error(MISSING_POINTS_ERROR.to_string())
    }

    pub fn to_json(&self) -> String {
        // 所有变体都只包含字符串与 JSON 值，序列化不会失败
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}

/// WebSocket 入站消息分类
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    Clear,
    Frame(Frame),
    Invalid(String),
}

impl StreamMessage {
    pub fn parse(text: &str) -> Self {
        match parse_body(text.as_bytes()) {
            Ok(value) => Self::from_value(value),
            Err(e) => Self::Invalid(e),
        }
    }

    pub fn from_value(value: Value) -> Self {
        if value.get("type").and_then(Value::as_str) == Some("clear") {
            return Self::Clear;
        }

        match extract_frame(value) {
            Ok(frame) => Self::Frame(frame),
            Err(e) => Self::Invalid(e),
        }
    }
}

/// 解析 JSON 请求体，不要求 Content-Type
pub fn parse_body(body: &[u8]) -> Result<Value, String> {
    serde_json::from_slice::<Value>(body).map_err(|e| format!("Invalid payload: {}", e))
}

/// 从请求体中取出 `points` 列表并转换为一帧
/// 错误信息可以直接作为 `{"error": ...}` 返回给客户端
pub fn extract_frame(value: Value) -> Result<Frame, String> {
    let Value::Object(mut map) = value else {
        return Err(MISSING_POINTS_ERROR.to_string());
    };

    let points = map
        .remove("points")
        .ok_or_else(|| MISSING_POINTS_ERROR.to_string())?;

    serde_json::from_value::<Vec<Point>>(points)
        .map(Frame::from)
        .map_err(|e| format!("Invalid payload: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_shapes() {
        assert_eq!(
            serde_json::to_value(ApiResponse::received()).unwrap(),
            json!({"message": "Data received"})
        );
        assert_eq!(
            serde_json::to_value(ApiResponse::feedback("Keep your elbow up".into())).unwrap(),
            json!({"Text": "Keep your elbow up"})
        );
        assert_eq!(
            serde_json::to_value(ApiResponse::missing_points()).unwrap(),
            json!({"error": "Invalid payload: 'points' missing"})
        );
        assert_eq!(
            serde_json::to_value(ApiResponse::echo(json!({"foo": 1}))).unwrap(),
            json!({"message": "Data received", "data": {"foo": 1}})
        );
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(br#"{"foo": 1}"#), Ok(json!({"foo": 1})));
        assert!(parse_body(b"").unwrap_err().starts_with("Invalid payload:"));
        assert!(parse_body(b"points=1").unwrap_err().starts_with("Invalid payload:"));
    }

    #[test]
    fn test_clear_message() {
        assert_eq!(StreamMessage::parse(r#"{"type": "clear"}"#), StreamMessage::Clear);
    }

    #[test]
    fn test_points_with_visibility() {
        let msg = StreamMessage::parse(
            r#"{"points": [{"x": 0.1, "y": 0.2, "z": -0.3, "visibility": 0.98}, {"x": 1, "y": 2, "z": 3}]}"#,
        );
        match msg {
            StreamMessage::Frame(frame) => {
                assert_eq!(frame.len(), 2);
                assert_eq!(frame.keypoint(1), Some(&Point::new(1.0, 2.0, 3.0)));
                assert_eq!(frame.keypoint(0).and_then(|p| p.visibility), Some(0.98));
            }
            other => panic!("expected frame, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_points() {
        assert_eq!(
            StreamMessage::parse(r#"{"foo": 1}"#),
            StreamMessage::Invalid(MISSING_POINTS_ERROR.to_string())
        );
        assert_eq!(
            StreamMessage::parse("[1, 2, 3]"),
            StreamMessage::Invalid(MISSING_POINTS_ERROR.to_string())
        );
    }

    #[test]
    fn test_malformed_points_and_json() {
        match StreamMessage::parse(r#"{"points": [{"x": "a"}]}"#) {
            StreamMessage::Invalid(e) => assert!(e.starts_with("Invalid payload:")),
            other => panic!("expected invalid, got {:?}", other),
        }
        match StreamMessage::parse("not json") {
            StreamMessage::Invalid(e) => assert!(e.starts_with("Invalid payload:")),
            other => panic!("expected invalid, got {:?}", other),
        }
    }
}
