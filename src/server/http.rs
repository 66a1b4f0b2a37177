use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use log::{debug, info, warn};

use crate::analysis::{analyze_throw, render_report};
use crate::batching::DEFAULT_SESSION;
use crate::types::messages::{extract_frame, parse_body};
use crate::types::ApiResponse;
use super::AppState;

pub const SESSION_HEADER: &str = "x-session-id";

fn session_id(headers: &HeaderMap) -> String {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_SESSION)
        .to_string()
}

/// POST /baseball：累积帧，满一批后分析并返回教练反馈
/// 请求体按 JSON 解析，不检查 Content-Type；无法解析时返回 400
pub async fn receive_baseball(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<ApiResponse>) {
    let session = session_id(&headers);

    let value = match parse_body(&body) {
        Ok(value) => value,
        Err(e) => {
            warn!("Rejected body for session {}: {}", session, e);
            return (StatusCode::BAD_REQUEST, Json(ApiResponse::error(e)));
        }
    };

    let frame = match extract_frame(value) {
        Ok(frame) => frame,
        Err(e) => {
            warn!("Rejected payload for session {}: {}", session, e);
            return (StatusCode::OK, Json(ApiResponse::error(e)));
        }
    };

    debug!("Session {}: received frame with {} keypoints", session, frame.len());

    let Some(batch) = state.sessions.push(&session, frame) else {
        return (StatusCode::OK, Json(ApiResponse::received()));
    };

    info!("Session {}: batch of {} frames ready", session, batch.len());

    let reply = match analyze_throw(&batch) {
        Ok(metrics) => {
            let report = render_report(&metrics, &state.config.prompt.instruction);
            debug!("Throw report:\n{}", report);
            let text = state.coach.feedback(&report).await;
            info!(
                "Session {}: feedback for {} frames sent ({} chars)",
                session,
                metrics.frame_count,
                text.len()
            );
            ApiResponse::feedback(text)
        }
        Err(e) => {
            warn!("Session {}: discarding batch: {}", session, e);
            ApiResponse::error(format!("Invalid payload: {}", e))
        }
    };
    (StatusCode::OK, Json(reply))
}

/// POST /bball：原样回显请求体
pub async fn receive_bball(body: Bytes) -> (StatusCode, Json<ApiResponse>) {
    match parse_body(&body) {
        Ok(value) => {
            info!("Received bball data");
            (StatusCode::OK, Json(ApiResponse::echo(value)))
        }
        Err(e) => {
            warn!("Rejected bball body: {}", e);
            (StatusCode::BAD_REQUEST, Json(ApiResponse::error(e)))
        }
    }
}
