use std::time::Duration as StdDuration;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use chrono::{DateTime, Utc};
use futures_util::{Sink, SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::analysis::{analyze_throw, render_report};
use crate::batching::{FrameBuffer, Throttle};
use crate::types::{ApiResponse, StreamMessage};
use crate::utils::{format_duration, generate_connection_id};
use super::AppState;

const WRITER_DRAIN_TIMEOUT: StdDuration = StdDuration::from_secs(2);

/// 处理一条入站消息后的动作
#[derive(Debug, Clone, PartialEq)]
pub enum StreamAction {
    /// 无需回复（已缓存、已清空或被节流丢弃）
    Nothing,
    Reply(ApiResponse),
    /// 把报告交给语言模型，结果发回客户端
    Dispatch(String),
}

/// 单个 WebSocket 连接的批处理状态，缓冲区与节流均归连接所有
pub struct StreamSession {
    id: String,
    buffer: FrameBuffer,
    throttle: Throttle,
    instruction: String,
}

impl StreamSession {
    pub fn new(id: String, buffer: FrameBuffer, throttle: Throttle, instruction: String) -> Self {
        Self {
            id,
            buffer,
            throttle,
            instruction,
        }
    }

    pub fn from_state(id: String, state: &AppState) -> Self {
        let batching = &state.config.batching;
        Self::new(
            id,
            FrameBuffer::new(batching.stream_batch_size),
            Throttle::from_secs(batching.stream_throttle_secs),
            state.config.prompt.instruction.clone(),
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    #[cfg(test)]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn handle_text(&mut self, text: &str, now: DateTime<Utc>) -> StreamAction {
        self.handle(StreamMessage::parse(text), now)
    }

    pub fn handle(&mut self, message: StreamMessage, now: DateTime<Utc>) -> StreamAction {
        let frame = match message {
            StreamMessage::Clear => {
                self.buffer.clear();
                info!("{}: buffer cleared", self.id);
                return StreamAction::Nothing;
            }
            StreamMessage::Invalid(e) => {
                warn!("{}: {}", self.id, e);
                return StreamAction::Reply(ApiResponse::error(e));
            }
            StreamMessage::Frame(frame) => frame,
        };

        let Some(batch) = self.buffer.push(frame) else {
            debug!("{}: buffered {} frames", self.id, self.buffer.len());
            return StreamAction::Nothing;
        };

        let metrics = match analyze_throw(&batch) {
            Ok(metrics) => metrics,
            Err(e) => {
                warn!("{}: discarding batch: {}", self.id, e);
                return StreamAction::Reply(ApiResponse::error(format!("Invalid payload: {}", e)));
            }
        };
        let report = render_report(&metrics, &self.instruction);

        if self.throttle.try_dispatch(now) {
            info!("{}: batch of {} frames dispatched to coach", self.id, metrics.frame_count);
            StreamAction::Dispatch(report)
        } else {
            info!(
                "{}: skipped sending, next feedback allowed in {}",
                self.id,
                format_duration(self.throttle.remaining(now))
            );
            StreamAction::Nothing
        }
    }
}

/// GET /baseball（WebSocket 升级）
pub async fn websocket_baseball(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// 所有出站消息经由同一个写任务发送，发送端全部关闭后任务结束
fn spawn_writer<S>(mut sink: S, mut replies: mpsc::Receiver<ApiResponse>, id: String) -> JoinHandle<()>
where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: std::fmt::Display + Send,
{
    tokio::spawn(async move {
        while let Some(reply) = replies.recv().await {
            if let Err(e) = sink.send(Message::Text(reply.to_json())).await {
                debug!("{}: send failed, stopping writer: {}", id, e);
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let mut session = StreamSession::from_state(generate_connection_id(), &state);
    info!("{}: client connected", session.id());

    let (sink, mut stream) = socket.split();
    let (reply_sender, reply_receiver) = mpsc::channel::<ApiResponse>(32);
    let writer = spawn_writer(sink, reply_receiver, session.id().to_string());

    while let Some(message) = stream.next().await {
        let text = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(Message::Binary(_)) => {
                debug!("{}: ignoring binary message", session.id());
                continue;
            }
            Ok(_) => continue,
            Err(e) => {
                warn!("{}: receive error: {}", session.id(), e);
                break;
            }
        };

        match session.handle_text(&text, Utc::now()) {
            StreamAction::Nothing => {}
            StreamAction::Reply(reply) => {
                if reply_sender.send(reply).await.is_err() {
                    break;
                }
            }
            StreamAction::Dispatch(report) => {
                // 模型调用不阻塞本连接继续接收帧
                let coach = state.coach.clone();
                let sender = reply_sender.clone();
                let id = session.id().to_string();
                tokio::spawn(async move {
                    let text = coach.feedback(&report).await;
                    if let Err(e) = sender.send(ApiResponse::feedback(text)).await {
                        debug!("{}: connection gone, dropping feedback: {}", id, e);
                    }
                });
            }
        }
    }

    // 关闭发送端，让写任务发完已排队的回复后退出
    drop(reply_sender);
    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, writer).await.is_err() {
        debug!("{}: writer still busy after {:?}, giving up", session.id(), WRITER_DRAIN_TIMEOUT);
    }
    info!("{}: client disconnected", session.id());
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;
    use crate::analysis::summarizer::tests::bent_arm_frame;
    use crate::types::Frame;

    fn session(batch: usize) -> StreamSession {
        StreamSession::new(
            "stream_test".to_string(),
            FrameBuffer::new(batch),
            Throttle::from_secs(60),
            "Give one tip.".to_string(),
        )
    }

    fn frame_message(frame: &Frame) -> String {
        let points: Vec<_> = (0..frame.len())
            .map(|i| {
                let p = frame.keypoint(i).unwrap();
                json!({"x": p.x, "y": p.y, "z": p.z})
            })
            .collect();
        json!({ "points": points }).to_string()
    }

    #[test]
    fn test_clear_after_buffered_frames() {
        let mut session = session(30);
        let now = Utc::now();
        let msg = frame_message(&bent_arm_frame(0.5, 0.1));
        for _ in 0..10 {
            assert_eq!(session.handle_text(&msg, now), StreamAction::Nothing);
        }
        assert_eq!(session.buffered(), 10);

        assert_eq!(session.handle_text(r#"{"type": "clear"}"#, now), StreamAction::Nothing);
        assert_eq!(session.buffered(), 0);
    }

    #[test]
    fn test_missing_points_reply() {
        let mut session = session(30);
        assert_eq!(
            session.handle_text(r#"{"foo": 1}"#, Utc::now()),
            StreamAction::Reply(ApiResponse::missing_points())
        );
        assert_eq!(session.buffered(), 0);
    }

    #[test]
    fn test_first_batch_dispatches_then_throttles() {
        let mut session = session(30);
        let start = Utc::now();
        let msg = frame_message(&bent_arm_frame(0.5, 0.1));

        for _ in 0..29 {
            assert_eq!(session.handle_text(&msg, start), StreamAction::Nothing);
        }
        match session.handle_text(&msg, start) {
            StreamAction::Dispatch(report) => {
                assert!(report.starts_with("Throw Analysis:"));
                assert!(report.ends_with("Give one tip."));
            }
            other => panic!("expected dispatch, got {:?}", other),
        }
        assert_eq!(session.buffered(), 0);

        // 10 秒后的下一批被计算但不发送
        let soon = start + Duration::seconds(10);
        let actions: Vec<_> = (0..30).map(|_| session.handle_text(&msg, soon)).collect();
        assert!(actions.iter().all(|a| *a == StreamAction::Nothing));
        assert_eq!(session.buffered(), 0);

        // 61 秒后再次允许发送
        let later = start + Duration::seconds(61);
        for _ in 0..29 {
            session.handle_text(&msg, later);
        }
        assert!(matches!(session.handle_text(&msg, later), StreamAction::Dispatch(_)));
    }

    #[test]
    fn test_short_frames_reply_error() {
        let mut session = session(2);
        let msg = json!({"points": [{"x": 0.0, "y": 0.0, "z": 0.0}]}).to_string();
        assert_eq!(session.handle_text(&msg, Utc::now()), StreamAction::Nothing);
        match session.handle_text(&msg, Utc::now()) {
            StreamAction::Reply(ApiResponse::Error { error }) => {
                assert!(error.contains("missing keypoint"), "unexpected error: {}", error)
            }
            other => panic!("expected error reply, got {:?}", other),
        }
        assert_eq!(session.buffered(), 0);
    }

    #[tokio::test]
    async fn test_writer_drains_queued_replies() {
        let (out_sender, mut out_receiver) = mpsc::unbounded_channel::<Message>();
        let sink = Box::pin(futures_util::sink::unfold(out_sender, |tx, msg: Message| async move {
            let _ = tx.send(msg);
            Ok::<_, std::convert::Infallible>(tx)
        }));
        let (reply_sender, reply_receiver) = mpsc::channel(32);
        let writer = spawn_writer(sink, reply_receiver, "stream_test".to_string());

        reply_sender.send(ApiResponse::missing_points()).await.unwrap();
        reply_sender.send(ApiResponse::feedback("Follow through.".into())).await.unwrap();
        drop(reply_sender);

        // 关闭发送端后写任务发完两条回复再退出
        tokio::time::timeout(WRITER_DRAIN_TIMEOUT, writer).await.unwrap().unwrap();
        let sent: Vec<Message> = std::iter::from_fn(|| out_receiver.try_recv().ok()).collect();
        assert_eq!(
            sent,
            vec![
                Message::Text(ApiResponse::missing_points().to_json()),
                Message::Text(r#"{"Text":"Follow through."}"#.to_string()),
            ]
        );
    }
}
