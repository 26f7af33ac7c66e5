use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use llm::{LlmConfig, OllamaProvider};
use pipeline::{ChatMessage, LlmError, LlmProvider};
use serde_json::{json, Value};

type Captured = Arc<Mutex<Option<Value>>>;

async fn spawn_server(reply: Value, status: StatusCode) -> (String, Captured) {
    let captured: Captured = Arc::new(Mutex::new(None));
    let app = Router::new()
        .route(
            "/api/chat",
            post(
                move |State(captured): State<Captured>, Json(body): Json<Value>| {
                    let reply = reply.clone();
                    async move {
                        *captured.lock().unwrap() = Some(body);
                        (status, Json(reply))
                    }
                },
            ),
        )
        .with_state(Arc::clone(&captured));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}/"), captured)
}

fn provider(host: String) -> OllamaProvider {
    OllamaProvider::new(&LlmConfig {
        host,
        model: "llama3".to_string(),
        timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn sends_non_streaming_chat_and_returns_content() {
    let (host, captured) = spawn_server(
        json!({"model": "llama3", "message": {"role": "assistant", "content": "Steady."}, "done": true}),
        StatusCode::OK,
    )
    .await;

    let reply = provider(host)
        .chat(&[ChatMessage::system("Be brief."), ChatMessage::user("Summarize.")])
        .await
        .unwrap();

    assert_eq!(reply, "Steady.");
    let request = captured.lock().unwrap().clone().unwrap();
    assert_eq!(request["model"], "llama3");
    assert_eq!(request["stream"], false);
    assert_eq!(request["messages"][0]["role"], "system");
    assert_eq!(request["messages"][1]["content"], "Summarize.");
}

#[tokio::test]
async fn blank_reply_is_an_error() {
    let (host, _) = spawn_server(
        json!({"message": {"role": "assistant", "content": "   "}}),
        StatusCode::OK,
    )
    .await;

    let err = provider(host).chat(&[ChatMessage::user("Hi")]).await.unwrap_err();
    assert!(matches!(err, LlmError::EmptyReply));
}

#[tokio::test]
async fn missing_model_is_a_status_error() {
    let (host, _) = spawn_server(
        json!({"error": "model 'llama3' not found"}),
        StatusCode::NOT_FOUND,
    )
    .await;

    let err = provider(host).chat(&[ChatMessage::user("Hi")]).await.unwrap_err();
    match err {
        LlmError::Status { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("not found"));
        }
        other => panic!("expected a status error, got {other:?}"),
    }
}
