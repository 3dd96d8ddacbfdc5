//! Deploy stream over a real WebSocket server

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use futures::{SinkExt, StreamExt};
use secrecy::SecretString;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

use deployctl::deploy::coordinator::{deploy, DeployOptions};
use deployctl::errors::ClientError;
use deployctl::models::deploy::{DeployInfo, DeployRequest, ServerMessage};
use deployctl::ws::connection::WsConnector;

use crate::mocks::SharedOutput;

/// What the test server saw on the wire
#[derive(Debug, Default)]
struct Received {
    authorization: Option<String>,
    path: String,
    frames: Vec<DeployRequest>,
}

/// Serve one deploy: record frames up to the end-of-upload marker, send
/// `replies`, then close with `close`, or drop the socket when it is `None`.
async fn serve_once(
    replies: Vec<&'static str>,
    close: Option<(CloseCode, &'static str)>,
) -> (SocketAddr, JoinHandle<Received>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let seen = Arc::new(Mutex::new(Received::default()));
        let seen_hdr = seen.clone();
        let mut ws = tokio_tungstenite::accept_hdr_async(
            tcp,
            move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                let mut seen = seen_hdr.lock().unwrap();
                seen.path = req.uri().path().to_string();
                seen.authorization = req
                    .headers()
                    .get("authorization")
                    .map(|v| v.to_str().unwrap().to_string());
                Ok(resp)
            },
        )
        .await
        .unwrap();

        let mut frames = Vec::new();
        while let Some(msg) = ws.next().await {
            match msg.unwrap() {
                Message::Text(text) => frames.push(serde_json::from_str(text.as_str()).unwrap()),
                Message::Binary(bytes) if bytes.is_empty() => break,
                other => panic!("unexpected frame: {:?}", other),
            }
        }

        for reply in replies {
            let body = serde_json::to_string(&ServerMessage {
                text: reply.to_string(),
            })
            .unwrap();
            ws.send(Message::text(body)).await.unwrap();
        }
        match close {
            Some((code, reason)) => ws
                .close(Some(CloseFrame {
                    code,
                    reason: reason.into(),
                }))
                .await
                .unwrap(),
            None => drop(ws),
        }

        let mut received = std::mem::take(&mut *seen.lock().unwrap());
        received.frames = frames;
        received
    });

    (addr, handle)
}

fn write_archive(len: usize) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.tar.gz");
    std::fs::write(&path, (0..len).map(|i| (i % 256) as u8).collect::<Vec<_>>()).unwrap();
    (dir, path)
}

fn info() -> DeployInfo {
    DeployInfo {
        app: "webapi".to_string(),
        description: "from ws test".to_string(),
    }
}

#[tokio::test]
async fn test_deploy_over_websocket() {
    let (addr, server) = serve_once(vec!["Receiving 2100 bytes\n", "Deploy done\n"], Some((CloseCode::Normal, ""))).await;
    let (_dir, archive) = write_archive(2100);
    let connector = WsConnector::new(
        &format!("http://{}/api/v1", addr),
        Some(SecretString::from("s3cret")),
    )
    .unwrap();
    let out = SharedOutput::default();

    let outcome = deploy(&connector, info(), &archive, out.clone(), &DeployOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.bytes_sent, 2100);
    assert_eq!(outcome.messages_received, 2);
    assert_eq!(out.contents(), "Receiving 2100 bytes\nDeploy done\n");

    let received = server.await.unwrap();
    assert_eq!(received.path, "/api/v1/deploys/stream");
    assert_eq!(received.authorization.as_deref(), Some("Bearer s3cret"));
    assert_eq!(received.frames[0], DeployRequest::Info(info()));

    let sizes: Vec<usize> = received.frames[1..]
        .iter()
        .map(|f| match f {
            DeployRequest::File { chunk } => chunk.len(),
            DeployRequest::Info(_) => panic!("second info frame"),
        })
        .collect();
    assert_eq!(sizes, vec![1024, 1024, 52]);
    assert_eq!(std::fs::read(&archive).unwrap().len(), 2100);
}

#[tokio::test]
async fn test_remote_close_becomes_error() {
    let (addr, server) = serve_once(vec!["Checking app\n"], Some((CloseCode::Policy, "app not found"))).await;
    let (_dir, archive) = write_archive(0);
    let connector = WsConnector::new(&format!("http://{}", addr), None).unwrap();
    let out = SharedOutput::default();

    let result = deploy(&connector, info(), &archive, out.clone(), &DeployOptions::default()).await;

    match result {
        Err(ClientError::Remote { status, message }) => {
            assert_eq!(status, 1008);
            assert_eq!(message, "app not found");
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(out.contents(), "Checking app\n");

    let received = server.await.unwrap();
    assert_eq!(received.authorization, None);
    assert_eq!(received.frames, vec![DeployRequest::Info(info())]);
}

#[tokio::test]
async fn test_dropped_connection_ends_progress() {
    let (addr, server) = serve_once(vec!["done\n"], None).await;
    let (_dir, archive) = write_archive(300);
    let connector = WsConnector::new(&format!("http://{}", addr), None).unwrap();
    let out = SharedOutput::default();

    let outcome = deploy(&connector, info(), &archive, out.clone(), &DeployOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.bytes_sent, 300);
    assert_eq!(outcome.messages_received, 1);
    assert_eq!(out.contents(), "done\n");
    assert_eq!(server.await.unwrap().frames.len(), 2);
}

#[tokio::test]
async fn test_connect_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (_dir, archive) = write_archive(10);
    let connector = WsConnector::new(&format!("http://{}", addr), None).unwrap();

    let result = deploy(&connector, info(), &archive, SharedOutput::default(), &DeployOptions::default()).await;

    assert!(matches!(result, Err(ClientError::WebSocketError(_))));
}
