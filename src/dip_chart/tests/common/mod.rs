//! Loopback servers for integration tests.
#![allow(dead_code)]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use futures_util::{SinkExt, StreamExt};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::oneshot,
};
use tokio_tungstenite::{
    accept_hdr_async,
    tungstenite::{
        Message,
        handshake::server::{ErrorResponse, Request, Response},
    },
};

/// A minimal HTTP/1.1 server answering every request through a handler.
pub struct HttpStub {
    pub base_url: String,
    /// `"METHOD /path?query"` of every request received, in order.
    pub requests: Arc<Mutex<Vec<String>>>,
}

pub async fn spawn_http<F>(handler: F) -> HttpStub
where
    F: Fn(&str, &str) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let handler = Arc::new(handler);

    let seen = Arc::clone(&requests);
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let seen = Arc::clone(&seen);
            let handler = Arc::clone(&handler);
            tokio::spawn(async move {
                let _ = respond(stream, seen, handler.as_ref()).await;
            });
        }
    });

    HttpStub {
        base_url: format!("http://{addr}"),
        requests,
    }
}

async fn respond<F>(
    mut stream: TcpStream,
    seen: Arc<Mutex<Vec<String>>>,
    handler: &F,
) -> std::io::Result<()>
where
    F: Fn(&str, &str) -> (u16, String),
{
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let head = String::from_utf8_lossy(&buf);
    let mut parts = head.lines().next().unwrap_or_default().split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default().to_string();
    seen.lock().unwrap().push(format!("{method} {target}"));

    let (status, body) = handler(&method, &target);
    let response = format!(
        "HTTP/1.1 {status} {}\r\nContent-Type: application/json\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        if status < 400 { "OK" } else { "Error" },
        body.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

/// Accepts connections and never answers them.
pub async fn spawn_silent() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    format!("http://{addr}")
}

/// A port with nothing listening on it.
pub async fn closed_port_base() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("ws://{addr}")
}

/// A WebSocket server that sends `frames` to each client, then either
/// closes or waits for the client to hang up.
pub struct WsStub {
    pub base_url: String,
    pub connections: Arc<AtomicUsize>,
    pub paths: Arc<Mutex<Vec<String>>>,
    /// Fires when a client closes a connection the server kept open.
    pub client_closed: Option<oneshot::Receiver<()>>,
}

pub async fn spawn_ws(frames: Vec<String>, close_after_frames: bool) -> WsStub {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let paths = Arc::new(Mutex::new(Vec::new()));
    let (closed_tx, closed_rx) = oneshot::channel();

    let counter = Arc::clone(&connections);
    let seen = Arc::clone(&paths);
    tokio::spawn(async move {
        let mut closed_tx = Some(closed_tx);
        while let Ok((stream, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            let seen = Arc::clone(&seen);
            let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                seen.lock().unwrap().push(req.uri().path().to_string());
                Ok(resp)
            };
            let Ok(mut ws) = accept_hdr_async(stream, callback).await else {
                continue;
            };

            for frame in &frames {
                if ws.send(Message::Text(frame.clone())).await.is_err() {
                    break;
                }
            }

            if close_after_frames {
                let _ = ws.close(None).await;
                // Drain until the close handshake finishes.
                while let Some(Ok(_)) = ws.next().await {}
            } else {
                loop {
                    match ws.next().await {
                        Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                        Some(Ok(_)) => {}
                    }
                }
                if let Some(tx) = closed_tx.take() {
                    let _ = tx.send(());
                }
            }
        }
    });

    WsStub {
        base_url: format!("ws://{addr}"),
        connections,
        paths,
        client_closed: Some(closed_rx),
    }
}

pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}
