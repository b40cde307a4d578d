//! Shared backends for integration and load testing.

use std::collections::{BTreeMap, BTreeSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// Start a keep-alive backend answering every request with `response`.
///
/// Returns its address and a counter of accepted TCP connections.
#[allow(dead_code)]
pub async fn start_mock_backend(response: &'static str) -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));

    let counter = connections.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(serve(socket, response, true));
                }
                Err(_) => break,
            }
        }
    });

    (addr, connections)
}

/// Start a backend that answers one request per connection with
/// `Connection: close` and then shuts the socket down.
#[allow(dead_code)]
pub async fn start_closing_backend(response: &'static str) -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));

    let counter = connections.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(serve(socket, response, false));
        }
    });

    (addr, connections)
}

/// Serve requests on one connection until the client closes it, or after
/// the first response when `keep_alive` is false.
async fn serve(socket: TcpStream, response: &'static str, keep_alive: bool) {
    let (read, mut write) = socket.into_split();
    let mut reader = BufReader::new(read);
    let mut line = String::new();

    loop {
        // Request line
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }

        let mut content_length = 0usize;
        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) | Err(_) => return,
                Ok(_) => {}
            }
            let header = line.trim_end();
            if header.is_empty() {
                break;
            }
            if let Some((name, value)) = header.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
            }
        }

        let mut body = vec![0u8; content_length];
        if reader.read_exact(&mut body).await.is_err() {
            return;
        }

        let reply = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: {}\r\n\r\n{}",
            response.len(),
            if keep_alive { "keep-alive" } else { "close" },
            response
        );
        if write.write_all(reply.as_bytes()).await.is_err() {
            return;
        }
        if !keep_alive {
            let _ = write.shutdown().await;
            return;
        }
    }
}

/// Start a backend that reads one request head per connection and then
/// hangs up without answering.
#[allow(dead_code)]
pub async fn start_hangup_backend() -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));

    let counter = connections.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let mut reader = BufReader::new(socket);
                let mut line = String::new();
                loop {
                    line.clear();
                    match reader.read_line(&mut line).await {
                        Ok(0) | Err(_) => return,
                        Ok(_) if line.trim_end().is_empty() => return,
                        Ok(_) => {}
                    }
                }
            });
        }
    });

    (addr, connections)
}

/// Start a backend that accepts connections and never answers.
#[allow(dead_code)]
pub async fn start_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    addr
}

/// Port with nothing listening on it.
#[allow(dead_code)]
pub fn unused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Start an axum backend exposing `GET /` and `POST /text/anagrams`.
#[allow(dead_code)]
pub async fn start_text_backend() -> SocketAddr {
    let app = Router::new()
        .route("/", get(|| async { Json(json!({"status": "okay"})) }))
        .route("/text/anagrams", post(anagrams));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    addr
}

async fn anagrams(Json(request): Json<Value>) -> Response {
    let Some(input) = request.get("input") else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"detail": "'input' not found"})),
        )
            .into_response();
    };
    let Some(input) = input.as_str() else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"detail": "Unsupported Type"})),
        )
            .into_response();
    };

    let words: BTreeSet<&str> = input.split_whitespace().collect();
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for word in words {
        let mut signature: Vec<char> = word.chars().collect();
        signature.sort_unstable();
        groups
            .entry(signature.into_iter().collect())
            .or_default()
            .push(word.to_string());
    }

    let groups: Vec<Vec<String>> = groups.into_values().filter(|g| g.len() > 1).collect();
    Json(groups).into_response()
}
