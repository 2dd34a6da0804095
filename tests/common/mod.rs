//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use http::{HeaderMap, StatusCode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use client_pipeline::auth::{Credential, CredentialProvider};
use client_pipeline::http::{InboundResponse, OutboundRequest, Transport, TransportError};
use client_pipeline::observability::{LogSink, RequestRecord};

/// One scripted transport reply.
pub enum Reply {
    Status(u16),
    StatusWithBody(u16, &'static str),
    Fail(TransportError),
    /// Wait before answering 200, so cancellation can land mid-exchange.
    Delay(Duration),
    Panic,
}

/// In-memory transport replaying a script; the last reply repeats forever.
#[derive(Clone)]
pub struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<Reply>>>,
    last: Arc<Mutex<Option<u16>>>,
    calls: Arc<AtomicU32>,
    seen: Arc<Mutex<Vec<HeaderMap>>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Reply>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            last: Arc::new(Mutex::new(None)),
            calls: Arc::new(AtomicU32::new(0)),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always answer with `status`.
    pub fn always(status: u16) -> Self {
        Self::new(vec![Reply::Status(status)])
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Headers of every request that reached the transport.
    pub fn seen_headers(&self) -> Vec<HeaderMap> {
        self.seen.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: OutboundRequest) -> BoxFuture<'static, Result<InboundResponse, TransportError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(request.headers().clone());

        let reply = {
            let mut script = self.script.lock().unwrap();
            match script.pop_front() {
                Some(reply) => {
                    if let Reply::Status(code) = reply {
                        *self.last.lock().unwrap() = Some(code);
                    }
                    Some(reply)
                }
                None => None,
            }
        };
        let repeat = *self.last.lock().unwrap();

        Box::pin(async move {
            match reply {
                Some(Reply::Status(code)) => Ok(InboundResponse::new(status(code))),
                Some(Reply::StatusWithBody(code, body)) => {
                    Ok(InboundResponse::new(status(code)).with_body(body))
                }
                Some(Reply::Fail(err)) => Err(err),
                Some(Reply::Delay(delay)) => {
                    tokio::select! {
                        _ = request.cancel().cancelled() => Err(TransportError::Cancelled),
                        _ = tokio::time::sleep(delay) => Ok(InboundResponse::new(StatusCode::OK)),
                    }
                }
                Some(Reply::Panic) => panic!("transport exploded"),
                None => Ok(InboundResponse::new(status(repeat.unwrap_or(200)))),
            }
        })
    }
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap()
}

/// Credential provider that counts auth-failure notifications.
#[derive(Default)]
pub struct RecordingProvider {
    token: Option<Credential>,
    failures: AtomicU32,
}

impl RecordingProvider {
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Some(Credential::new(token)),
            failures: AtomicU32::new(0),
        }
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            token: Some(credential),
            failures: AtomicU32::new(0),
        }
    }

    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::SeqCst)
    }
}

impl CredentialProvider for RecordingProvider {
    fn access_token(&self) -> BoxFuture<'_, Option<Credential>> {
        Box::pin(async move { self.token.clone() })
    }

    fn notify_auth_failure(&self) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }
}

/// Log sink that keeps every record.
#[derive(Default)]
pub struct CollectingSink {
    records: Mutex<Vec<RequestRecord>>,
}

impl CollectingSink {
    pub fn records(&self) -> Vec<RequestRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl LogSink for CollectingSink {
    fn record(&self, record: &RequestRecord) {
        self.records.lock().unwrap().push(record.clone());
    }
}

/// Start a programmable backend on an ephemeral port.
///
/// `f` receives the raw request head and returns the status and body.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 8192];
                        let n = socket.read(&mut buf).await.unwrap_or(0);
                        let head = String::from_utf8_lossy(&buf[..n]).into_owned();

                        let (status, body) = f(head).await;
                        let status_text = match status {
                            200 => "200 OK",
                            400 => "400 Bad Request",
                            401 => "401 Unauthorized",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}
