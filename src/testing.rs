//! In-memory fakes for the LLM, the remote browser and the fallback reader.
//!
//! They record every call so tests can assert call counts and the exact text
//! handed downstream. The loopback servers at the bottom stand in for real
//! HTTP peers when the reqwest-backed adapters themselves are under test.

use crate::api::{AskAsync, ChatRequest, LlmError};
use crate::error::{Result, TrustLensError};
use crate::scrapers::browser::{BrowserService, BrowserSession, find_article_html};
use crate::scrapers::fallback::FallbackReader;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use url::Url;

/// One request seen by [`ScriptedLlm`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub schema: String,
    pub system: String,
    pub human: String,
    pub max_tokens: Option<u32>,
}

/// LLM fake that answers by schema name.
///
/// Schemas with no scripted reply fail with an HTTP 500.
#[derive(Debug, Default)]
pub struct ScriptedLlm {
    replies: HashMap<String, String>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, schema: &str, value: Value) -> Self {
        self.raw(schema, &value.to_string())
    }

    /// Reply with arbitrary text, e.g. malformed JSON.
    pub fn raw(mut self, schema: &str, text: &str) -> Self {
        self.replies.insert(schema.to_string(), text.to_string());
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, schema: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.schema == schema)
            .count()
    }
}

impl AskAsync for ScriptedLlm {
    async fn ask(&self, request: &ChatRequest<'_>) -> std::result::Result<String, LlmError> {
        self.calls.lock().unwrap().push(RecordedCall {
            schema: request.schema.name.clone(),
            system: request.system.to_string(),
            human: request.human.to_string(),
            max_tokens: request.max_tokens,
        });
        self.replies
            .get(&request.schema.name)
            .cloned()
            .ok_or_else(|| LlmError::Http {
                status: 500,
                message: format!("no scripted reply for {}", request.schema.name),
            })
    }
}

#[derive(Debug, Clone)]
enum BrowserMode {
    Page(String),
    FailNavigation,
    Unreachable,
}

/// Browser fake serving one fixed page.
#[derive(Debug)]
pub struct FakeBrowser {
    mode: BrowserMode,
    connects: AtomicUsize,
    closes: Arc<AtomicUsize>,
}

impl FakeBrowser {
    fn new(mode: BrowserMode) -> Self {
        Self {
            mode,
            connects: AtomicUsize::new(0),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_page(html: &str) -> Self {
        Self::new(BrowserMode::Page(html.to_string()))
    }

    pub fn failing_navigation() -> Self {
        Self::new(BrowserMode::FailNavigation)
    }

    pub fn unreachable() -> Self {
        Self::new(BrowserMode::Unreachable)
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

pub struct FakeSession {
    mode: BrowserMode,
    html: Option<String>,
    closes: Arc<AtomicUsize>,
}

impl BrowserService for FakeBrowser {
    type Session = FakeSession;

    async fn connect(&self) -> Result<FakeSession> {
        if matches!(self.mode, BrowserMode::Unreachable) {
            return Err(TrustLensError::Fetch(
                "browser connect timed out after 20s".to_string(),
            ));
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSession {
            mode: self.mode.clone(),
            html: None,
            closes: Arc::clone(&self.closes),
        })
    }
}

impl BrowserSession for FakeSession {
    async fn goto(&mut self, _url: &Url) -> Result<()> {
        match &self.mode {
            BrowserMode::Page(html) => {
                self.html = Some(html.clone());
                Ok(())
            }
            _ => Err(TrustLensError::Fetch("navigation timed out".to_string())),
        }
    }

    fn article_html(&self) -> Option<String> {
        self.html.as_deref().and_then(find_article_html)
    }

    async fn close(&mut self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Fallback reader fake.
#[derive(Debug)]
pub struct FakeFallback {
    body: Option<String>,
    calls: AtomicUsize,
}

impl FakeFallback {
    pub fn ok(body: &str) -> Self {
        Self {
            body: Some(body.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            body: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FallbackReader for FakeFallback {
    async fn read(&self, _url: &Url) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.body
            .clone()
            .ok_or_else(|| TrustLensError::Fetch("fallback reader returned status 502".to_string()))
    }
}

/// Serve one raw HTTP response on a loopback port, then close.
pub async fn serve_once(response: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            read_request(&mut socket).await;
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });
    addr
}

/// Read one request: headers plus a `Content-Length` body.
async fn read_request(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let Ok(n) = socket.read(&mut chunk).await else {
            return;
        };
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(end) = text.find("\r\n\r\n") {
            let body_len = text[..end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + body_len {
                return;
            }
        }
    }
}

/// A loopback server that accepts connections and never answers.
#[derive(Debug)]
pub struct SilentServer {
    addr: SocketAddr,
    task: JoinHandle<()>,
}

impl SilentServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        Self { addr, task }
    }

    pub fn http_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }
}

impl Drop for SilentServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
