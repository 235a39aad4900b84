//! Test doubles for the generative-text service and the app.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::api::{ApiError, ChatMessage};
use crate::core::app::{App, SessionContext};
use crate::core::chat_stream::{FragmentSender, FragmentStream, FRAGMENT_BUFFER};
use crate::core::client::{ApiConnector, GenerativeApi};
use crate::core::config::{ConfigStore, Persona};
use crate::core::message::Role;
use crate::core::persona::PersonaStore;

#[derive(Default)]
struct FakeState {
    model: String,
    models: Vec<String>,
    models_error: Option<String>,
    history: Vec<ChatMessage>,
    senders: VecDeque<FragmentSender>,
    chat_calls: usize,
    closed: bool,
}

/// In-memory [`GenerativeApi`]. Each `chat` call parks the producer half of
/// its stream so the test can feed fragments by hand.
#[derive(Clone, Default)]
pub struct FakeApi {
    state: Arc<Mutex<FakeState>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_models(models: &[&str]) -> Self {
        let api = Self::new();
        api.state.lock().unwrap().models = models.iter().map(|m| m.to_string()).collect();
        api
    }

    pub fn unreachable(message: &str) -> Self {
        let api = Self::new();
        api.state.lock().unwrap().models_error = Some(message.to_string());
        api
    }

    pub fn take_sender(&self) -> Option<FragmentSender> {
        self.state.lock().unwrap().senders.pop_front()
    }

    /// Record the reply the way the real client does once a turn completes.
    pub fn finish_turn(&self, reply: &str) {
        self.state
            .lock()
            .unwrap()
            .history
            .push(ChatMessage::new(Role::Assistant, reply));
    }

    pub fn chat_calls(&self) -> usize {
        self.state.lock().unwrap().chat_calls
    }
}

#[async_trait]
impl GenerativeApi for FakeApi {
    async fn list_models(&self) -> Result<Vec<String>, ApiError> {
        let state = self.state.lock().unwrap();
        if state.closed {
            return Ok(Vec::new());
        }
        match &state.models_error {
            Some(message) => Err(ApiError::Status {
                status: 503,
                body: message.clone(),
            }),
            None => Ok(state.models.clone()),
        }
    }

    fn select_model(&mut self, model: &str) {
        self.state.lock().unwrap().model = model.to_string();
    }

    fn chat(&mut self, input: &str) -> FragmentStream {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return FragmentStream::failed("Error: API is closed");
        }
        state.chat_calls += 1;
        state.history.push(ChatMessage::new(Role::User, input));
        let (sender, stream) = FragmentStream::channel(FRAGMENT_BUFFER);
        state.senders.push_back(sender);
        stream
    }

    fn complete(&self, _prompt: &str) -> FragmentStream {
        let (sender, stream) = FragmentStream::channel(FRAGMENT_BUFFER);
        self.state.lock().unwrap().senders.push_back(sender);
        stream
    }

    fn history(&self) -> Vec<ChatMessage> {
        self.state.lock().unwrap().history.clone()
    }

    fn close(&mut self) {
        self.state.lock().unwrap().closed = true;
    }
}

/// Hands out a fresh [`FakeApi`] per connection and remembers them.
#[derive(Clone, Default)]
pub struct FakeConnector {
    template: FakeApi,
    connected: Arc<Mutex<Vec<(String, FakeApi)>>>,
}

impl FakeConnector {
    pub fn new(template: FakeApi) -> Self {
        Self {
            template,
            connected: Arc::default(),
        }
    }

    pub fn last_api(&self) -> Option<FakeApi> {
        self.connected
            .lock()
            .unwrap()
            .last()
            .map(|(_, api)| api.clone())
    }

    pub fn connected_urls(&self) -> Vec<String> {
        self.connected
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }
}

impl ApiConnector for FakeConnector {
    fn connect(&self, base_url: &str, _system_prompt: Option<&str>) -> Box<dyn GenerativeApi> {
        let template = self.template.state.lock().unwrap();
        let api = FakeApi::new();
        {
            let mut state = api.state.lock().unwrap();
            state.models = template.models.clone();
            state.models_error = template.models_error.clone();
        }
        self.connected
            .lock()
            .unwrap()
            .push((base_url.to_string(), api.clone()));
        Box::new(api)
    }
}

pub fn test_persona(name: &str) -> Persona {
    Persona::new(name, "http://localhost:11434/api", "m1", None)
}

/// An app backed by a config file in `dir`, pre-populated with `personas`.
/// The first persona is the default and the active one.
pub fn create_test_app(dir: &TempDir, personas: &[Persona], connector: FakeConnector) -> App {
    let mut store = PersonaStore::load(ConfigStore::new(dir.path().join("config.toml"))).unwrap();
    for (index, persona) in personas.iter().enumerate() {
        store.add(persona.clone(), index == 0).unwrap();
    }
    let active = store.default_persona();
    App::new(SessionContext::new(store, Arc::new(connector), active))
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

impl RecordedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

pub struct StubServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubServer {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Serve each canned `(status, body)` to one connection, in order.
pub async fn serve_sequence(responses: Vec<(u16, String)>) -> StubServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&requests);

    tokio::spawn(async move {
        for (status, body) in responses {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            if let Some(request) = read_request(&mut socket).await {
                recorded.lock().unwrap().push(request);
            }
            let _ = write_response(&mut socket, status, &body).await;
        }
    });

    StubServer {
        base_url: format!("http://{addr}/api"),
        requests,
    }
}

/// Serve a single canned response and return the base URL.
pub async fn serve_once(status: u16, body: &str) -> String {
    serve_sequence(vec![(status, body.to_string())]).await.base_url
}

/// Send `first` and then hold the connection open without finishing the body.
pub async fn serve_hanging(first: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let first = first.to_string();

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let _ = read_request(&mut socket).await;
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/x-ndjson\r\nContent-Length: {}\r\n\r\n",
            first.len() + 4096
        );
        let _ = socket.write_all(head.as_bytes()).await;
        let _ = socket.write_all(first.as_bytes()).await;
        let _ = socket.flush().await;
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
    });

    format!("http://{addr}/api")
}

async fn read_request(socket: &mut TcpStream) -> Option<RecordedRequest> {
    let mut data = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let read = socket.read(&mut chunk).await.ok()?;
        if read == 0 {
            return None;
        }
        data.extend_from_slice(&chunk[..read]);
        if let Some(pos) = find_header_end(&data) {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&data[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let body_start = header_end + 4;
    while data.len() < body_start + content_length {
        let read = socket.read(&mut chunk).await.ok()?;
        if read == 0 {
            break;
        }
        data.extend_from_slice(&chunk[..read]);
    }

    let mut request_line = head.lines().next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let path = request_line.next().unwrap_or_default().to_string();
    let body_end = data.len().min(body_start + content_length);
    let body = String::from_utf8_lossy(&data[body_start.min(body_end)..body_end]).to_string();

    Some(RecordedRequest { method, path, body })
}

fn find_header_end(data: &[u8]) -> Option<usize> {
    data.windows(4).position(|window| window == b"\r\n\r\n")
}

async fn write_response(socket: &mut TcpStream, status: u16, body: &str) -> std::io::Result<()> {
    let reason = match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        _ => "Error",
    };
    let head = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/x-ndjson\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    socket.write_all(head.as_bytes()).await?;
    socket.write_all(body.as_bytes()).await?;
    socket.flush().await?;
    socket.shutdown().await
}
