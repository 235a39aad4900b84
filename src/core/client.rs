use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::api::models::fetch_models;
use crate::api::{ApiError, ChatMessage, GenerateRequest};
use crate::core::chat_stream::{
    lock_history, run_stream, FragmentStream, SharedHistory, StreamMode, StreamParams,
    FRAGMENT_BUFFER,
};
use crate::core::config::Persona;
use crate::core::message::Role;
use crate::utils::url::{construct_api_url, has_http_scheme, normalize_base_url};

/// What the front-ends need from a generative-text service.
///
/// `chat` and `complete` spawn their request on the current tokio runtime and
/// hand back the consumer half immediately.
#[async_trait]
pub trait GenerativeApi: Send + Sync {
    /// Model names installed on the service. Empty is a valid answer.
    async fn list_models(&self) -> Result<Vec<String>, ApiError>;

    fn select_model(&mut self, model: &str);

    /// Append `input` to the history and stream the reply. The reply is
    /// appended to the history once the stream finishes.
    fn chat(&mut self, input: &str) -> FragmentStream;

    /// One-shot completion with no history.
    fn complete(&self, prompt: &str) -> FragmentStream;

    fn history(&self) -> Vec<ChatMessage>;

    fn close(&mut self);
}

/// Builds clients for an endpoint. The app holds one of these so tests can
/// substitute doubles for the HTTP client.
pub trait ApiConnector: Send + Sync {
    fn connect(&self, base_url: &str, system_prompt: Option<&str>) -> Box<dyn GenerativeApi>;

    fn connect_persona(&self, persona: &Persona) -> Box<dyn GenerativeApi> {
        let mut api = self.connect(&persona.api_url, persona.system_prompt());
        api.select_model(&persona.model);
        api
    }
}

#[derive(Clone)]
pub struct OllamaConnector {
    http: reqwest::Client,
    stream: bool,
}

impl OllamaConnector {
    pub fn new(stream: bool) -> Self {
        Self {
            http: reqwest::Client::new(),
            stream,
        }
    }
}

impl ApiConnector for OllamaConnector {
    fn connect(&self, base_url: &str, system_prompt: Option<&str>) -> Box<dyn GenerativeApi> {
        Box::new(
            OllamaClient::new(self.http.clone(), base_url, system_prompt).with_streaming(self.stream),
        )
    }
}

pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    system_prompt: Option<String>,
    history: SharedHistory,
    stream: bool,
    closed: bool,
}

impl OllamaClient {
    pub fn new(http: reqwest::Client, base_url: &str, system_prompt: Option<&str>) -> Self {
        let system_prompt = system_prompt
            .map(str::trim)
            .filter(|prompt| !prompt.is_empty())
            .map(str::to_string);
        let history = system_prompt
            .iter()
            .map(|prompt| ChatMessage::new(Role::System, prompt.clone()))
            .collect();

        Self {
            http,
            base_url: normalize_base_url(base_url),
            model: String::new(),
            system_prompt,
            history: Arc::new(Mutex::new(history)),
            stream: true,
            closed: false,
        }
    }

    pub fn with_streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    fn spawn(&self, endpoint: &str, request: GenerateRequest, mode: StreamMode) -> FragmentStream {
        let (sender, stream) = FragmentStream::channel(FRAGMENT_BUFFER);
        let params = StreamParams {
            client: self.http.clone(),
            url: construct_api_url(&self.base_url, endpoint),
            request,
            mode,
            history: (mode == StreamMode::Chat).then(|| Arc::clone(&self.history)),
        };
        tokio::spawn(run_stream(params, sender));
        stream
    }
}

#[async_trait]
impl GenerativeApi for OllamaClient {
    async fn list_models(&self) -> Result<Vec<String>, ApiError> {
        if self.closed {
            return Ok(Vec::new());
        }
        if !has_http_scheme(&self.base_url) {
            return Err(ApiError::InvalidUrl(self.base_url.clone()));
        }
        fetch_models(&self.http, &self.base_url).await
    }

    fn select_model(&mut self, model: &str) {
        self.model = model.trim().to_string();
    }

    fn chat(&mut self, input: &str) -> FragmentStream {
        if self.closed {
            return FragmentStream::failed(format!("Error: {}", ApiError::Closed));
        }

        let messages = {
            let mut history = lock_history(&self.history);
            history.push(ChatMessage::new(Role::User, input));
            history.clone()
        };
        let request = GenerateRequest {
            model: self.model.clone(),
            messages,
            stream: self.stream,
            ..Default::default()
        };
        self.spawn("chat", request, StreamMode::Chat)
    }

    fn complete(&self, prompt: &str) -> FragmentStream {
        if self.closed {
            return FragmentStream::failed(format!("Error: {}", ApiError::Closed));
        }

        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: Some(prompt.to_string()),
            system: self.system_prompt.clone(),
            stream: self.stream,
            ..Default::default()
        };
        self.spawn("generate", request, StreamMode::Completion)
    }

    fn history(&self) -> Vec<ChatMessage> {
        lock_history(&self.history).clone()
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
