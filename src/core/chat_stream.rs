use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::StreamExt;
use memchr::memchr;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::{ChatMessage, GenerateRequest, GenerateResponse};
use crate::core::message::Role;

/// Fragments buffered per request before the producer waits on the UI.
pub const FRAGMENT_BUFFER: usize = 64;

/// Conversation history shared between a client and its producer tasks.
pub type SharedHistory = Arc<Mutex<Vec<ChatMessage>>>;

pub fn lock_history(history: &Mutex<Vec<ChatMessage>>) -> MutexGuard<'_, Vec<ChatMessage>> {
    history.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One incremental piece of model output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
    pub is_final: bool,
    pub error: Option<String>,
}

impl Fragment {
    pub fn partial(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
            error: None,
        }
    }

    pub fn last(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            is_final: true,
            error: Some(message.into()),
        }
    }
}

/// Which field of a response object carries the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// `/chat`: text in `message.content`.
    Chat,
    /// `/generate`: text in `response`.
    Completion,
}

/// Result of polling a [`FragmentStream`] without waiting.
#[derive(Debug, PartialEq, Eq)]
pub enum TryNext {
    Fragment(Fragment),
    Pending,
    Closed,
}

/// Consumer half of one request's fragment channel.
///
/// Dropping the handle cancels the request: the producer observes the
/// cancellation token and stops instead of waiting for a reader that is gone.
pub struct FragmentStream {
    rx: mpsc::Receiver<Fragment>,
    cancel: CancellationToken,
}

/// Producer half of one request's fragment channel.
pub struct FragmentSender {
    tx: mpsc::Sender<Fragment>,
    cancel: CancellationToken,
}

impl FragmentStream {
    pub fn channel(buffer: usize) -> (FragmentSender, FragmentStream) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let cancel = CancellationToken::new();
        (
            FragmentSender {
                tx,
                cancel: cancel.clone(),
            },
            FragmentStream { rx, cancel },
        )
    }

    /// A stream that has already failed, used when no request can be made.
    pub fn failed(message: impl Into<String>) -> Self {
        let (sender, stream) = Self::channel(1);
        let _ = sender.tx.try_send(Fragment::error(message));
        stream
    }

    pub fn try_next(&mut self) -> TryNext {
        match self.rx.try_recv() {
            Ok(fragment) => TryNext::Fragment(fragment),
            Err(mpsc::error::TryRecvError::Empty) => TryNext::Pending,
            Err(mpsc::error::TryRecvError::Disconnected) => TryNext::Closed,
        }
    }

    pub async fn next(&mut self) -> Option<Fragment> {
        self.rx.recv().await
    }
}

impl Drop for FragmentStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl FragmentSender {
    /// Deliver one fragment. Returns `false` once the consumer is gone,
    /// either because it cancelled or because the receiver was dropped.
    pub async fn send(&self, fragment: Fragment) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = self.tx.send(fragment) => sent.is_ok(),
        }
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// How a producer task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// A final fragment was delivered; carries every fragment's text.
    Completed(String),
    /// An error fragment was delivered after `partial` text.
    Failed { partial: String },
    /// The consumer went away before the stream finished.
    Abandoned,
}

pub struct StreamParams {
    pub client: reqwest::Client,
    pub url: String,
    pub request: GenerateRequest,
    pub mode: StreamMode,
    /// Chat turns record their reply here before the terminal fragment is
    /// sent.
    pub history: Option<SharedHistory>,
}

/// Decode one response line into a fragment.
///
/// Blank lines yield `Ok(None)`. Objects carrying an `error` key, and
/// anything that is not a response object, yield a formatted error message.
pub fn decode_line(line: &str, mode: StreamMode) -> Result<Option<Fragment>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(trimmed)
        .map_err(|err| format!("Failed to decode response ({err}): {trimmed}"))?;
    if value.get("error").is_some() {
        return Err(format_api_error(trimmed));
    }

    let response: GenerateResponse = serde_json::from_value(value)
        .map_err(|err| format!("Failed to decode response ({err}): {trimmed}"))?;
    let text = match mode {
        StreamMode::Chat => response.message.map(|message| message.content),
        StreamMode::Completion => response.response,
    }
    .unwrap_or_default();

    Ok(Some(Fragment {
        text,
        is_final: response.done,
        error: None,
    }))
}

fn extract_error_summary(value: &Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value.get("error").and_then(|v| match v {
                Value::String(s) => Some(s.to_string()),
                _ => None,
            })
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
}

pub(crate) fn format_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();
    if trimmed.is_empty() {
        return "API Error: <empty response>".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<Value>(trimmed) {
        if let Some(summary) = extract_error_summary(&json_value) {
            if !summary.is_empty() {
                return format!("API Error: {summary}");
            }
        }
        return format!("API Error: {json_value}");
    }

    format!(
        "API Error: {}",
        trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
    )
}

/// Run one request to completion, pushing fragments through `sender`.
pub async fn run_stream(params: StreamParams, sender: FragmentSender) -> StreamOutcome {
    let cancel = sender.cancel_token();
    tokio::select! {
        outcome = drive_request(params, &sender) => outcome,
        _ = cancel.cancelled() => {
            debug!("stream abandoned by consumer");
            StreamOutcome::Abandoned
        }
    }
}

/// The producer's side of one request: where fragments go and where the
/// finished reply is recorded.
struct Turn<'a> {
    sender: &'a FragmentSender,
    history: Option<SharedHistory>,
}

impl Turn<'_> {
    fn record_reply(&self, reply: &str) {
        if self.sender.cancel.is_cancelled() {
            return;
        }
        if let Some(history) = &self.history {
            lock_history(history).push(ChatMessage::new(Role::Assistant, reply));
        }
    }

    async fn send(&self, fragment: Fragment) -> bool {
        self.sender.send(fragment).await
    }

    async fn finish(&self, fragment: Fragment, reply: String) -> StreamOutcome {
        self.record_reply(&reply);
        if self.send(fragment).await {
            StreamOutcome::Completed(reply)
        } else {
            StreamOutcome::Abandoned
        }
    }

    async fn fail(&self, message: String, partial: String) -> StreamOutcome {
        debug!(error = %message, "stream failed");
        if !partial.is_empty() {
            self.record_reply(&partial);
        }
        if self.send(Fragment::error(message)).await {
            StreamOutcome::Failed { partial }
        } else {
            StreamOutcome::Abandoned
        }
    }
}

async fn drive_request(params: StreamParams, sender: &FragmentSender) -> StreamOutcome {
    let StreamParams {
        client,
        url,
        request,
        mode,
        history,
    } = params;
    let turn = Turn { sender, history };
    debug!(%url, model = %request.model, stream = request.stream, "sending request");

    let response = match client
        .post(&url)
        .header("Content-Type", "application/json")
        .json(&request)
        .send()
        .await
    {
        Ok(response) => response,
        Err(err) => return turn.fail(format_api_error(&err.to_string()), String::new()).await,
    };

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        debug!(%status, "service returned an error status");
        return turn.fail(format_api_error(&error_text), String::new()).await;
    }

    if !request.stream {
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                return turn.fail(format_api_error(&err.to_string()), String::new()).await
            }
        };
        return match decode_line(&body, mode) {
            Ok(Some(fragment)) => {
                let text = fragment.text.clone();
                turn.finish(Fragment::last(fragment.text), text).await
            }
            Ok(None) => turn.fail(format_api_error(""), String::new()).await,
            Err(message) => turn.fail(message, String::new()).await,
        };
    }

    let mut collected = String::new();
    let mut stream = response.bytes_stream();
    let mut buffer: Vec<u8> = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk_bytes = match chunk {
            Ok(bytes) => bytes,
            Err(err) => return turn.fail(format_api_error(&err.to_string()), collected).await,
        };
        buffer.extend_from_slice(&chunk_bytes);

        while let Some(newline_pos) = memchr(b'\n', &buffer) {
            let line: Vec<u8> = buffer.drain(..=newline_pos).collect();
            if let ControlFlow::Break(outcome) =
                handle_line(&line[..newline_pos], mode, &turn, &mut collected).await
            {
                return outcome;
            }
        }
    }

    if !buffer.is_empty() {
        let line = std::mem::take(&mut buffer);
        if let ControlFlow::Break(outcome) = handle_line(&line, mode, &turn, &mut collected).await {
            return outcome;
        }
    }

    // End of input without a `done` object still completes the turn.
    turn.finish(Fragment::last(""), collected).await
}

async fn handle_line(
    line: &[u8],
    mode: StreamMode,
    turn: &Turn<'_>,
    collected: &mut String,
) -> ControlFlow<StreamOutcome> {
    let line = match std::str::from_utf8(line) {
        Ok(line) => line,
        Err(err) => {
            let message = format!("Invalid UTF-8 in response stream: {err}");
            return ControlFlow::Break(turn.fail(message, std::mem::take(collected)).await);
        }
    };

    match decode_line(line, mode) {
        Ok(None) => ControlFlow::Continue(()),
        Ok(Some(fragment)) if fragment.is_final => {
            collected.push_str(&fragment.text);
            ControlFlow::Break(turn.finish(fragment, std::mem::take(collected)).await)
        }
        Ok(Some(fragment)) => {
            collected.push_str(&fragment.text);
            if turn.send(fragment).await {
                ControlFlow::Continue(())
            } else {
                ControlFlow::Break(StreamOutcome::Abandoned)
            }
        }
        Err(message) => {
            ControlFlow::Break(turn.fail(message, std::mem::take(collected)).await)
        }
    }
}
