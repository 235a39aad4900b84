use tracing::debug;
use tui_textarea::{Input, TextArea};

use crate::api::ChatMessage;
use crate::core::app::input::{field_input, field_paste, field_text, text_field};
use crate::core::chat_stream::{Fragment, FragmentStream, TryNext};
use crate::core::client::GenerativeApi;
use crate::core::config::Persona;
use crate::core::message::{Message, TranscriptRole};
use crate::core::text_wrapping::transcript_lines;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input; nothing happened.
    Empty,
    /// A reply is still streaming; nothing happened.
    Busy,
    Started,
}

/// One chat session with a persona.
///
/// Created fresh each time the chat screen is entered and dropped on exit.
/// Dropping it drops the in-flight [`FragmentStream`], which cancels the
/// request.
pub struct ChatView {
    persona: Persona,
    api: Box<dyn GenerativeApi>,
    transcript: Vec<Message>,
    input: TextArea<'static>,
    stream: Option<FragmentStream>,
    reply_started: bool,
    scroll_from_bottom: usize,
}

impl ChatView {
    pub fn new(persona: Persona, api: Box<dyn GenerativeApi>) -> Self {
        let transcript = persona
            .system_prompt()
            .map(|prompt| vec![Message::new(TranscriptRole::System, prompt)])
            .unwrap_or_default();

        Self {
            persona,
            api,
            transcript,
            input: text_field("Type a message, Enter to send"),
            stream: None,
            reply_started: false,
            scroll_from_bottom: 0,
        }
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn history(&self) -> Vec<ChatMessage> {
        self.api.history()
    }

    pub fn input(&self) -> &TextArea<'static> {
        &self.input
    }

    pub fn is_busy(&self) -> bool {
        self.stream.is_some()
    }

    pub fn submit(&mut self, text: &str) -> SubmitOutcome {
        if text.trim().is_empty() {
            return SubmitOutcome::Empty;
        }
        if self.is_busy() {
            return SubmitOutcome::Busy;
        }

        debug!(persona = %self.persona.name, chars = text.len(), "submitting chat turn");
        self.transcript.push(Message::user(text));
        self.stream = Some(self.api.chat(text));
        self.reply_started = false;
        self.scroll_from_bottom = 0;
        SubmitOutcome::Started
    }

    /// Submit whatever is in the input field. The field is cleared only when
    /// a request actually starts.
    pub fn submit_input(&mut self) -> SubmitOutcome {
        let text = field_text(&self.input);
        let outcome = self.submit(&text);
        if outcome == SubmitOutcome::Started {
            self.input = text_field("Type a message, Enter to send");
        }
        outcome
    }

    pub fn handle_input(&mut self, input: Input) -> bool {
        field_input(&mut self.input, input)
    }

    pub fn paste(&mut self, text: &str) -> bool {
        field_paste(&mut self.input, text)
    }

    /// Drain every fragment that is ready without waiting. Returns whether
    /// the transcript changed.
    pub fn poll_stream(&mut self) -> bool {
        let mut changed = false;
        while let Some(stream) = self.stream.as_mut() {
            match stream.try_next() {
                TryNext::Fragment(fragment) => {
                    self.apply_fragment(fragment);
                    changed = true;
                }
                TryNext::Pending => break,
                TryNext::Closed => {
                    self.finish_turn();
                    self.transcript
                        .push(Message::app_error("Response stream ended unexpectedly"));
                    changed = true;
                }
            }
        }
        changed
    }

    fn apply_fragment(&mut self, fragment: Fragment) {
        if !self.reply_started && (fragment.error.is_none() || !fragment.text.is_empty()) {
            self.transcript.push(Message::assistant(""));
            self.reply_started = true;
        }

        if !fragment.text.is_empty() {
            if let Some(last) = self.transcript.last_mut() {
                last.content.push_str(&fragment.text);
            }
        }

        if let Some(error) = fragment.error {
            self.transcript.push(Message::app_error(error));
        }

        if fragment.is_final {
            self.finish_turn();
        }
    }

    fn finish_turn(&mut self) {
        self.stream = None;
        self.reply_started = false;
    }

    pub fn scroll_from_bottom(&self) -> usize {
        self.scroll_from_bottom
    }

    /// Scroll by `lines` (positive is towards older output), clamped to the
    /// transcript laid out at `width` in a viewport `height` lines tall.
    pub fn scroll_by(&mut self, lines: i32, width: usize, height: usize) {
        let max = self.max_scroll(width, height);
        let current = self.scroll_from_bottom.min(max) as i64;
        let next = (current + i64::from(lines)).clamp(0, max as i64);
        self.scroll_from_bottom = next as usize;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_from_bottom = 0;
    }

    pub fn max_scroll(&self, width: usize, height: usize) -> usize {
        transcript_lines(&self.transcript, width)
            .len()
            .saturating_sub(height)
    }
}

impl Drop for ChatView {
    fn drop(&mut self) {
        self.api.close();
    }
}
