//! Testing utilities.
//!
//! `MockBackend` answers requests from a script instead of a server, and
//! counts every call so tests can assert that a request was (or was not)
//! issued.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use greengarden_api::{
    ChatResponse, Error, GameState, LoadResponse, SaveResponse, StartGameResponse,
};
use tokio::sync::Mutex;

use crate::backend::GameBackend;

type Scripted<T> = Mutex<VecDeque<Result<T, String>>>;

/// A scripted game server.
///
/// Each request type pops the next scripted answer; a scripted `Err` is
/// delivered as a network error. When a script runs dry a neutral default
/// is returned.
#[derive(Default)]
pub struct MockBackend {
    starts: Scripted<StartGameResponse>,
    replies: Scripted<ChatResponse>,
    saves: Scripted<SaveResponse>,
    loads: Scripted<LoadResponse>,
    latency: Duration,
    start_calls: AtomicUsize,
    chat_calls: AtomicUsize,
    save_calls: AtomicUsize,
    load_calls: AtomicUsize,
    messages: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every answer by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_intro(mut self, intro: impl Into<String>, state: GameState) -> Self {
        self.starts.get_mut().push_back(Ok(StartGameResponse {
            game_state: Some(state),
            intro_text: intro.into(),
        }));
        self
    }

    pub fn with_start_failure(mut self, reason: impl Into<String>) -> Self {
        self.starts.get_mut().push_back(Err(reason.into()));
        self
    }

    pub fn with_reply(mut self, text: impl Into<String>, state: GameState) -> Self {
        self.replies.get_mut().push_back(Ok(ChatResponse {
            response: text.into(),
            game_state: Some(state),
        }));
        self
    }

    /// A reply that carries no game state at all.
    pub fn with_stateless_reply(mut self, text: impl Into<String>) -> Self {
        self.replies.get_mut().push_back(Ok(ChatResponse {
            response: text.into(),
            game_state: None,
        }));
        self
    }

    pub fn with_chat_failure(mut self, reason: impl Into<String>) -> Self {
        self.replies.get_mut().push_back(Err(reason.into()));
        self
    }

    pub fn with_save(mut self, success: bool) -> Self {
        self.saves.get_mut().push_back(Ok(SaveResponse { success }));
        self
    }

    pub fn with_load(mut self, state: Option<GameState>) -> Self {
        self.loads.get_mut().push_back(Ok(LoadResponse {
            success: state.is_some(),
            game_state: state,
        }));
        self
    }

    pub fn with_load_failure(mut self, reason: impl Into<String>) -> Self {
        self.loads.get_mut().push_back(Err(reason.into()));
        self
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn chat_calls(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    pub fn load_calls(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }

    /// Every chat message received, in order.
    pub async fn sent_messages(&self) -> Vec<String> {
        self.messages.lock().await.clone()
    }

    async fn answer<T>(&self, script: &Scripted<T>, fallback: impl FnOnce() -> T) -> Result<T, Error> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match script.lock().await.pop_front() {
            Some(Ok(value)) => Ok(value),
            Some(Err(reason)) => Err(Error::Network(reason)),
            None => Ok(fallback()),
        }
    }
}

#[async_trait]
impl GameBackend for MockBackend {
    async fn start_game(&self) -> Result<StartGameResponse, Error> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(&self.starts, || StartGameResponse {
            game_state: Some(GameState::default()),
            intro_text: "The story begins.".to_string(),
        })
        .await
    }

    async fn chat(&self, message: &str) -> Result<ChatResponse, Error> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        self.messages.lock().await.push(message.to_string());
        self.answer(&self.replies, || ChatResponse {
            response: "...".to_string(),
            game_state: None,
        })
        .await
    }

    async fn save(&self, _slot: u32) -> Result<SaveResponse, Error> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(&self.saves, || SaveResponse { success: true })
            .await
    }

    async fn load(&self, _slot: u32) -> Result<LoadResponse, Error> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(&self.loads, LoadResponse::default).await
    }
}
