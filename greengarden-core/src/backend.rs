//! The seam between the controller and the game server.

use async_trait::async_trait;
use greengarden_api::{
    ChatResponse, Error, GameClient, LoadResponse, SaveResponse, StartGameResponse,
};

/// Anything that can answer the game's four requests.
#[async_trait]
pub trait GameBackend: Send + Sync + 'static {
    async fn start_game(&self) -> Result<StartGameResponse, Error>;

    async fn chat(&self, message: &str) -> Result<ChatResponse, Error>;

    async fn save(&self, slot: u32) -> Result<SaveResponse, Error>;

    async fn load(&self, slot: u32) -> Result<LoadResponse, Error>;
}

#[async_trait]
impl GameBackend for GameClient {
    async fn start_game(&self) -> Result<StartGameResponse, Error> {
        GameClient::start_game(self).await
    }

    async fn chat(&self, message: &str) -> Result<ChatResponse, Error> {
        GameClient::chat(self, message).await
    }

    async fn save(&self, slot: u32) -> Result<SaveResponse, Error> {
        GameClient::save(self, slot).await
    }

    async fn load(&self, slot: u32) -> Result<LoadResponse, Error> {
        GameClient::load(self, slot).await
    }
}
