pub mod ai_client;
pub mod allocator;
pub mod assembler;
pub mod catalog;
pub mod config;
pub mod document;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod selector;
pub mod state;

use ai_client::{AiQuizClient, ChatCompletionClient, MockAiClient};
use catalog::TopicCatalog;
use config::{AppConfig, ChatClientConfig};
use std::sync::Arc;
use tracing::{info, warn};

pub fn quiz_schema() -> anyhow::Result<serde_json::Value> {
    let schema_raw = include_str!("../contracts/quiz_items.schema.json");
    Ok(serde_json::from_str(schema_raw)?)
}

pub fn build_state(config: AppConfig) -> anyhow::Result<state::AppState> {
    let catalog = match config.topic_catalog_path.as_deref() {
        Some(path) => TopicCatalog::from_json_file(path)?,
        None => TopicCatalog::tax_curriculum(),
    };
    info!("topic catalog has {} topics", catalog.topics().len());

    let document = document::load_document(&config.document_path)?;

    let ai_client: Arc<dyn AiQuizClient> = match ChatClientConfig::from_env() {
        Some(chat) => {
            let client = ChatCompletionClient::new(chat, config.max_context_chars)?;
            info!("using chat completion model {}", client.model());
            Arc::new(client)
        }
        None => {
            warn!("GROQ_API_KEY is not set, questions come from the offline mock client");
            Arc::new(MockAiClient)
        }
    };

    Ok(state::AppState::new(config, catalog, document, ai_client, quiz_schema()?))
}
