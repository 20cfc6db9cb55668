//! The text-generation boundary and the prompts sent through it.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{RecommendError, RecommendRole, Result};

/// Something that turns a prompt into text.
///
/// Implementations own transport, credentials and model choice.
#[async_trait]
pub trait RecommendationGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Wraps a context in the instructions for `role`.
pub fn build_prompt(role: RecommendRole, context: &str) -> String {
    match role {
        RecommendRole::Client => format!(
            "You are a shopping assistant for an inventory and e-commerce store.\n\
             \n\
             Using the customer's purchase history and the product catalog below, suggest 3 to 5 items.\n\
             - Suggest buying again anything they purchased before that is back in stock.\n\
             - Prefer items in the same categories as past purchases, or items that complement them.\n\
             - Never suggest an item that is out of stock.\n\
             - With no purchase history, suggest popular or good-value items.\n\
             - Give a short reason for each suggestion.\n\
             \n\
             {context}\n\
             \n\
             Answer with a JSON array only. Each element has:\n\
             - \"item_name\": string, the exact catalog name\n\
             - \"item_id\": string, the catalog id\n\
             - \"reason\": string, one or two sentences\n\
             - \"price\": number"
        ),
        RecommendRole::Owner => format!(
            "You are a business analyst for the owner of an inventory store.\n\
             \n\
             Using the sales figures and stock levels below, give 5 to 8 recommendations of two kinds.\n\
             \n\
             Restock: items that sell well and are out of stock, low on stock, or low relative to demand.\n\
             \n\
             New products: specific products the store does not carry yet that would likely sell, \
             based on the best-selling categories and items and their complementary products.\n\
             \n\
             {context}\n\
             \n\
             Answer with a JSON array only. Each element has:\n\
             - \"item_name\": string, an existing item or a new product\n\
             - \"reason\": string, two or three sentences citing figures where possible\n\
             - \"priority\": \"high\" | \"medium\" | \"low\"\n\
             - \"current_stock\": number | null, null for new products\n\
             - \"type\": \"restock\" | \"new_product\""
        ),
    }
}

#[derive(Debug, Default)]
struct StaticState {
    fail_with: Option<String>,
    prompts: Vec<String>,
}

/// Generator that answers every prompt with a fixed reply.
///
/// Used when no external service is configured, and in tests. Remembers
/// the prompts it received and can be told to fail.
#[derive(Debug, Clone)]
pub struct StaticGenerator {
    reply: Arc<RwLock<String>>,
    state: Arc<RwLock<StaticState>>,
}

impl StaticGenerator {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: Arc::new(RwLock::new(reply.into())),
            state: Arc::default(),
        }
    }

    /// A generator that always answers with an empty list.
    pub fn empty() -> Self {
        Self::new("[]")
    }

    pub async fn set_reply(&self, reply: impl Into<String>) {
        *self.reply.write().await = reply.into();
    }

    /// Makes every following call fail with `message`, or succeed again with `None`.
    pub async fn set_failure(&self, message: Option<String>) {
        self.state.write().await.fail_with = message;
    }

    pub async fn last_prompt(&self) -> Option<String> {
        self.state.read().await.prompts.last().cloned()
    }

    pub async fn call_count(&self) -> usize {
        self.state.read().await.prompts.len()
    }
}

impl Default for StaticGenerator {
    fn default() -> Self {
        Self::empty()
    }
}

#[async_trait]
impl RecommendationGenerator for StaticGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let mut state = self.state.write().await;
        state.prompts.push(prompt.to_string());

        if let Some(message) = &state.fail_with {
            return Err(RecommendError::ExternalService(message.clone()));
        }

        Ok(self.reply.read().await.clone())
    }
}
