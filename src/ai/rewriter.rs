use std::sync::Arc;

use crate::models::RewriteResult;

use super::chat::{ChatMessage, ChatModel, ChatRequest};
use super::tokens::TokenAccountant;

const SYSTEM_PROMPT: &str = "Respond with valid JSON only. No markdown or ``` formatting.";

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// The fixed rewrite instruction followed by the article text.
pub fn build_prompt(content: &str) -> String {
    format!(
        "Rewrite the following news article professionally. \
         Respond strictly in this JSON format:\n\n\
         {{\n  \"title\": \"<title within 64 characters>\",\n  \
         \"summary\": \"<summary within 348 characters>\",\n  \
         \"rewritten_article\": \"<professionally rewritten full article>\"\n}}\n\n\
         Original Article:\n{}",
        content
    )
}

/// Sends article text through the chat model and meters the exchange.
pub struct Rewriter {
    chat: Arc<dyn ChatModel>,
    accountant: TokenAccountant,
    temperature: f32,
}

impl Rewriter {
    pub fn new(chat: Arc<dyn ChatModel>, accountant: TokenAccountant) -> Self {
        Self {
            chat,
            accountant,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Never returns an error; a failed call comes back as
    /// [`RewriteResult::Failed`] with zeroed metrics.
    pub async fn rewrite(&self, content: &str) -> RewriteResult {
        let prompt = build_prompt(content);
        let input_tokens = self.accountant.count_tokens(&prompt);

        let request = ChatRequest {
            model: self.accountant.model().to_string(),
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)],
            temperature: self.temperature,
        };

        match self.chat.complete(&request).await {
            Ok(raw_text) => {
                let output_tokens = self.accountant.count_tokens(&raw_text);
                let cost = self.accountant.estimate_cost(input_tokens, output_tokens);
                tracing::debug!(input_tokens, output_tokens, cost, "rewrite completed");
                RewriteResult::Completed {
                    raw_text,
                    input_tokens,
                    output_tokens,
                    cost,
                }
            }
            Err(e) => RewriteResult::Failed {
                reason: format!("Error summarizing: {}", e),
            },
        }
    }
}
