mod chat;
mod parser;
mod rewriter;
mod tokens;

pub use chat::{ChatModel, ChatRequest, OpenAiChat};
pub use parser::parse_rewrite;
pub use rewriter::Rewriter;
pub use tokens::{Pricing, TokenAccountant};
