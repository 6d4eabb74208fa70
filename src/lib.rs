pub mod api;
pub mod chatbot;
pub mod config;
pub mod knowledge;
pub mod llm;
pub mod providers;

// Re-export commonly used items
pub use chatbot::{AnswerSource, ChatReply, Language};
pub use knowledge::{ContextSource, RetrievedContext};
