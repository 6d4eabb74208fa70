pub mod deepseek;
pub mod traits;

pub use traits::{ChatCompletion, ChatMessage, EmbeddingProvider, GenerationParams, LlmError, Role};
