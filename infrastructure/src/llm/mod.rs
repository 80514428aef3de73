//! Text-generation adapters implementing the
//! [`LlmGateway`](conclave_application::LlmGateway) port.

mod openai;

pub use openai::{OpenAiCompatibleGateway, OpenAiSettings};
