//! Provider adapters implementing the solver gateway port

pub mod openai;

pub use openai::OpenAiGateway;
