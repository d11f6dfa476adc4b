//! Prompt construction for the ensemble flow

mod template;

pub use template::PromptTemplate;
