pub mod config;
pub mod error;
pub mod llm;
pub mod orchestration;
pub mod server;
pub mod tools;
