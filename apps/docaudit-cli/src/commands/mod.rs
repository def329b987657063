//! CLI command implementations

pub mod audit;
pub mod chat;
pub mod config;
pub mod parse;
pub mod query;
pub mod summarize;
pub mod upload;
