//! Core types, collaborator traits, and configuration for DocAudit

pub mod collaborators;
pub mod config;
pub mod error;
pub mod types;

pub use crate::collaborators::*;
pub use crate::config::*;
pub use crate::error::*;
pub use crate::types::*;
