//! Brandline: voice-consistent marketing campaigns from one product description
//!
//! A three-stage LLM pipeline. The voice stage derives a brand voice card,
//! the assets stage writes emails, social posts and a landing page in that
//! voice, and the audit stage scores every asset for drift. Each stage is a
//! transition on an in-memory campaign session.

pub mod adapter;
pub mod cli;
pub mod config;
pub mod documents;
pub mod error;
pub mod extract;
pub mod logging;
pub mod pipeline;
pub mod prompt;
pub mod provider;
pub mod session;
pub mod types;
