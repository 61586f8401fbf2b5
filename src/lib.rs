//! Call Explorer — maps a voice agent's call flow by placing test calls
//! until its decision tree has no unknown branches left.

pub mod artifacts;
pub mod config;
pub mod error;
pub mod explorer;
pub mod llm;
pub mod prompts;
pub mod telephony;
pub mod transcribe;
pub mod tree;
