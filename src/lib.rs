// Newsmap: normalization of LLM-produced news annotations.
//
// This is the library root. Each module corresponds to one stage or
// concern of the normalization core.

pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod output;
pub mod persons;
pub mod pipeline;
pub mod topics;
