//! Natural-language search intent classification backed by the Anthropic
//! Messages API.

mod client;
pub mod error;
mod extract;
mod prompt;

pub use client::ClassifierClient;
pub use error::ClassifierError;
