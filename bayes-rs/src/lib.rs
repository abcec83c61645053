//! bayes-rs: Bayesian spam classifier
//!
//! Learns which tokens of a message point to spam or ham and scores new
//! messages with Robinson/Fisher chi-square combining.
//!
//! # Features
//!
//! - **Tokenizer**: body, URI and header tokens hashed to 40-bit ids
//! - **Learning**: idempotent learn/forget with relearning between classes
//! - **Scoring**: smoothed per-token probabilities, chi-square or naive Bayes
//! - **Storage**: pluggable [`store::TokenStore`], in-memory store with JSON
//!   snapshots
//!
//! # Example
//!
//! ```no_run
//! use bayes_rs::config::Config;
//! use bayes_rs::message::parse_rfc822;
//! use bayes_rs::spam::BayesClassifier;
//! use bayes_rs::store::MemoryStore;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let store = MemoryStore::open("bayes.json")?;
//!     let mut classifier = BayesClassifier::new(config.bayes, store)?;
//!
//!     let spam = parse_rfc822(&std::fs::read("spam.eml")?)?;
//!     classifier.learn(&spam, true)?;
//!
//!     let message = parse_rfc822(&std::fs::read("new.eml")?)?;
//!     if let Some(score) = classifier.scan(&message)?.score() {
//!         println!("spam probability {:.3}", score);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration management
//! - [`error`]: Error types and handling
//! - [`message`]: Message view handed to the classifier
//! - [`tokenizer`]: Message tokenization
//! - [`store`]: Token storage
//! - [`spam`]: Learning, scoring and reporting

pub mod config;
pub mod error;
pub mod message;
pub mod spam;
pub mod store;
pub mod tokenizer;

// Re-export commonly used types
pub use config::Config;
pub use error::{BayesError, Result};
pub use message::MessageView;
pub use spam::{BayesClassifier, ScanOutcome};
