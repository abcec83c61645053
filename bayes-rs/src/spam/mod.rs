//! Bayesian spam classification
//!
//! Learns token statistics from messages marked as spam or ham and scores
//! new messages against them:
//! - [`classifier`]: learning and forgetting messages
//! - [`scanner`]: scoring a message
//! - [`probability`]: per-token spam probability
//! - [`combiner`]: chi-square and naive Bayes combining
//! - [`distance`]: declassification distance of a token
//! - [`ignore`]: sender and recipient ignore lists
//! - [`report`]: token lists and score buckets

pub mod classifier;
pub mod combiner;
pub mod distance;
pub mod ignore;
pub mod probability;
pub mod report;
pub mod scanner;
pub mod types;

pub use classifier::{clamp_atime, BayesClassifier};
pub use combiner::Combiner;
pub use distance::declassification_distance;
pub use ignore::{AddressPattern, IgnorePolicy};
pub use probability::ProbabilityModel;
pub use report::{bayes_rules, check_bayes, render_token_list, ListFormat};
pub use types::*;
