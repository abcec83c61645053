//! Message model handed to the classifier

pub mod parser;
pub mod types;

pub use parser::parse_rfc822;
pub use types::{MessageView, MessageViewBuilder, GENERATED_ID_SUFFIX};
