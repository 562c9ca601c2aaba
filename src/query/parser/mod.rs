pub mod parser;
pub mod sentence;

pub use parser::GQLParser;
pub use sentence::{Sentence, SentenceKind, YieldItem, YieldSentence};
