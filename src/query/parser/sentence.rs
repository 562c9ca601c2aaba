//! Parsed sentence trees.

use crate::expression::Expression;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceKind {
    Yield,
    Explain,
    Sequential,
}

/// One projected item of a YIELD sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct YieldItem {
    pub expr: Expression,
    pub alias: Option<String>,
}

impl YieldItem {
    /// Column name in the result set: the alias when given, otherwise the
    /// expression text itself.
    pub fn column_name(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => self.expr.text(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct YieldSentence {
    pub items: Vec<YieldItem>,
}

/// A parsed statement. EXPLAIN wraps another sentence; a sequential
/// sentence is an ordered list executed front to back.
#[derive(Debug, Clone, PartialEq)]
pub enum Sentence {
    Yield(YieldSentence),
    Explain {
        inner: Box<Sentence>,
        is_profile: bool,
    },
    Sequential(Vec<Sentence>),
}

impl Sentence {
    pub fn kind(&self) -> SentenceKind {
        match self {
            Sentence::Yield(_) => SentenceKind::Yield,
            Sentence::Explain { .. } => SentenceKind::Explain,
            Sentence::Sequential(_) => SentenceKind::Sequential,
        }
    }

    pub fn is_explain(&self) -> bool {
        matches!(self, Sentence::Explain { .. })
    }

    pub fn is_profile(&self) -> bool {
        matches!(
            self,
            Sentence::Explain {
                is_profile: true,
                ..
            }
        )
    }

    /// Number of sub-sentences of a sequential sentence; 1 otherwise.
    pub fn num_sentences(&self) -> usize {
        match self {
            Sentence::Sequential(sentences) => sentences.len(),
            _ => 1,
        }
    }
}
