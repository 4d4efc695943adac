//! Grammar and spelling seam
//!
//! The engine does not talk to any service itself. Callers hand it a
//! [`GrammarChecker`]; whatever happens inside, the engine only ever sees a
//! list of finding strings.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::GrammarError;

/// One problem reported by a grammar service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarMatch {
    pub message: String,
    #[serde(default)]
    pub replacements: Vec<String>,
}

impl GrammarMatch {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            replacements: Vec::new(),
        }
    }

    pub fn with_replacements(mut self, replacements: Vec<String>) -> Self {
        self.replacements = replacements;
        self
    }

    /// `message → Suggestion: a, b` or just `message`
    pub fn to_issue(&self) -> String {
        if self.replacements.is_empty() {
            self.message.clone()
        } else {
            format!(
                "{} → Suggestion: {}",
                self.message,
                self.replacements.join(", ")
            )
        }
    }
}

pub trait GrammarChecker: Send + Sync {
    fn check(&self, text: &str, language: &str) -> Result<Vec<GrammarMatch>, GrammarError>;
}

/// Checker that never reports anything, for offline runs
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledGrammar;

impl GrammarChecker for DisabledGrammar {
    fn check(&self, _text: &str, _language: &str) -> Result<Vec<GrammarMatch>, GrammarError> {
        Ok(Vec::new())
    }
}

/// Run the checker over the whole document text.
///
/// Blank text is not sent. A checker failure becomes a single finding.
pub fn check_grammar(checker: &dyn GrammarChecker, text: &str, language: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    match checker.check(text, language) {
        Ok(matches) => matches.iter().map(GrammarMatch::to_issue).collect(),
        Err(e) => {
            warn!("Grammar check failed: {}", e);
            vec![format!("Grammar/Spelling check failed: {}", e)]
        }
    }
}
