//! Outcome of an import run.

use serde::{Deserialize, Serialize};

use crate::enums::Severity;

/// A message tied to one source item. Item 0 denotes a session-level message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportMessage {
    pub text: String,
    pub severity: Severity,
    pub item_number: u32,
}

impl ImportMessage {
    pub fn error(text: impl Into<String>, item_number: u32) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Error,
            item_number,
        }
    }
}

/// Counts and messages produced by one import run.
///
/// Built once when the run ends and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    pub created: u32,
    pub updated: u32,
    pub ignored: u32,
    pub messages: Vec<ImportMessage>,
}

impl ImportResult {
    #[must_use]
    pub const fn new(created: u32, updated: u32, ignored: u32, messages: Vec<ImportMessage>) -> Self {
        Self {
            created,
            updated,
            ignored,
            messages,
        }
    }

    /// A run that failed before processing any row.
    pub fn failed(text: impl Into<String>) -> Self {
        Self {
            messages: vec![ImportMessage::error(text, 0)],
            ..Self::default()
        }
    }

    /// Number of rows the run touched in any way.
    #[must_use]
    pub const fn processed(&self) -> u32 {
        self.created + self.updated + self.ignored
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|message| message.severity == Severity::Error)
            .count()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn failed_result_has_single_session_message() {
        let result = ImportResult::failed("column 'foo' not found");
        assert_eq!(result.processed(), 0);
        assert_eq!(
            result.messages,
            vec![ImportMessage {
                text: "column 'foo' not found".to_string(),
                severity: Severity::Error,
                item_number: 0,
            }]
        );
        assert!(result.has_errors());
    }

    #[test]
    fn processed_sums_all_counts() {
        let result = ImportResult::new(3, 2, 1, Vec::new());
        assert_eq!(result.processed(), 6);
        assert!(!result.has_errors());
    }
}
