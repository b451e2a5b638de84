use serde::{Deserialize, Serialize};

/// A single entry of the question bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

impl Question {
    pub fn new(text: impl Into<String>, options: &[&str], correct_index: usize) -> Self {
        Self {
            text: text.into(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_index,
        }
    }

    /// Checks the shape invariants of a question.
    ///
    /// Returns a human readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.text.trim().is_empty() {
            return Err("question text is empty".to_string());
        }
        if self.options.len() < 2 {
            return Err(format!(
                "question needs at least 2 options, found {}",
                self.options.len()
            ));
        }
        if self.correct_index >= self.options.len() {
            return Err(format!(
                "correct_index {} is out of range for {} options",
                self.correct_index,
                self.options.len()
            ));
        }
        Ok(())
    }

    pub fn is_correct(&self, answer: usize) -> bool {
        answer == self.correct_index
    }

    /// The client-facing view, without the correct index.
    pub fn view(&self) -> QuestionView {
        QuestionView {
            text: self.text.clone(),
            options: self.options.clone(),
        }
    }
}

/// What players get to see of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionView {
    pub text: String,
    pub options: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(Question::new("Q", &["a", "b"], 1).validate().is_ok());
        assert!(Question::new("Q", &["a"], 0).validate().is_err());
        assert!(Question::new("Q", &["a", "b"], 2).validate().is_err());
        assert!(Question::new("   ", &["a", "b"], 0).validate().is_err());
    }

    #[test]
    fn test_view_hides_correct_index() {
        let question = Question::new("Capital?", &["London", "Paris"], 1);
        let json = serde_json::to_string(&question.view()).unwrap();
        assert!(json.contains("Paris"));
        assert!(!json.contains("correct_index"));
    }
}
