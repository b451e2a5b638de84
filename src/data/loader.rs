use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

use crate::models::Question;

/// Failure to produce a usable question bank.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0} must contain at least one question")]
    Empty(String),
    #[error("question {index} in {path} is invalid: {reason}")]
    InvalidQuestion {
        path: String,
        index: usize,
        reason: String,
    },
}

/// Load and validate the question bank from a JSON file.
pub fn load_questions_from_json<P: AsRef<Path>>(path: P) -> Result<Vec<Question>, LoadError> {
    let path = path.as_ref();
    let display = path.display().to_string();

    let json_content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: display.clone(),
        source,
    })?;

    parse_questions(&json_content, &display)
}

fn parse_questions(json_content: &str, origin: &str) -> Result<Vec<Question>, LoadError> {
    let questions: Vec<Question> =
        serde_json::from_str(json_content).map_err(|source| LoadError::Parse {
            path: origin.to_string(),
            source,
        })?;

    if questions.is_empty() {
        return Err(LoadError::Empty(origin.to_string()));
    }

    for (index, question) in questions.iter().enumerate() {
        question
            .validate()
            .map_err(|reason| LoadError::InvalidQuestion {
                path: origin.to_string(),
                index,
                reason,
            })?;
    }

    Ok(questions)
}

/// Bank used when no file is given on the command line.
pub fn default_questions() -> Vec<Question> {
    vec![
        Question::new("What is the capital of France?", &["London", "Paris", "Berlin"], 1),
        Question::new(
            "Which language runs natively in the browser?",
            &["Java", "C", "JavaScript"],
            2,
        ),
    ]
}
