mod loader;

pub use loader::{default_questions, load_questions_from_json, LoadError};
