use serde::{Deserialize, Serialize};

/// An extraction error: I/O, lexing, parsing, or an internal walk failure.
/// One error aborts the whole extraction request for that file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractError {
    pub file: String,
    pub line: u32,
    pub message: String,
}

impl ExtractError {
    pub fn new(file: &str, line: u32, message: impl Into<String>) -> Self {
        ExtractError {
            file: file.to_owned(),
            line,
            message: message.into(),
        }
    }

    pub fn io(file: &str, message: impl Into<String>) -> Self {
        ExtractError::new(file, 0, message)
    }

    pub fn lex(file: &str, line: u32, message: impl Into<String>) -> Self {
        ExtractError::new(file, line, message)
    }

    pub fn parse(file: &str, line: u32, message: impl Into<String>) -> Self {
        ExtractError::new(file, line, message)
    }

    /// An internal invariant violated while walking a syntactically valid tree.
    pub fn visit(file: &str, message: impl Into<String>) -> Self {
        ExtractError::new(file, 0, message)
    }

    /// Serialize to a JSON object with all fields present.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "file":    self.file,
            "line":    self.line,
            "message": self.message,
        })
    }
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.line == 0 {
            write!(f, "{}: {}", self.file, self.message)
        } else {
            write!(f, "{}:{}: {}", self.file, self.line, self.message)
        }
    }
}

impl std::error::Error for ExtractError {}
