//! Turns free-form agent responses into structured actions

use crate::action::{OPEN_FILE, SEARCH, UNKNOWN};
use agentguard_core::{ActionRequest, Error, Result};
use regex::Regex;

/// Extracts an [`ActionRequest`] from an agent's response.
///
/// Search intents are tried first, then file opens. Anything else yields an
/// action of kind `unknown`.
#[derive(Debug, Clone)]
pub struct ActionExtractor {
    search: Regex,
    open_file: Regex,
}

impl ActionExtractor {
    /// Compile the extraction patterns
    pub fn new() -> Result<Self> {
        let search = Regex::new(r"\b(?:search|open browser)(?: for)? (.+)")
            .map_err(|e| Error::internal(format!("search pattern: {}", e)))?;
        let open_file = Regex::new(r"\bopen (?:the )?file (.+)")
            .map_err(|e| Error::internal(format!("open_file pattern: {}", e)))?;
        Ok(Self { search, open_file })
    }

    /// Extract the action expressed by `response`
    pub fn extract(&self, response: &str) -> ActionRequest {
        // Lowercase only: line breaks still end a query or filename.
        let response = response.to_lowercase();

        if let Some(query) = capture(&self.search, &response) {
            return ActionRequest::new(SEARCH).with_param("query", query);
        }

        if let Some(filename) = capture(&self.open_file, &response) {
            let filename = filename.trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c.is_whitespace());
            if !filename.is_empty() {
                return ActionRequest::new(OPEN_FILE).with_param("filename", filename);
            }
        }

        ActionRequest::new(UNKNOWN)
    }
}

fn capture<'a>(pattern: &Regex, text: &'a str) -> Option<&'a str> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
}
