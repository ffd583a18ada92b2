//! Action allow-list and parameter policy

use aho_corasick::AhoCorasick;
use agentguard_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Web search; `query` is moderated as text
pub const SEARCH: &str = "search";
/// Open a file; `filename` must be whitelisted
pub const OPEN_FILE: &str = "open_file";
/// Stop the agent; no parameters
pub const SHUTDOWN: &str = "shutdown";
/// No recognizable action
pub const UNKNOWN: &str = "unknown";

/// Action policy as written in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionPolicyConfig {
    /// Closed set of action kinds an agent may request
    #[serde(default = "default_allowed_kinds")]
    pub allowed_kinds: BTreeSet<String>,

    /// Policy for the `open_file` action
    #[serde(default)]
    pub files: FileParamPolicy,
}

impl Default for ActionPolicyConfig {
    fn default() -> Self {
        Self {
            allowed_kinds: default_allowed_kinds(),
            files: FileParamPolicy::default(),
        }
    }
}

/// Filename rules for `open_file`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileParamPolicy {
    /// Exact names that may be opened
    #[serde(default = "default_allowed_filenames")]
    pub allowed_filenames: BTreeSet<String>,

    /// Substrings that mark a filename as a path traversal attempt
    #[serde(default = "default_path_tokens")]
    pub disallowed_path_tokens: Vec<String>,
}

impl Default for FileParamPolicy {
    fn default() -> Self {
        Self {
            allowed_filenames: default_allowed_filenames(),
            disallowed_path_tokens: default_path_tokens(),
        }
    }
}

fn default_allowed_kinds() -> BTreeSet<String> {
    [SEARCH, OPEN_FILE, SHUTDOWN, UNKNOWN]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_allowed_filenames() -> BTreeSet<String> {
    ["example.txt", "document.txt", "notes.txt"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_path_tokens() -> Vec<String> {
    ["..", "/", "\\", ":"].iter().map(|s| s.to_string()).collect()
}

/// Compiled action policy
#[derive(Debug, Clone)]
pub struct ActionPolicy {
    allowed_kinds: BTreeSet<String>,
    allowed_filenames: BTreeSet<String>,
    path_tokens: AhoCorasick,
}

impl ActionPolicy {
    /// Compile a policy.
    ///
    /// Empty path tokens are rejected since they would match every filename.
    pub fn new(config: ActionPolicyConfig) -> Result<Self> {
        if config.files.disallowed_path_tokens.iter().any(String::is_empty) {
            return Err(Error::policy("disallowed_path_tokens must not contain empty strings"));
        }

        let path_tokens = AhoCorasick::new(&config.files.disallowed_path_tokens)
            .map_err(|e| Error::policy(format!("invalid path tokens: {}", e)))?;

        Ok(Self {
            allowed_kinds: config.allowed_kinds,
            allowed_filenames: config.files.allowed_filenames,
            path_tokens,
        })
    }

    /// Whether `kind` is on the allow-list (case-sensitive)
    pub fn is_allowed_kind(&self, kind: &str) -> bool {
        self.allowed_kinds.contains(kind)
    }

    /// Whether `filename` contains a path separator or traversal token
    pub fn has_path_token(&self, filename: &str) -> bool {
        self.path_tokens.is_match(filename)
    }

    /// Whether `filename` is whitelisted
    pub fn is_allowed_filename(&self, filename: &str) -> bool {
        self.allowed_filenames.contains(filename)
    }

    /// Allowed action kinds
    pub fn allowed_kinds(&self) -> &BTreeSet<String> {
        &self.allowed_kinds
    }
}
