use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingError {
    #[error("malformed mapping line {line}: {content:?} (expected key:value)")]
    MalformedLine { line: usize, content: String },
}

/// Immutable lookup from short team/city codes to canonical opponent names,
/// loaded from `key:value` lines.
#[derive(Debug, Clone, Default)]
pub struct TeamMapping {
    entries: HashMap<String, String>,
}

impl TeamMapping {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read team mapping {}", path.display()))?;
        let mapping =
            Self::parse(&raw).with_context(|| format!("parse team mapping {}", path.display()))?;
        Ok(mapping)
    }

    /// Splits each non-blank line on its first colon. Keys and values are trimmed.
    pub fn parse(raw: &str) -> Result<Self, MappingError> {
        let mut entries = HashMap::new();
        for (idx, line) in raw.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let Some((key, value)) = trimmed.split_once(':') else {
                return Err(MappingError::MalformedLine {
                    line: idx + 1,
                    content: line.to_string(),
                });
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(MappingError::MalformedLine {
                    line: idx + 1,
                    content: line.to_string(),
                });
            }
            if let Some(prev) = entries.insert(key.to_string(), value.trim().to_string()) {
                warn!(key, previous = %prev, line = idx + 1, "duplicate mapping key, last value wins");
            }
        }
        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
