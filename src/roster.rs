use std::path::Path;

use anyhow::{Context, Result, anyhow};

/// One franchise as the two source sites know it: the site code used in
/// stats URLs and the display name used for file names and penalty URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamEntry {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct TeamRoster {
    entries: Vec<TeamEntry>,
}

impl TeamRoster {
    pub fn load(names_path: &Path, codes_path: &Path) -> Result<Self> {
        let names = read_list(names_path)?;
        let codes = read_list(codes_path)?;
        Self::pair(names, codes).with_context(|| {
            format!(
                "pair {} with {}",
                names_path.display(),
                codes_path.display()
            )
        })
    }

    /// Pairs two line lists by position. Both lists must be the same length.
    pub fn pair(names: Vec<String>, codes: Vec<String>) -> Result<Self> {
        if names.len() != codes.len() {
            return Err(anyhow!(
                "team name list has {} entries but code list has {}",
                names.len(),
                codes.len()
            ));
        }
        let entries = codes
            .into_iter()
            .zip(names)
            .map(|(code, name)| TeamEntry { code, name })
            .collect();
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[TeamEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reads a newline-delimited list, skipping blank lines.
pub fn read_list(path: &Path) -> Result<Vec<String>> {
    let raw =
        std::fs::read_to_string(path).with_context(|| format!("read list {}", path.display()))?;
    Ok(parse_list(&raw))
}

pub fn parse_list(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
