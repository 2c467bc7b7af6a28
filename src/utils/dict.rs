//! Description file loading and the label dictionary.
//!
//! A descriptions file holds one `"<text>,<label>"` entry per line,
//! e.g. `"red and ripe,ripe"`. Labels receive integer ids in first-seen
//! order; the resulting dictionary is frozen for the rest of the run.

use crate::core::{SegError, SegResult};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

/// Mapping from textual label to a stable non-negative integer id.
///
/// Append-only during construction, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct LabelDictionary {
    ids: HashMap<String, usize>,
    order: Vec<String>,
}

impl LabelDictionary {
    /// Returns the id for a label, if present.
    pub fn id(&self, label: &str) -> Option<usize> {
        self.ids.get(label).copied()
    }

    /// Number of distinct labels.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Labels in id order.
    pub fn labels(&self) -> &[String] {
        &self.order
    }

    fn insert(&mut self, label: &str) {
        if !self.ids.contains_key(label) {
            self.ids.insert(label.to_string(), self.order.len());
            self.order.push(label.to_string());
        }
    }
}

/// The parsed contents of a descriptions file: candidate texts, their
/// labels (parallel vectors), and the frozen label dictionary.
#[derive(Debug, Clone, Default)]
pub struct DescriptionSet {
    pub texts: Vec<String>,
    pub labels: Vec<String>,
    pub dictionary: LabelDictionary,
}

impl DescriptionSet {
    /// Builds a description set from (text, label) pairs, assigning
    /// label ids in first-seen order.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut set = DescriptionSet::default();
        for (text, label) in pairs {
            set.dictionary.insert(&label);
            set.texts.push(text);
            set.labels.push(label);
        }
        set
    }

    /// Reads a descriptions file.
    ///
    /// Lines that do not contain exactly two comma-separated fields are
    /// skipped with a warning; they are never fatal.
    pub fn read_from_file(path: &Path) -> SegResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SegError::ConfigError {
            message: format!(
                "failed to read descriptions from '{}': {}",
                path.display(),
                e
            ),
        })?;

        let mut pairs = Vec::new();
        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let fields: Vec<&str> = trimmed.split(',').collect();
            if fields.len() == 2 {
                pairs.push((fields[0].trim().to_string(), fields[1].trim().to_string()));
            } else {
                warn!("skipping malformed description line: {line}");
            }
        }
        Ok(Self::from_pairs(pairs))
    }
}
