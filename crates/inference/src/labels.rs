use crate::errors::ModelLoadError;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Class names, index-aligned with a network's output vector.
///
/// Cloning is cheap; every clone shares the same immutable storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
    labels: Arc<[String]>,
}

impl LabelTable {
    /// Read one label per line. Surrounding whitespace is trimmed and blank
    /// lines are skipped.
    pub fn from_file(path: &Path) -> Result<Self, ModelLoadError> {
        if !path.exists() {
            return Err(ModelLoadError::MissingArtifact(path.to_path_buf()));
        }

        let contents =
            fs::read_to_string(path).map_err(|source| ModelLoadError::LabelsUnreadable {
                path: path.to_path_buf(),
                source,
            })?;

        let table = Self::from_lines(contents.lines());
        if table.is_empty() {
            return Err(ModelLoadError::EmptyLabelTable(path.to_path_buf()));
        }

        tracing::debug!(path = %path.display(), labels = table.len(), "Label table loaded");
        Ok(table)
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let labels: Vec<String> = lines
            .into_iter()
            .map(|line| line.as_ref().trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();

        Self {
            labels: labels.into(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}
