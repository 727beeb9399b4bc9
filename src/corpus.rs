use crate::error::KfResult;
use crate::util::calculate_file_hash;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// A text corpus addressed by id. The text is consumed left to right as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub id: String,
    pub text: String,
}

impl Dataset {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    /// Loads a UTF-8 file. The id is the SHA-256 of its contents.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> KfResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let id = calculate_file_hash(path)?;
        info!(
            "📚 Loaded corpus {} ({} chars, id {})",
            path.display(),
            text.chars().count(),
            &id[..12]
        );
        Ok(Self { id, text })
    }
}

/// Resolves dataset ids carried by evaluation jobs.
#[derive(Debug, Clone, Default)]
pub struct DatasetRegistry {
    datasets: HashMap<String, Arc<Dataset>>,
}

impl DatasetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(dataset: Dataset) -> Self {
        let mut registry = Self::new();
        registry.insert(dataset);
        registry
    }

    /// Registers a dataset, replacing any previous one with the same id.
    pub fn insert(&mut self, dataset: Dataset) -> Arc<Dataset> {
        let dataset = Arc::new(dataset);
        self.datasets.insert(dataset.id.clone(), dataset.clone());
        dataset
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Dataset>> {
        self.datasets.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_dataset_id_is_content_hash() {
        let mut a = tempfile::NamedTempFile::new().unwrap();
        let mut b = tempfile::NamedTempFile::new().unwrap();
        write!(a, "the quick brown fox").unwrap();
        write!(b, "the quick brown fox").unwrap();

        let da = Dataset::load_from_file(a.path()).unwrap();
        let db = Dataset::load_from_file(b.path()).unwrap();
        assert_eq!(da.id, db.id);
        assert_eq!(da.text, "the quick brown fox");
    }

    #[test]
    fn registry_lookup() {
        let reg = DatasetRegistry::with(Dataset::new("en", "hello"));
        assert_eq!(reg.get("en").map(|d| d.text.as_str()), Some("hello"));
        assert!(reg.get("de").is_none());
    }
}
