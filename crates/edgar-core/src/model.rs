//! Model and routing document persistence.
//!
//! A model is a `<name>.json` file inside the models directory. Loading
//! failures are recoverable: the `*_or_default` helpers log and return an
//! empty document so the engine keeps answering in a degraded state.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{EdgarError, Result};
use crate::types::{ModelFile, QuestionGroup, RoutingFile};

/// Directory-backed store of model files.
#[derive(Debug, Clone)]
pub struct ModelStore {
    models_dir: PathBuf,
}

impl ModelStore {
    /// Create a store rooted at `models_dir`. The directory need not exist.
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
        }
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Path of the file backing model `name`.
    pub fn model_path(&self, name: &str) -> PathBuf {
        self.models_dir.join(format!("{}.json", name))
    }

    /// Sorted names of every `*.json` file in the models directory.
    pub fn available_models(&self) -> Vec<String> {
        let entries = match std::fs::read_dir(&self.models_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    dir = %self.models_dir.display(),
                    error = %e,
                    "Models directory unavailable"
                );
                return Vec::new();
            }
        };

        let mut models: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().to_string()))
            .collect();
        models.sort();
        models
    }

    /// Load the question groups of model `name`.
    pub fn load(&self, name: &str) -> Result<Vec<QuestionGroup>> {
        let path = self.model_path(name);
        if !path.exists() {
            return Err(EdgarError::ModelNotFound(name.to_string()));
        }
        let content = std::fs::read_to_string(&path)?;
        let model: ModelFile = serde_json::from_str(&content)
            .map_err(|e| EdgarError::ModelLoad(format!("{}: {}", path.display(), e)))?;
        info!(
            model = name,
            groups = model.qa_groups.len(),
            "Loaded QA groups"
        );
        Ok(model.qa_groups)
    }

    /// Load model `name`, substituting an empty group list on any failure.
    pub fn load_or_empty(&self, name: &str) -> Vec<QuestionGroup> {
        match self.load(name) {
            Ok(groups) => groups,
            Err(e) => {
                warn!(model = name, error = %e, "Model load failed, continuing with no answers");
                Vec::new()
            }
        }
    }

    /// Write `groups` as model `name`, creating the directory if needed.
    pub fn save(&self, name: &str, groups: &[QuestionGroup]) -> Result<()> {
        std::fs::create_dir_all(&self.models_dir)?;
        let model = ModelFile {
            qa_groups: groups.to_vec(),
        };
        let content = serde_json::to_string_pretty(&model)?;
        let path = self.model_path(name);
        std::fs::write(&path, content)?;
        info!(model = name, path = %path.display(), "Model saved");
        Ok(())
    }
}

impl RoutingFile {
    /// Load a routing document from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: RoutingFile = serde_json::from_str(&content)
            .map_err(|e| EdgarError::Routing(format!("{}: {}", path.display(), e)))?;
        info!(
            path = %path.display(),
            groups = file.routing_groups.len(),
            "Routing config loaded"
        );
        Ok(file)
    }

    /// Load a routing document, falling back to an empty one (no routing).
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(file) => file,
            Err(e) => {
                warn!(
                    "Failed to load routing config from {}: {}. Routing disabled.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the routing document as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
