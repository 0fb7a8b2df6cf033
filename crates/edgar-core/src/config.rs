use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{EdgarError, Result};

/// Top-level configuration for the Edgar responder.
///
/// Loaded from `~/.edgar/config.toml` by default. Each section corresponds
/// to one stage of the per-turn pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgarConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub streaming: StreamingConfig,
}

impl EdgarConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EdgarConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| EdgarError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding `<model>.json` files.
    pub models_dir: String,
    /// Model to load on startup. Empty selects the first available model.
    pub model: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            models_dir: "models".to_string(),
            model: String::new(),
            log_level: "info".to_string(),
        }
    }
}

/// Similarity tiers, auto-correction, and the answer confidence gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub exact_match: f32,
    pub high_confidence: f32,
    pub medium_confidence: f32,
    pub low_confidence: f32,
    /// Scores below this never count as a match.
    pub min_acceptable: f32,
    /// Minimum partial-ratio (0-100) for a correction candidate.
    pub correction_min_confidence: u8,
    /// Minimum partial-ratio (0-100) for a candidate to replace the input.
    pub correction_apply_threshold: u8,
    /// Require shared content words between input and candidate.
    pub correction_semantic_check: bool,
    /// Similarity above which input inside a tree counts as a topic change.
    pub topic_change_threshold: f32,
    /// Minimum confidence an answer must reach. 0.0 disables the gate.
    pub confidence_requirement: f32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            exact_match: 0.95,
            high_confidence: 0.75,
            medium_confidence: 0.60,
            low_confidence: 0.45,
            min_acceptable: 0.35,
            correction_min_confidence: 90,
            correction_apply_threshold: 92,
            correction_semantic_check: true,
            topic_change_threshold: 0.70,
            confidence_requirement: 0.0,
        }
    }
}

/// Router settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Whether the routing pre-pass runs at all.
    pub enabled: bool,
    /// Path to the routing JSON document.
    pub routing_file: String,
    /// Single dispatch threshold applied to every routing group.
    pub threshold: f32,
    /// Containment score (0-100) a phrase must reach to open the gate.
    pub containment_score: u8,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            routing_file: "routing.json".to_string(),
            threshold: 0.75,
            containment_score: 80,
        }
    }
}

/// Capacities of the bounded conversation memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    pub history_size: usize,
    pub previous_topics_size: usize,
    pub entities_size: usize,
    pub subjects_size: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            history_size: 6,
            previous_topics_size: 5,
            entities_size: 10,
            subjects_size: 3,
        }
    }
}

/// Paced output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Words per minute for answers. 0 delivers text in one piece.
    pub wpm: u32,
    /// Words per minute for metadata lines (match info, context).
    pub additional_info_wpm: u32,
    /// Emit one character at a time instead of one word.
    pub letter_mode: bool,
    /// When false, pacing is skipped regardless of `wpm`.
    pub speed_limit: bool,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            wpm: 300,
            additional_info_wpm: 600,
            letter_mode: false,
            speed_limit: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = EdgarConfig::default();
        assert_eq!(config.general.models_dir, "models");
        assert_eq!(config.general.log_level, "info");
        assert!((config.matching.exact_match - 0.95).abs() < f32::EPSILON);
        assert!((config.matching.min_acceptable - 0.35).abs() < f32::EPSILON);
        assert_eq!(config.matching.correction_min_confidence, 90);
        assert_eq!(config.matching.correction_apply_threshold, 92);
        assert_eq!(config.matching.confidence_requirement, 0.0);
        assert!(config.routing.enabled);
        assert!((config.routing.threshold - 0.75).abs() < f32::EPSILON);
        assert_eq!(config.context.history_size, 6);
        assert_eq!(config.context.entities_size, 10);
        assert_eq!(config.streaming.wpm, 300);
    }

    #[test]
    fn test_load_valid_config() {
        let file = create_temp_config(
            r#"
[general]
models_dir = "/srv/edgar/models"
model = "python"
log_level = "debug"

[matching]
confidence_requirement = 0.5

[routing]
enabled = false
threshold = 0.9

[streaming]
wpm = 0
letter_mode = true
"#,
        );
        let config = EdgarConfig::load(file.path()).unwrap();
        assert_eq!(config.general.models_dir, "/srv/edgar/models");
        assert_eq!(config.general.model, "python");
        assert!((config.matching.confidence_requirement - 0.5).abs() < f32::EPSILON);
        assert!(!config.routing.enabled);
        assert!((config.routing.threshold - 0.9).abs() < f32::EPSILON);
        assert_eq!(config.streaming.wpm, 0);
        assert!(config.streaming.letter_mode);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let file = create_temp_config("[general]\nmodel = \"games\"\n");
        let config = EdgarConfig::load(file.path()).unwrap();
        assert_eq!(config.general.model, "games");
        assert_eq!(config.general.models_dir, "models");
        assert_eq!(config.context.history_size, 6);
        assert_eq!(config.routing.containment_score, 80);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = EdgarConfig::load_or_default(Path::new("/does/not/exist/config.toml"));
        assert_eq!(config.general.models_dir, "models");
        assert!(config.routing.enabled);
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("this is [not valid toml");
        let err = EdgarConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, EdgarError::Config(_)));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = EdgarConfig::default();
        config.general.model = "science".to_string();
        config.matching.confidence_requirement = 0.8;
        config.streaming.letter_mode = true;
        config.save(&path).unwrap();

        let loaded = EdgarConfig::load(&path).unwrap();
        assert_eq!(loaded.general.model, "science");
        assert!((loaded.matching.confidence_requirement - 0.8).abs() < f32::EPSILON);
        assert!(loaded.streaming.letter_mode);
    }
}
