//! Analyzer configuration.
//!
//! Read from an optional JSON file (camelCase keys, every field defaulted).
//! CLI flags are applied on top by the binary.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerConfig {
    /// The analyzed user's name as it appears in the FROM column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_identity: Option<String>,
    /// Number of template clusters kept in the ranking.
    #[serde(default = "default_top_templates")]
    pub top_templates: usize,
    /// Normalized Levenshtein similarity at which template keys merge.
    /// `None` clusters on exact normalized equality only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_similarity: Option<f64>,
    /// Number of replied conversation starters kept in the best-starter list.
    #[serde(default = "default_best_starters")]
    pub best_starters: usize,
    /// Clusters smaller than this are left out of the ranking.
    #[serde(default = "default_min_template_size")]
    pub min_template_size: usize,
    /// Replies within this many hours count as quick.
    #[serde(default = "default_quick_response_hours")]
    pub quick_response_hours: f64,
    /// Custom sales rules file; the embedded rules are used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules_path: Option<PathBuf>,
}

fn default_top_templates() -> usize {
    10
}

fn default_best_starters() -> usize {
    10
}

fn default_min_template_size() -> usize {
    1
}

fn default_quick_response_hours() -> f64 {
    24.0
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        AnalyzerConfig {
            self_identity: None,
            top_templates: default_top_templates(),
            template_similarity: None,
            best_starters: default_best_starters(),
            min_template_size: default_min_template_size(),
            quick_response_hours: default_quick_response_hours(),
            rules_path: None,
        }
    }
}

impl AnalyzerConfig {
    /// Config with only the self-identity set.
    pub fn for_identity(identity: impl Into<String>) -> Self {
        AnalyzerConfig {
            self_identity: Some(identity.into()),
            ..Default::default()
        }
    }
}

/// Read and validate a config file.
pub fn load_config(path: &Path) -> Result<AnalyzerConfig, AnalysisError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| AnalysisError::Config(format!("Failed to read config {}: {}", path.display(), e)))?;
    let config: AnalyzerConfig = serde_json::from_str(&content)
        .map_err(|e| AnalysisError::Config(format!("Failed to parse config: {}", e)))?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &AnalyzerConfig) -> Result<(), AnalysisError> {
    if config.top_templates == 0 {
        return Err(AnalysisError::Config("topTemplates must be at least 1".into()));
    }
    if let Some(threshold) = config.template_similarity {
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(AnalysisError::Config(format!(
                "templateSimilarity must be within (0, 1], got {}",
                threshold
            )));
        }
    }
    if !(config.quick_response_hours > 0.0) {
        return Err(AnalysisError::Config(format!(
            "quickResponseHours must be positive, got {}",
            config.quick_response_hours
        )));
    }
    if let Some(identity) = &config.self_identity {
        if identity.trim().is_empty() {
            return Err(AnalysisError::Config("selfIdentity must not be blank".into()));
        }
    }
    Ok(())
}
