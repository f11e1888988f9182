//! Criterion loader - YAML/JSON definition loading
//!
//! This module handles loading criterion definitions from files.

use super::definition::CriterionDefinition;
use crate::telemetry::Result;
use std::fs;
use std::path::Path;
use uuid::Uuid;

/// Loads criterion definitions from YAML or JSON files
pub struct CriterionLoader;

impl CriterionLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a definition; `.json` files are read as JSON, everything else as YAML
    pub fn load_criterion<P: AsRef<Path>>(&self, path: P) -> Result<CriterionDefinition> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::parse_json(&content)
        } else {
            Self::parse_yaml(&content)
        }
    }

    /// Parse a definition from a YAML string
    pub fn parse_yaml(content: &str) -> Result<CriterionDefinition> {
        let def: CriterionDefinition = serde_yaml::from_str(content)?;
        Ok(Self::with_id(def))
    }

    /// Parse a definition from a JSON string
    pub fn parse_json(content: &str) -> Result<CriterionDefinition> {
        let def: CriterionDefinition = serde_json::from_str(content)?;
        Ok(Self::with_id(def))
    }

    fn with_id(mut def: CriterionDefinition) -> CriterionDefinition {
        if def.id.is_empty() {
            def.id = Uuid::new_v4().to_string();
            log::debug!("Assigned criterion id {}", def.id);
        }
        def
    }
}

impl Default for CriterionLoader {
    fn default() -> Self {
        Self::new()
    }
}
