use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::pool::DEFAULT_CONCURRENCY;

/// Top-level project configuration loaded from `.oavg.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OavgConfig {
    pub input: String,
    pub output: String,
    pub naming: NamingConfig,
    /// Worker threads used for per-operation analysis and emission.
    pub concurrency: usize,
    pub emit: EmitOptions,
}

impl Default for OavgConfig {
    fn default() -> Self {
        Self {
            input: "openapi.yaml".to_string(),
            output: "src/generated".to_string(),
            naming: NamingConfig::default(),
            concurrency: DEFAULT_CONCURRENCY,
            emit: EmitOptions::default(),
        }
    }
}

/// Naming strategy and aliases.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    pub strategy: NamingStrategy,
    /// Map from resolved operation name (operationId or route-derived) to custom alias.
    pub aliases: IndexMap<String, String>,
}

/// How operation names are derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategy {
    /// Every operation must carry an `operationId`.
    #[default]
    UseOperationId,
    /// Ignore `operationId` and derive names from method + path.
    UseRouteBased,
    /// Use `operationId` when present, otherwise derive from method + path.
    UseOperationIdOrRoute,
}

/// Output options for the emitter.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmitOptions {
    /// Generate the `index.ts` barrel.
    pub index: bool,
    /// Emit JSDoc blocks from summaries and descriptions.
    pub jsdoc: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            index: true,
            jsdoc: true,
        }
    }
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".oavg.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<OavgConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let config: OavgConfig =
        serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# oavg configuration
input: openapi.yaml
output: src/generated

naming:
  strategy: use_operation_id  # use_operation_id | use_route_based | use_operation_id_or_route
  aliases: {}
    # getPetById: fetchPet       # operationId → custom name

# worker threads for per-operation analysis and emission
concurrency: 8

emit:
  index: true     # generate index.ts barrel exports
  jsdoc: true     # copy summaries/descriptions into JSDoc blocks
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OavgConfig::default();
        assert_eq!(config.input, "openapi.yaml");
        assert_eq!(config.output, "src/generated");
        assert_eq!(config.naming.strategy, NamingStrategy::UseOperationId);
        assert!(config.naming.aliases.is_empty());
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
        assert!(config.emit.index);
        assert!(config.emit.jsdoc);
    }

    #[test]
    fn test_parse_config_yaml() {
        let yaml = r#"
input: spec.yaml
output: out
naming:
  strategy: use_operation_id_or_route
  aliases:
    getPetById: fetchPet
concurrency: 2
emit:
  index: false
  jsdoc: false
"#;
        let config: OavgConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.input, "spec.yaml");
        assert_eq!(config.output, "out");
        assert_eq!(
            config.naming.strategy,
            NamingStrategy::UseOperationIdOrRoute
        );
        assert_eq!(config.naming.aliases["getPetById"], "fetchPet");
        assert_eq!(config.concurrency, 2);
        assert!(!config.emit.index);
        assert!(!config.emit.jsdoc);
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: OavgConfig = serde_yaml_ng::from_str("input: api.yaml\n").unwrap();
        assert_eq!(config.input, "api.yaml");
        assert_eq!(config.output, "src/generated");
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
    }

    #[test]
    fn test_default_content_parses() {
        let config: OavgConfig = serde_yaml_ng::from_str(default_config_content()).unwrap();
        assert_eq!(config.concurrency, 8);
    }

    #[test]
    fn test_missing_file_is_none() {
        let result = load_config(Path::new("/definitely/not/here/.oavg.yaml")).unwrap();
        assert!(result.is_none());
    }
}
