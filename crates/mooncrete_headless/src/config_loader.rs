//! Game configuration loading.
//!
//! Tuning lives in RON files. Every field is optional, so a file only has
//! to name the values it overrides. Loaded configurations are validated
//! before they reach the simulation. [`config_to_ron`] writes the other
//! way, for dumping the effective tuning.

use std::fs;
use std::path::{Path, PathBuf};

use mooncrete_core::config::GameConfig;
use mooncrete_core::error::GameError;
use thiserror::Error;

/// Errors from loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    /// The file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file did not parse or broke an invariant.
    #[error("Invalid config {path}: {source}")]
    Invalid {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: GameError,
    },

    /// The configuration could not be written as RON.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
}

/// Load and validate a configuration file.
pub fn load_config(path: &Path) -> Result<GameConfig, ConfigLoadError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let config =
        GameConfig::from_ron_str(&content).map_err(|source| ConfigLoadError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::info!(path = %path.display(), seed = config.seed, "Loaded config");
    Ok(config)
}

/// Load a configuration file if one was given, else the defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<GameConfig, ConfigLoadError> {
    match path {
        Some(path) => load_config(path),
        None => {
            tracing::debug!("No config file, using defaults");
            Ok(GameConfig::default())
        }
    }
}

/// Render a configuration as pretty RON, e.g. as a starting point for a
/// tuning file.
pub fn config_to_ron(config: &GameConfig) -> Result<String, ConfigLoadError> {
    let pretty = ron::ser::PrettyConfig::new().struct_names(true);
    Ok(ron::ser::to_string_pretty(config, pretty)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = write_temp("GameConfig(seed: 99, puzzle: PuzzleConfig(width: 12))");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.seed, 99);
        assert_eq!(config.puzzle.width, 12);
        assert_eq!(config.puzzle.height, 10);
        assert_eq!(config.arcade, GameConfig::default().arcade);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("absent.ron")).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Io { .. }));
    }

    #[test]
    fn test_parse_error() {
        let file = write_temp("GameConfig(seed: \"not a number\")");
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(
            err,
            ConfigLoadError::Invalid {
                source: GameError::ConfigParse(_),
                ..
            }
        ));
    }

    #[test]
    fn test_validation_error() {
        let file = write_temp("GameConfig(moonscape: MoonscapeConfig(ruggedness: 2.0))");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("moonscape.ruggedness"));
    }

    #[test]
    fn test_dumped_config_loads_back() {
        let config = GameConfig::default().with_seed(7);
        let file = write_temp(&config_to_ron(&config).unwrap());
        assert_eq!(load_config(file.path()).unwrap(), config);
    }

    #[test]
    fn test_no_path_gives_defaults() {
        assert_eq!(load_or_default(None).unwrap(), GameConfig::default());
    }
}
